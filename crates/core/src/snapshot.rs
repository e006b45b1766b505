//! Serializable session snapshots.
//!
//! A [`GameSnapshot`] holds everything needed to resume a session exactly,
//! including the RNG state. `Game::snapshot` produces one and `Game::restore`
//! validates it before rebuilding.

use serde::{Deserialize, Serialize};

use crate::advice::AdviceSlot;
use crate::booster::BoosterSet;
use crate::config::RulesConfig;
use crate::error::LoadError;
use crate::objective::ObjectiveState;
use crate::pieces::Tetromino;
use crate::scoring::{ScoreKeeper, Stats};
use crate::types::{Cell, GameMode, Gravity, PieceKind, SessionOutcome};

/// Lifecycle of the piece currently in play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PiecePhase {
    Spawning,
    Active,
    /// Resting on something; the lock timer is running
    Grounded,
    Locked,
    GameOver,
}

/// Per-piece and effect timers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimersSnapshot {
    pub drop_ms: u32,
    pub lock_ms: u32,
    pub lock_resets: u32,
    /// Boss speed surge (drop time halved)
    pub surge_ms: u32,
    /// Slow block (drop time doubled)
    pub slow_ms: u32,
    /// Freeze block (gravity suspended)
    pub freeze_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub config: RulesConfig,
    pub mode: GameMode,
    pub rng_state: u32,
    pub width: usize,
    pub height: usize,
    pub cells: Vec<Cell>,
    pub pending_garbage: u32,
    pub queue: Vec<PieceKind>,
    pub active: Option<Tetromino>,
    pub hold: Option<PieceKind>,
    pub can_hold: bool,
    pub phase: PiecePhase,
    pub gravity: Gravity,
    pub stats: Stats,
    pub scorer: ScoreKeeper,
    pub objective: ObjectiveState,
    pub boosters: BoosterSet,
    pub timers: TimersSnapshot,
    pub last_move_was_rotation: bool,
    pub paused: bool,
    pub outcome: Option<SessionOutcome>,
    pub wildcard_armed: bool,
    pub advice: AdviceSlot,
}

impl GameSnapshot {
    pub fn playable(&self) -> bool {
        self.outcome.is_none() && !self.paused
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }
}
