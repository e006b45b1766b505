//! Booster module - pre-session consumables
//!
//! Every booster walks a one-way lifecycle:
//!
//! ```text
//! Armed ──begin_selection──▶ Selecting ──confirm──▶ Consumed
//!   ▲                           │
//!   └──────────cancel───────────┘
//! Armed ──activate──▶ Active ──expire──▶ Consumed
//! ```
//!
//! The set only tracks lifecycles. What a booster does to the board or the
//! clock is applied by the game when these transitions report success.

use serde::{Deserialize, Serialize};

use crate::types::{FLIP_GRAVITY_MS, SLOW_TIME_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoosterKind {
    /// Clear a target row and its neighbours
    BombRows,
    /// Clear a target row
    LineClear,
    /// Double the drop interval for a while
    SlowTime,
    /// Invert gravity for a while
    FlipGravity,
    /// Hold any number of times per piece for the rest of the session
    InfiniteHold,
}

impl BoosterKind {
    /// Needs a target row before it does anything
    pub fn is_selection(&self) -> bool {
        matches!(self, BoosterKind::BombRows | BoosterKind::LineClear)
    }

    /// `None` for selection boosters and for session-long ones
    pub fn duration_ms(&self) -> Option<u32> {
        match self {
            BoosterKind::SlowTime => Some(SLOW_TIME_MS),
            BoosterKind::FlipGravity => Some(FLIP_GRAVITY_MS),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoosterPhase {
    Armed,
    Selecting,
    /// Running; `None` lasts until the session ends
    Active { remaining_ms: Option<u32> },
    Consumed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booster {
    pub kind: BoosterKind,
    pub phase: BoosterPhase,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoosterSet {
    boosters: Vec<Booster>,
}

impl BoosterSet {
    pub fn new(kinds: &[BoosterKind]) -> Self {
        Self {
            boosters: kinds
                .iter()
                .map(|&kind| Booster {
                    kind,
                    phase: BoosterPhase::Armed,
                })
                .collect(),
        }
    }

    pub fn boosters(&self) -> &[Booster] {
        &self.boosters
    }

    fn find_armed(&mut self, kind: BoosterKind) -> Option<&mut Booster> {
        self.boosters
            .iter_mut()
            .find(|b| b.kind == kind && b.phase == BoosterPhase::Armed)
    }

    pub fn armed_count(&self, kind: BoosterKind) -> usize {
        self.boosters
            .iter()
            .filter(|b| b.kind == kind && b.phase == BoosterPhase::Armed)
            .count()
    }

    /// Booster currently waiting for a target, if any
    pub fn selecting(&self) -> Option<BoosterKind> {
        self.boosters
            .iter()
            .find(|b| b.phase == BoosterPhase::Selecting)
            .map(|b| b.kind)
    }

    pub fn is_active(&self, kind: BoosterKind) -> bool {
        self.boosters
            .iter()
            .any(|b| b.kind == kind && matches!(b.phase, BoosterPhase::Active { .. }))
    }

    /// Enter selection mode. Fails if another selection is open or none is armed.
    pub fn begin_selection(&mut self, kind: BoosterKind) -> bool {
        if !kind.is_selection() || self.selecting().is_some() {
            return false;
        }
        match self.find_armed(kind) {
            Some(booster) => {
                booster.phase = BoosterPhase::Selecting;
                true
            }
            None => false,
        }
    }

    /// Leave selection mode without using the booster
    pub fn cancel_selection(&mut self) -> Option<BoosterKind> {
        let booster = self
            .boosters
            .iter_mut()
            .find(|b| b.phase == BoosterPhase::Selecting)?;
        booster.phase = BoosterPhase::Armed;
        Some(booster.kind)
    }

    /// Consume the booster being selected
    pub fn confirm_selection(&mut self) -> Option<BoosterKind> {
        let booster = self
            .boosters
            .iter_mut()
            .find(|b| b.phase == BoosterPhase::Selecting)?;
        booster.phase = BoosterPhase::Consumed;
        Some(booster.kind)
    }

    /// Start a non-selection booster. Only one of each kind runs at a time.
    pub fn activate(&mut self, kind: BoosterKind) -> bool {
        if kind.is_selection() || self.is_active(kind) {
            return false;
        }
        match self.find_armed(kind) {
            Some(booster) => {
                booster.phase = BoosterPhase::Active {
                    remaining_ms: kind.duration_ms(),
                };
                true
            }
            None => false,
        }
    }

    /// Count down running boosters. Returns the kinds that expired on this tick.
    pub fn tick(&mut self, elapsed_ms: u32) -> Vec<BoosterKind> {
        let mut expired = Vec::new();
        for booster in &mut self.boosters {
            if let BoosterPhase::Active {
                remaining_ms: Some(remaining),
            } = booster.phase
            {
                let left = remaining.saturating_sub(elapsed_ms);
                booster.phase = if left == 0 {
                    expired.push(booster.kind);
                    BoosterPhase::Consumed
                } else {
                    BoosterPhase::Active {
                        remaining_ms: Some(left),
                    }
                };
            }
        }
        expired
    }
}
