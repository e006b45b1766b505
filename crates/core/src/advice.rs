//! Advice messages exchanged with an out-of-process move advisor.
//!
//! Each request carries the turn id it was built on. A response is only
//! accepted while the game is still on that turn.

use serde::{Deserialize, Serialize};

use crate::types::{Gravity, PieceKind, Rotation};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceRequest {
    pub turn_id: u64,
    pub width: usize,
    pub height: usize,
    /// Row-major code grid (0 empty, 1-7 pieces, 8 garbage)
    pub board: Vec<Vec<u8>>,
    pub piece: PieceKind,
    pub hold: Option<PieceKind>,
    pub next: Vec<PieceKind>,
    pub gravity: Gravity,
}

/// `bestMove` answer: where to put the current piece
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveSuggestion {
    pub rotation: Rotation,
    pub x: i32,
    pub y: i32,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceResponse {
    pub turn_id: u64,
    pub suggestion: Option<MoveSuggestion>,
}

/// Current turn id and the suggestion accepted for it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdviceSlot {
    turn_id: u64,
    current: Option<MoveSuggestion>,
}

impl AdviceSlot {
    pub fn turn_id(&self) -> u64 {
        self.turn_id
    }

    pub fn current(&self) -> Option<MoveSuggestion> {
        self.current
    }

    /// Board or piece changed: older responses are now stale
    pub fn advance(&mut self) {
        self.turn_id = self.turn_id.wrapping_add(1);
        self.current = None;
    }

    pub fn accept(&mut self, response: &AdviceResponse) -> bool {
        if response.turn_id != self.turn_id {
            log::warn!(
                "discarding stale advice for turn {} (current {})",
                response.turn_id,
                self.turn_id
            );
            return false;
        }
        self.current = response.suggestion;
        true
    }
}
