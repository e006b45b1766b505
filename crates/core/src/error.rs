//! Fatal configuration and load errors.
//!
//! Normal play never produces these: rejected moves are `false`, rejected
//! booster targets fizzle. They only come out of session setup and restore.

use thiserror::Error;

/// Rejected at `Game::new` / `Game::reset`, before a session starts
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid board dimensions {width}x{height} (visible {visible_height})")]
    InvalidDimensions {
        width: usize,
        height: usize,
        visible_height: usize,
    },
    #[error("unknown piece '{0}' in bag pool")]
    UnknownPiece(char),
    #[error("bag pool is empty")]
    EmptyPool,
    #[error("invalid layout row {row}: {reason}")]
    InvalidLayout { row: usize, reason: String },
    #[error("invalid objective: {0}")]
    InvalidObjective(String),
}

/// Rejected while restoring a saved or replayed session.
///
/// The caller should start a fresh session instead of continuing.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("inconsistent board dimensions: {width}x{height} with {cells} cells")]
    InconsistentDimensions {
        width: usize,
        height: usize,
        cells: usize,
    },
    #[error("cell {index} state disagrees with its occupant")]
    InvalidCell { index: usize },
    #[error("invalid rng state {0}")]
    InvalidSeed(u32),
    #[error("active piece at ({x}, {y}) overlaps the board")]
    InvalidPiece { x: i32, y: i32 },
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
