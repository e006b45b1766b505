//! Rules core - pure, deterministic, and testable
//!
//! This crate contains all the game rules, state management and simulation
//! logic. It never touches a terminal, a socket or a clock, which makes it:
//!
//! - **Deterministic**: same seed and inputs give the same session
//! - **Testable**: every rule is exercised headlessly
//! - **Portable**: any driver (terminal, GUI, bot) can host it
//!
//! # Module Structure
//!
//! - [`board`]: cell grid, row sweeps, garbage and cell modifiers
//! - [`pieces`]: tetromino shapes and SRS kick tables
//! - [`collision`]: gravity-aware collision, rotation with kicks, T-spin test
//! - [`rng`]: seedable randomness and the 7-bag piece queue
//! - [`scoring`]: score tables, combos, back-to-back, frenzy and levels
//! - [`objective`]: session goals, constraints, bosses and board gimmicks
//! - [`booster`]: pre-session consumables and their lifecycle
//! - [`advice`]: turn-tagged messages for an external move advisor
//! - [`game_state`]: the [`Game`] state machine tying it all together
//! - [`snapshot`]: serializable save state
//!
//! # Example
//!
//! ```
//! use blockfall_core::{Game, RulesConfig};
//! use blockfall_core::types::GameAction;
//!
//! let mut game = Game::new(RulesConfig::default()).unwrap();
//! game.dispatch(GameAction::MoveRight);
//! game.dispatch(GameAction::RotateCw);
//! game.dispatch(GameAction::HardDrop);
//!
//! // Hard drop awards 2 points per cell
//! assert!(game.stats().score > 0);
//! ```
//!
//! # Timing
//!
//! The driver calls [`Game::tick`] with the elapsed time, usually once per
//! frame. Gravity is 1000ms per row at level 0 and speeds up with level; a
//! grounded piece locks after 500ms, with up to 15 move/rotate resets.

pub mod advice;
pub mod board;
pub mod booster;
pub mod collision;
pub mod config;
pub mod error;
pub mod game_state;
pub mod objective;
pub mod pieces;
pub mod rng;
pub mod scoring;
pub mod snapshot;

pub use blockfall_types as types;

// Re-export commonly used types for convenience
pub use advice::{AdviceRequest, AdviceResponse, MoveSuggestion};
pub use board::Board;
pub use booster::{BoosterKind, BoosterSet};
pub use collision::{collides, drop_distance, try_rotate};
pub use config::RulesConfig;
pub use error::{ConfigError, LoadError};
pub use game_state::Game;
pub use objective::{ObjectiveConfig, ObjectiveKind};
pub use pieces::{get_shape, Tetromino};
pub use rng::{RandomSource, SimpleRng};
pub use scoring::{calculate_drop_score, calculate_score, ScoreResult, Stats};
pub use snapshot::{GameSnapshot, PiecePhase};
