//! Move advisor plumbing.
//!
//! The advisor answers "where should this piece go" off the game thread.
//! The game builds an [`AdviceRequest`] tagged with its turn id, the worker
//! runs a [`MoveOracle`] on it, and the game drops any answer whose turn id
//! is no longer current.
//!
//! - [`oracle`]: the `MoveOracle` trait and a weighted-feature heuristic
//! - [`protocol`]: line-delimited JSON framing for out-of-process advisors
//! - [`worker`]: tokio-backed worker with non-blocking submit/poll

pub mod oracle;
pub mod protocol;
pub mod worker;

pub use blockfall_core as core;
pub use blockfall_types as types;

pub use crate::core::advice::{AdviceRequest, AdviceResponse, MoveSuggestion};
pub use oracle::{HeuristicOracle, MoveOracle};
pub use protocol::{decode_line, encode_line, AdvisorMessage};
pub use worker::AdvisorWorker;
