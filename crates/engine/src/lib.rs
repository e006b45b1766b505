//! Placement helper for bots and advisors.
//!
//! Turns a target `(x, rotation)` into the action sequence a player would
//! press, so automated play goes through exactly the same rules as a human.

pub mod place;

pub use blockfall_core as core;
pub use blockfall_types as types;

pub use place::{apply_place, PlaceError};
