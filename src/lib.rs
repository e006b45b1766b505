//! Blockfall (workspace facade crate).
//!
//! Re-exports the member crates under one name so drivers and tests can write
//! `blockfall::{core, engine, advisor, types}` while the implementation lives
//! in dedicated crates under `crates/`.

pub use blockfall_advisor as advisor;
pub use blockfall_core as core;
pub use blockfall_engine as engine;
pub use blockfall_types as types;
