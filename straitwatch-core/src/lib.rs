//! Straitwatch Core - catalog, state machine and scoring
//!
//! This crate provides the foundational primitives:
//! - Indicator catalog with validated loading
//! - Active-indicator state with geometric decay and floor eviction
//! - The decay/refresh engine (a pure fold over yesterday's state)
//! - Score aggregation and the persisted run artifact
//!
//! Everything here is synchronous and I/O-free except artifact/catalog
//! file loading; network plumbing lives in the sibling crates.

pub mod artifact;
pub mod catalog;
pub mod score;
pub mod state;

pub use artifact::*;
pub use catalog::*;
pub use score::*;
pub use state::*;

/// Default daily decay multiplier for indicators not re-triggered
pub const DEFAULT_DECAY_FACTOR: f64 = 0.75;

/// Default weight floor below which an indicator is evicted
pub const DEFAULT_WEIGHT_FLOOR: f64 = 1.0;
