//! Straitwatch Runtime
//!
//! Wires catalog, text sources, classifier and the decay engine into the
//! once-a-day batch run: load state, gather corpus, classify, advance,
//! publish exactly one artifact.

pub mod pipeline;

pub use pipeline::*;
