//! Straitwatch Classify
//!
//! The classifier boundary: an LLM decides, per category, which catalog
//! indicators today's corpus has triggered. Backends are pluggable
//! (`LlmBackend`); the default deployment uses DeepSeek's OpenAI-compatible
//! API, with Gemini as the alternative. Classification failures never
//! abort a run - they degrade to an empty trigger set with an explanatory
//! reasoning string.

pub mod backend;
pub mod classifier;

pub use backend::*;
pub use classifier::*;
