//! Straitwatch Sources
//!
//! Text-corpus providers behind a common trait:
//! - **NewsApiSource**: international and business press via NewsAPI
//! - **OfficialFeedSource**: official PRC outlets via Google News RSS
//! - **LocalPulseSource**: static local-sentiment note
//!
//! Each provider returns a text blob for the classifier plus the article
//! list kept in the run artifact for provenance. Provider failures are
//! the caller's to degrade; nothing here retries forever.

pub mod client;
pub mod local;
pub mod newsapi;
pub mod official;
pub mod traits;

pub use client::*;
pub use local::*;
pub use newsapi::*;
pub use official::*;
pub use traits::*;
