//! The persisted run artifact - database and published report in one
//!
//! The artifact written at the end of a run is the sole input state to
//! the next run. Dashboard consumers depend on the exact key names, and
//! on `active_indicators` being present even when empty.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ActiveState;

/// Errors from artifact persistence
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse artifact JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One article referenced in the corpus, kept for provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    /// Provider-qualified source, e.g. "NewsAPI / Reuters"
    pub source: String,
    /// Publication date as reported by the provider (best effort)
    pub date: String,
    pub url: String,
}

/// The complete persisted result of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunArtifact {
    pub score: u32,

    /// Catalog cardinality at run time
    pub total_indicators_possible: usize,

    pub active_indicators_count: usize,

    /// Always serialized, `{}` when nothing is active
    pub active_indicators: ActiveState,

    /// Per-category classifier reasoning, keyed by the short category key
    pub category_reasoning: BTreeMap<String, String>,

    /// Per-category article provenance, keyed by the short category key
    pub news_sources: BTreeMap<String, Vec<Article>>,

    pub last_updated: DateTime<Utc>,
}

impl RunArtifact {
    /// Read a prior artifact from disk
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Active state from a prior run, or empty when the file is missing
    /// or unreadable (a fresh deployment starts from nothing)
    pub fn load_prior_state(path: &Path) -> ActiveState {
        match Self::load(path) {
            Ok(artifact) => artifact.active_indicators,
            Err(_) => ActiveState::new(),
        }
    }

    /// Write the artifact; failure here is fatal for the run
    pub fn write(&self, path: &Path) -> Result<(), ArtifactError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
