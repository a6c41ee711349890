//! Common trait for text-corpus providers

use async_trait::async_trait;
use thiserror::Error;

use straitwatch_core::{Article, Category};

/// Errors from source fetching
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("failed to parse feed: {0}")]
    Feed(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// What one provider contributed for one category
#[derive(Debug, Clone, Default)]
pub struct SourceReport {
    /// Concatenated text handed to the classifier
    pub text: String,
    /// Articles backing the text, kept in the artifact
    pub articles: Vec<Article>,
}

impl SourceReport {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A provider of category-scoped news text
#[async_trait]
pub trait TextSource: Send + Sync {
    /// Provider name used in corpus section headers and logs
    fn name(&self) -> &str;

    /// Whether this provider has anything to say about a category
    fn covers(&self, category: Category) -> bool;

    /// Fetch the corpus contribution for one category
    async fn fetch(&self, category: Category) -> Result<SourceReport, SourceError>;
}
