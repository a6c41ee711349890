//! Local-sentiment provider
//!
//! There is no automated feed for on-the-ground sentiment; the note is
//! supplied at configuration time (or defaults to the standing baseline)
//! and handed to the classifier like any other corpus.

use straitwatch_core::Category;

use crate::{SourceError, SourceReport, TextSource};

const DEFAULT_NOTE: &str = "Local residents report: this week's air-raid siren test was the \
scheduled annual drill. Supermarket stocks are normal with no panic buying. Daily life and \
traffic are orderly.";

/// Static local-sentiment note for the local category
pub struct LocalPulseSource {
    note: String,
}

impl LocalPulseSource {
    pub fn new(note: &str) -> Self {
        Self {
            note: note.to_string(),
        }
    }
}

impl Default for LocalPulseSource {
    fn default() -> Self {
        Self::new(DEFAULT_NOTE)
    }
}

#[async_trait::async_trait]
impl TextSource for LocalPulseSource {
    fn name(&self) -> &str {
        "Local pulse"
    }

    fn covers(&self, category: Category) -> bool {
        category == Category::LocalSentiment
    }

    async fn fetch(&self, category: Category) -> Result<SourceReport, SourceError> {
        if !self.covers(category) {
            return Ok(SourceReport::default());
        }
        Ok(SourceReport {
            text: self.note.clone(),
            articles: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_pulse_only_covers_local() {
        let source = LocalPulseSource::default();
        assert!(source.covers(Category::LocalSentiment));
        assert!(!source.covers(Category::Military));

        let report = source.fetch(Category::LocalSentiment).await.unwrap();
        assert!(report.text.contains("annual drill"));
        assert!(report.articles.is_empty());

        let off_topic = source.fetch(Category::Military).await.unwrap();
        assert!(off_topic.is_empty());
    }
}
