//! The daily run pipeline
//!
//! One invocation performs a single sequential batch:
//! 1. load the catalog (fatal on error, nothing written)
//! 2. load the prior artifact's active state (missing file = empty state)
//! 3. per category: assemble the corpus from every covering source and
//!    classify it
//! 4. union the triggered ids and advance the decay engine
//! 5. aggregate the score and write the new artifact (fatal on failure)
//!
//! Concurrent invocations against the same state file are prevented by
//! the scheduler, not here.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use straitwatch_classify::TriggerClassifier;
use straitwatch_core::{
    advance, aggregate_score, ActiveState, Article, Catalog, Category, DecayConfig, RunArtifact,
};
use straitwatch_sources::TextSource;

/// Corpus text used when no source produced anything for a category
const EMPTY_CORPUS: &str = "No relevant reporting retrieved.";

/// File locations and engine parameters for one run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Indicator catalog JSON (read-only input)
    pub catalog_path: PathBuf,
    /// Run artifact; read at start, rewritten at the end
    pub artifact_path: PathBuf,
    /// Decay parameters handed to the engine
    pub decay: DecayConfig,
}

/// What the sources contributed for one category
struct CategoryCorpus {
    text: String,
    articles: Vec<Article>,
}

/// The assembled run pipeline
pub struct Pipeline {
    config: PipelineConfig,
    classifier: TriggerClassifier,
    sources: Vec<Box<dyn TextSource>>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, classifier: TriggerClassifier) -> Self {
        Self {
            config,
            classifier,
            sources: Vec::new(),
        }
    }

    /// Register a text source; order determines corpus section order
    pub fn with_source(mut self, source: Box<dyn TextSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Execute one full run and return the published artifact
    pub async fn run(&self) -> Result<RunArtifact> {
        let catalog = Catalog::load(&self.config.catalog_path).with_context(|| {
            format!(
                "unreadable indicator catalog {}",
                self.config.catalog_path.display()
            )
        })?;
        info!(
            "catalog loaded: {} indicators, total weight {:.1}",
            catalog.len(),
            catalog.total_weight()
        );

        let previous = RunArtifact::load_prior_state(&self.config.artifact_path);
        if previous.is_empty() {
            info!("no prior state, starting from empty");
        } else {
            info!("carrying forward {} active indicator(s)", previous.len());
        }

        let today = Utc::now().date_naive();
        let artifact = self.evaluate(&catalog, previous, today).await;

        artifact.write(&self.config.artifact_path).with_context(|| {
            format!(
                "failed to publish run artifact {}",
                self.config.artifact_path.display()
            )
        })?;
        info!(
            "run complete: score {}, {} active indicator(s)",
            artifact.score, artifact.active_indicators_count
        );

        Ok(artifact)
    }

    /// Classify all categories and fold the result into the next state.
    /// Split from `run` so tests can drive it without touching disk.
    pub async fn evaluate(
        &self,
        catalog: &Catalog,
        previous: ActiveState,
        today: NaiveDate,
    ) -> RunArtifact {
        let mut triggered_today = BTreeSet::new();
        let mut category_reasoning = BTreeMap::new();
        let mut news_sources = BTreeMap::new();

        for category in Category::ALL {
            let corpus = self.collect_corpus(category).await;
            let candidates = catalog.in_category(category);

            let analysis = self
                .classifier
                .classify(category, &corpus.text, &candidates)
                .await;

            debug!(
                "category {}: {} triggered, reasoning: {}",
                category,
                analysis.triggered_ids.len(),
                analysis.reasoning
            );

            triggered_today.extend(analysis.triggered_ids);
            category_reasoning.insert(category.key().to_string(), analysis.reasoning);
            news_sources.insert(category.key().to_string(), corpus.articles);
        }

        let outcome = advance(catalog, &previous, &triggered_today, today, &self.config.decay);

        if !outcome.stale_dropped.is_empty() {
            warn!(
                "dropped state for ids no longer in the catalog: {:?}",
                outcome.stale_dropped
            );
        }
        if !outcome.unknown_discarded.is_empty() {
            warn!(
                "classifier returned unknown indicator ids: {:?}",
                outcome.unknown_discarded
            );
        }
        if !outcome.evicted.is_empty() {
            info!("evicted below weight floor: {:?}", outcome.evicted);
        }

        let score = aggregate_score(catalog, &outcome.next);

        RunArtifact {
            score,
            total_indicators_possible: catalog.len(),
            active_indicators_count: outcome.next.len(),
            active_indicators: outcome.next,
            category_reasoning,
            news_sources,
            last_updated: Utc::now(),
        }
    }

    /// Concatenate every covering source's contribution for a category
    async fn collect_corpus(&self, category: Category) -> CategoryCorpus {
        let mut text = String::new();
        let mut articles = Vec::new();

        for source in &self.sources {
            if !source.covers(category) {
                continue;
            }
            match source.fetch(category).await {
                Ok(report) if report.is_empty() => {
                    debug!("{} had nothing for {}", source.name(), category);
                }
                Ok(report) => {
                    text.push_str(&format!("=== {} ===\n{}\n", source.name(), report.text));
                    articles.extend(report.articles);
                }
                Err(e) => {
                    warn!("{} failed for {}: {}", source.name(), category, e);
                }
            }
        }

        if text.trim().is_empty() {
            text = EMPTY_CORPUS.to_string();
        }

        CategoryCorpus { text, articles }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;

    use straitwatch_classify::{LlmBackend, LlmError};
    use straitwatch_core::{ActiveIndicatorState, Indicator};
    use straitwatch_sources::{SourceError, SourceReport};

    /// Backend that triggers fixed ids for the military category and
    /// fails outright for the political one
    struct ScriptedBackend;

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        async fn generate(&self, _system: &str, user: &str) -> Result<String, LlmError> {
            if user.contains("military") {
                Ok(r#"{"triggered_ids": ["MIL-1", "GHOST-1"], "reasoning": "Carrier group underway."}"#.to_string())
            } else if user.contains("political") {
                Err(LlmError::Api("request timed out".to_string()))
            } else {
                Ok(r#"{"triggered_ids": [], "reasoning": "Nothing notable."}"#.to_string())
            }
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    struct StaticSource;

    #[async_trait]
    impl TextSource for StaticSource {
        fn name(&self) -> &str {
            "Static wire"
        }

        fn covers(&self, _category: Category) -> bool {
            true
        }

        async fn fetch(&self, _category: Category) -> Result<SourceReport, SourceError> {
            Ok(SourceReport {
                text: "- Carrier group transits the strait\n".to_string(),
                articles: vec![Article {
                    title: "Carrier group transits the strait".to_string(),
                    source: "Static wire".to_string(),
                    date: "2025-06-01".to_string(),
                    url: "https://example.com".to_string(),
                }],
            })
        }
    }

    fn catalog() -> Catalog {
        Catalog::from_records(vec![
            Indicator {
                id: "MIL-1".to_string(),
                category: Category::Military,
                weight: 20.0,
                description: None,
            },
            Indicator {
                id: "POL-1".to_string(),
                category: Category::Political,
                weight: 10.0,
                description: None,
            },
            Indicator {
                id: "ECON-1".to_string(),
                category: Category::Economic,
                weight: 10.0,
                description: None,
            },
        ])
        .unwrap()
    }

    fn pipeline() -> Pipeline {
        let config = PipelineConfig {
            catalog_path: PathBuf::from("unused.json"),
            artifact_path: PathBuf::from("unused-scores.json"),
            decay: DecayConfig::default(),
        };
        let classifier = TriggerClassifier::new(Arc::new(ScriptedBackend));
        Pipeline::new(config, classifier).with_source(Box::new(StaticSource))
    }

    #[tokio::test]
    async fn test_end_to_end_evaluation() {
        let catalog = catalog();
        let today: NaiveDate = "2025-06-02".parse().unwrap();

        // POL-1 was active yesterday and its category's classifier call
        // fails today, so it must decay rather than refresh
        let mut previous = ActiveState::new();
        previous.insert(
            "POL-1".to_string(),
            ActiveIndicatorState::triggered(10.0, "2025-06-01".parse().unwrap()),
        );

        let artifact = pipeline().evaluate(&catalog, previous, today).await;

        // MIL-1 refreshed at full weight, GHOST-1 discarded
        let mil = &artifact.active_indicators["MIL-1"];
        assert_eq!(mil.current_weight, 20.0);
        assert_eq!(mil.triggered_on, today);
        assert!(!artifact.active_indicators.contains_key("GHOST-1"));

        // POL-1 decayed despite its classifier failing
        let pol = &artifact.active_indicators["POL-1"];
        assert!((pol.current_weight - 7.5).abs() < 1e-9);

        // score = round(100 * 27.5 / 40) = 69
        assert_eq!(artifact.score, 69);
        assert_eq!(artifact.total_indicators_possible, 3);
        assert_eq!(artifact.active_indicators_count, 2);

        // failed category keeps an explanatory reasoning string
        let pol_reason = &artifact.category_reasoning["pol"];
        assert!(pol_reason.contains("failed"), "got: {pol_reason}");

        // provenance recorded per category key
        assert!(artifact.news_sources.contains_key("mil"));
        assert_eq!(artifact.news_sources["mil"].len(), 1);
    }

    #[tokio::test]
    async fn test_run_is_fatal_without_catalog() {
        let result = pipeline().run().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_sourceless_category_still_classified() {
        // no sources at all: every category falls back to the empty-corpus
        // text, and the engine still decays prior state
        let config = PipelineConfig {
            catalog_path: PathBuf::from("unused.json"),
            artifact_path: PathBuf::from("unused-scores.json"),
            decay: DecayConfig::default(),
        };
        let classifier = TriggerClassifier::new(Arc::new(ScriptedBackend));
        let pipeline = Pipeline::new(config, classifier);

        let catalog = catalog();
        let mut previous = ActiveState::new();
        previous.insert(
            "ECON-1".to_string(),
            ActiveIndicatorState::triggered(10.0, "2025-06-01".parse().unwrap()),
        );

        let artifact = pipeline
            .evaluate(&catalog, previous, "2025-06-02".parse().unwrap())
            .await;

        let econ = &artifact.active_indicators["ECON-1"];
        assert!((econ.current_weight - 7.5).abs() < 1e-9);
    }
}
