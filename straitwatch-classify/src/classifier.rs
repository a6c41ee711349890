//! Trigger classifier - the boundary between news text and the engine
//!
//! One classification call per category. The LLM sees the category's
//! indicator subset and the assembled corpus, and must answer with a JSON
//! object `{"triggered_ids": [...], "reasoning": "..."}`. Every failure
//! mode (network, refusal, malformed JSON, fenced JSON) degrades to an
//! empty trigger set with the failure spelled out in the reasoning, so
//! the decay engine still runs on classification-free days.

use std::collections::BTreeSet;

use serde::Deserialize;
use tracing::{info, warn};

use straitwatch_core::{Category, Indicator};

use crate::{LlmError, SharedBackend};

const CLASSIFIER_SYSTEM_PROMPT: &str = r#"
You are a rigorous, objective intelligence analyst. Your task is to decide, based ONLY on the supplied intelligence digest, whether any indicator in the watch list is EXPLICITLY triggered.

Rules:
1. Strict matching: an indicator counts as triggered only when the digest explicitly evidences the event it describes.
2. Routine vs anomalous: distinguish routine activity (scheduled drills, boilerplate statements) from anomalous activity (unscheduled, large-scale, ultimatums). Indicators refer to the anomalous kind.
3. Official statements carry high weight: hard-line language such as "severe consequences" or "countermeasures" in official briefings triggers the matching rhetoric indicators.

Output format:
Return a single plain JSON object, no markdown fences, shaped exactly as:
{ "triggered_ids": ["ID1", "ID2"], "reasoning": "one or two sentences summarising the finding" }
"#;

/// Parsed classifier verdict for one category
#[derive(Debug, Clone, Deserialize)]
struct ClassifierVerdict {
    triggered_ids: Vec<String>,
    reasoning: String,
}

/// What a category contributed to the run: triggers plus explanation.
/// The reasoning is always populated, including on failure.
#[derive(Debug, Clone)]
pub struct CategoryAnalysis {
    pub triggered_ids: BTreeSet<String>,
    pub reasoning: String,
}

impl CategoryAnalysis {
    fn empty(reasoning: impl Into<String>) -> Self {
        Self {
            triggered_ids: BTreeSet::new(),
            reasoning: reasoning.into(),
        }
    }
}

/// LLM-backed indicator classifier
pub struct TriggerClassifier {
    backend: SharedBackend,
}

impl TriggerClassifier {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Classify one category's corpus against its indicator subset.
    ///
    /// Never returns an error: failures become an empty trigger set with
    /// an explanatory reasoning string. An empty candidate list
    /// short-circuits without calling the backend at all.
    pub async fn classify(
        &self,
        category: Category,
        corpus: &str,
        candidates: &[&Indicator],
    ) -> CategoryAnalysis {
        if candidates.is_empty() {
            return CategoryAnalysis::empty("No indicators defined for this category.");
        }

        let user_prompt = build_user_prompt(category, corpus, candidates);

        let reply = match self.backend.generate(CLASSIFIER_SYSTEM_PROMPT, &user_prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("classification failed for {}: {}", category, e);
                return CategoryAnalysis::empty(format!("Classification call failed: {e}"));
            }
        };

        match parse_verdict(&reply) {
            Ok(verdict) => {
                info!(
                    "category {} triggered {} indicator(s)",
                    category,
                    verdict.triggered_ids.len()
                );
                CategoryAnalysis {
                    triggered_ids: verdict.triggered_ids.into_iter().collect(),
                    reasoning: verdict.reasoning,
                }
            }
            Err(e) => {
                warn!("malformed classifier reply for {}: {}", category, e);
                CategoryAnalysis::empty(format!("Malformed classifier response: {e}"))
            }
        }
    }
}

fn build_user_prompt(category: Category, corpus: &str, candidates: &[&Indicator]) -> String {
    let watch_list = serde_json::to_string_pretty(candidates).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Analyse the following intelligence.\n\n\
         [Watch list ({})]\n{}\n\n\
         [Intelligence digest]\n\"{}\"\n\n\
         Return your JSON verdict.",
        category.label(),
        watch_list,
        corpus
    )
}

/// Parse the verdict, tolerating markdown code fences around the JSON
fn parse_verdict(reply: &str) -> Result<ClassifierVerdict, LlmError> {
    let stripped = strip_code_fence(reply.trim());
    serde_json::from_str(stripped).map_err(|e| LlmError::Api(e.to_string()))
}

fn strip_code_fence(text: &str) -> &str {
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct CannedBackend(&'static str);

    #[async_trait]
    impl crate::LlmBackend for CannedBackend {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl crate::LlmBackend for FailingBackend {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            Err(LlmError::Api("connection timed out".to_string()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    struct PanickingBackend;

    #[async_trait]
    impl crate::LlmBackend for PanickingBackend {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            panic!("backend must not be called for an empty candidate list");
        }

        fn model_name(&self) -> &str {
            "panicking"
        }
    }

    fn indicator(id: &str) -> Indicator {
        Indicator {
            id: id.to_string(),
            category: Category::Military,
            weight: 10.0,
            description: Some("Unscheduled live-fire exercise".to_string()),
        }
    }

    #[tokio::test]
    async fn test_clean_json_verdict() {
        let classifier = canned(r#"{"triggered_ids": ["MIL-1"], "reasoning": "Drill announced."}"#);
        let ind = indicator("MIL-1");
        let analysis = classifier
            .classify(Category::Military, "PLA announces drill", &[&ind])
            .await;

        assert!(analysis.triggered_ids.contains("MIL-1"));
        assert_eq!(analysis.reasoning, "Drill announced.");
    }

    #[tokio::test]
    async fn test_fenced_json_verdict() {
        let classifier =
            canned("```json\n{\"triggered_ids\": [], \"reasoning\": \"Nothing today.\"}\n```");
        let ind = indicator("MIL-1");
        let analysis = classifier.classify(Category::Military, "quiet", &[&ind]).await;

        assert!(analysis.triggered_ids.is_empty());
        assert_eq!(analysis.reasoning, "Nothing today.");
    }

    #[tokio::test]
    async fn test_malformed_reply_degrades() {
        let classifier = canned("I'm sorry, I can't help with that.");
        let ind = indicator("MIL-1");
        let analysis = classifier.classify(Category::Military, "text", &[&ind]).await;

        assert!(analysis.triggered_ids.is_empty());
        assert!(analysis.reasoning.contains("Malformed classifier response"));
    }

    #[tokio::test]
    async fn test_backend_failure_degrades() {
        let classifier = TriggerClassifier::new(Arc::new(FailingBackend));
        let ind = indicator("MIL-1");
        let analysis = classifier.classify(Category::Military, "text", &[&ind]).await;

        assert!(analysis.triggered_ids.is_empty());
        assert!(analysis.reasoning.contains("connection timed out"));
    }

    #[tokio::test]
    async fn test_empty_candidates_short_circuit() {
        let classifier = TriggerClassifier::new(Arc::new(PanickingBackend));
        let analysis = classifier.classify(Category::Economic, "text", &[]).await;

        assert!(analysis.triggered_ids.is_empty());
        assert!(analysis.reasoning.contains("No indicators defined"));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("{}"), "{}");
    }

    fn canned(reply: &'static str) -> TriggerClassifier {
        TriggerClassifier::new(Arc::new(CannedBackend(reply)))
    }
}
