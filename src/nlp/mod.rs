//! The document analysis pipeline: normalization, entity extraction, clause
//! detection, and classification, sequenced by [`Analyzer`].

pub mod classify;
pub mod clauses;
pub mod ner;
pub mod normalize;

use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use classify::{Classification, InferenceClassifier, ZeroShotModel};
use clauses::{detect_clauses, ClauseRecord};
use ner::{EntitySpan, InferenceNer, NerModel};
use normalize::normalize;

/// Composite result of analyzing one document.
#[derive(Debug, Serialize)]
pub struct AnalysisResult {
    /// The normalized text the analyses ran over.
    pub text: String,
    pub entities: Vec<EntitySpan>,
    pub clauses: Vec<ClauseRecord>,
    pub classification: Classification,
}

/// Orchestrates the analysis pipeline over injected model handles.
///
/// Models are loaded once at startup and shared read-only across requests;
/// the handles are explicit constructor arguments rather than ambient
/// globals so initialization failure stays visible and tests can substitute
/// stubs.
pub struct Analyzer {
    ner: Arc<dyn NerModel>,
    classifier: Option<Arc<dyn ZeroShotModel>>,
}

impl Analyzer {
    pub fn new(ner: Arc<dyn NerModel>, classifier: Option<Arc<dyn ZeroShotModel>>) -> Self {
        Self { ner, classifier }
    }

    /// Build the production analyzer from configuration.
    ///
    /// The NER model probe is fatal on failure. The zero-shot probe is not:
    /// classification degrades to the keyword heuristic for the rest of the
    /// process lifetime, with one warning here.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let ner = InferenceNer::connect(&config.inference_url, &config.ner_model).await?;
        tracing::info!(model = %config.ner_model, "NER model ready");

        let classifier = match &config.zero_shot_model {
            Some(model) => {
                match InferenceClassifier::connect(&config.inference_url, model).await {
                    Ok(classifier) => {
                        tracing::info!(model = %model, "zero-shot model ready");
                        Some(Arc::new(classifier) as Arc<dyn ZeroShotModel>)
                    }
                    Err(e) => {
                        tracing::warn!(
                            model = %model,
                            "zero-shot model unavailable, classification falls back to keyword heuristic: {e}"
                        );
                        None
                    }
                }
            }
            None => None,
        };

        Ok(Self::new(Arc::new(ner), classifier))
    }

    /// Run the full pipeline over raw text.
    ///
    /// Normalizes once, then extracts entities, detects clauses, and
    /// classifies; the three analyses have no data dependency on each other.
    /// Extraction errors propagate; classification errors are absorbed into
    /// the classification sub-result.
    pub async fn analyze(
        &self,
        raw_text: &str,
        candidate_labels: Option<&[String]>,
    ) -> Result<AnalysisResult> {
        let text = normalize(raw_text);

        let entities = self.ner.extract(&text).await?;
        let clauses = detect_clauses(&text);
        let classification = self.classify(&text, candidate_labels).await;

        Ok(AnalysisResult {
            text,
            entities,
            clauses,
            classification,
        })
    }

    async fn classify(&self, text: &str, candidate_labels: Option<&[String]>) -> Classification {
        if let (Some(classifier), Some(labels)) = (&self.classifier, candidate_labels) {
            if !labels.is_empty() {
                return match classifier.classify(text, labels).await {
                    Ok(raw) => Classification::Model { raw },
                    Err(e) => {
                        tracing::warn!(model = %classifier.model_id(), "classification failed: {e}");
                        Classification::failed()
                    }
                };
            }
        }
        Classification::heuristic_for(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyzerError;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct StubNer;

    #[async_trait]
    impl NerModel for StubNer {
        fn model_id(&self) -> &str {
            "stub-ner"
        }

        async fn extract(&self, text: &str) -> Result<Vec<EntitySpan>> {
            // Report the first word as an ORG span.
            let end = text.chars().position(|c| c == ' ').unwrap_or(text.chars().count());
            if end == 0 {
                return Ok(Vec::new());
            }
            Ok(vec![EntitySpan {
                label: "ORG".to_string(),
                text: text.chars().take(end).collect(),
                start_char: 0,
                end_char: end,
            }])
        }
    }

    struct StubClassifier {
        fail: bool,
    }

    #[async_trait]
    impl ZeroShotModel for StubClassifier {
        fn model_id(&self) -> &str {
            "stub-zero-shot"
        }

        async fn classify(&self, _text: &str, labels: &[String]) -> Result<Value> {
            if self.fail {
                return Err(AnalyzerError::Inference("boom".to_string()));
            }
            Ok(json!({"labels": labels, "scores": [0.9]}))
        }
    }

    fn labels(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_analyze_normalizes_before_analysis() {
        let analyzer = Analyzer::new(Arc::new(StubNer), None);
        let result = analyzer.analyze("  Acme shall pay.\r\n", None).await.unwrap();

        assert_eq!(result.text, "Acme shall pay.");
        assert_eq!(result.entities[0].text, "Acme");
        assert_eq!(result.clauses.len(), 1);
        assert_eq!(result.clauses[0].index, Some(0));
    }

    #[tokio::test]
    async fn test_no_classifier_uses_heuristic_even_with_labels() {
        let analyzer = Analyzer::new(Arc::new(StubNer), None);
        let result = analyzer
            .analyze("Tenant shall pay rent.", Some(&labels(&["lease", "sale"])))
            .await
            .unwrap();

        assert_eq!(
            result.classification,
            Classification::heuristic_for("tenant")
        );
    }

    #[tokio::test]
    async fn test_classifier_without_labels_uses_heuristic() {
        let analyzer = Analyzer::new(
            Arc::new(StubNer),
            Some(Arc::new(StubClassifier { fail: false })),
        );
        let result = analyzer.analyze("Seller delivers goods.", None).await.unwrap();

        assert_eq!(
            result.classification,
            Classification::heuristic_for("seller")
        );
    }

    #[tokio::test]
    async fn test_classifier_with_labels_returns_model_output() {
        let analyzer = Analyzer::new(
            Arc::new(StubNer),
            Some(Arc::new(StubClassifier { fail: false })),
        );
        let result = analyzer
            .analyze("Some contract.", Some(&labels(&["nda"])))
            .await
            .unwrap();

        match result.classification {
            Classification::Model { raw } => {
                assert_eq!(raw["labels"], json!(["nda"]));
            }
            other => panic!("expected model classification, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_classifier_failure_is_absorbed() {
        let analyzer = Analyzer::new(
            Arc::new(StubNer),
            Some(Arc::new(StubClassifier { fail: true })),
        );
        let result = analyzer
            .analyze("Some contract.", Some(&labels(&["nda"])))
            .await
            .unwrap();

        assert_eq!(result.classification, Classification::failed());
    }

    #[tokio::test]
    async fn test_empty_label_list_counts_as_no_labels() {
        let analyzer = Analyzer::new(
            Arc::new(StubNer),
            Some(Arc::new(StubClassifier { fail: false })),
        );
        let result = analyzer
            .analyze("Some contract.", Some(&labels(&[])))
            .await
            .unwrap();

        assert!(matches!(
            result.classification,
            Classification::Heuristic { .. }
        ));
    }
}
