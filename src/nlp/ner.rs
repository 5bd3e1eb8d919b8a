//! Named-entity extraction backed by a pretrained model on the inference
//! server. The model is opaque to this service: we send normalized text and
//! get back labeled character spans.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyzerError, Result};

/// A labeled entity span. Offsets are character offsets into the analyzed
/// text, `0 <= start_char < end_char <= text.chars().count()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub label: String,
    pub text: String,
    pub start_char: usize,
    pub end_char: usize,
}

/// Trait for pluggable NER backends.
///
/// The production backend calls a pretrained token-classification model over
/// HTTP; tests substitute a stub. Spans are reported in the order the model
/// emits them (typically left-to-right) and are not re-sorted here.
#[async_trait]
pub trait NerModel: Send + Sync {
    /// Identifier of the underlying model (e.g. "dslim/bert-base-NER").
    fn model_id(&self) -> &str;

    /// Extract named entities from normalized text.
    async fn extract(&self, text: &str) -> Result<Vec<EntitySpan>>;
}

#[derive(Serialize)]
struct NerRequest<'a> {
    model: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct NerResponse {
    entities: Vec<EntitySpan>,
}

/// NER backend speaking the inference server's JSON API.
pub struct InferenceNer {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl InferenceNer {
    /// Connect to the inference server and verify the model is loadable.
    ///
    /// This runs once at startup; any failure here is fatal for the process,
    /// since the service must not accept analysis traffic without entity
    /// extraction.
    pub async fn connect(base_url: &str, model: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let client = reqwest::Client::new();

        let probe = format!("{}/models/{}", base_url, model);
        let response = client.get(&probe).send().await.map_err(|e| {
            AnalyzerError::ModelLoad {
                model: model.to_string(),
                reason: e.to_string(),
            }
        })?;
        if !response.status().is_success() {
            return Err(AnalyzerError::ModelLoad {
                model: model.to_string(),
                reason: format!("inference server returned {}", response.status()),
            });
        }

        Ok(Self {
            base_url,
            model: model.to_string(),
            client,
        })
    }
}

#[async_trait]
impl NerModel for InferenceNer {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn extract(&self, text: &str) -> Result<Vec<EntitySpan>> {
        let url = format!("{}/ner", self.base_url);
        let request = NerRequest {
            model: &self.model,
            text,
        };

        let response = self.client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(AnalyzerError::Inference(format!(
                "NER request failed: {}",
                response.status()
            )));
        }

        let parsed: NerResponse = response.json().await?;
        validate_spans(text, &parsed.entities)?;
        Ok(parsed.entities)
    }
}

/// Check that every span is a valid character range of `text` and that its
/// `text` field matches the characters it claims to cover.
pub fn validate_spans(text: &str, spans: &[EntitySpan]) -> Result<()> {
    let chars: Vec<char> = text.chars().collect();
    for span in spans {
        if span.start_char >= span.end_char || span.end_char > chars.len() {
            return Err(AnalyzerError::Inference(format!(
                "model returned invalid span {}..{} for text of {} chars",
                span.start_char,
                span.end_char,
                chars.len()
            )));
        }
        let covered: String = chars[span.start_char..span.end_char].iter().collect();
        if covered != span.text {
            return Err(AnalyzerError::Inference(format!(
                "model span text '{}' does not match document text '{}'",
                span.text, covered
            )));
        }
    }
    Ok(())
}

impl From<reqwest::Error> for AnalyzerError {
    fn from(e: reqwest::Error) -> Self {
        AnalyzerError::Inference(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(label: &str, text: &str, start: usize, end: usize) -> EntitySpan {
        EntitySpan {
            label: label.to_string(),
            text: text.to_string(),
            start_char: start,
            end_char: end,
        }
    }

    #[test]
    fn test_validate_spans_accepts_matching_offsets() {
        let text = "Alice signed the lease.";
        validate_spans(text, &[span("PERSON", "Alice", 0, 5)]).unwrap();
    }

    #[test]
    fn test_validate_spans_rejects_out_of_range() {
        let text = "short";
        let err = validate_spans(text, &[span("ORG", "short", 0, 99)]).unwrap_err();
        assert!(err.to_string().contains("invalid span"));
    }

    #[test]
    fn test_validate_spans_rejects_empty_range() {
        let text = "short";
        assert!(validate_spans(text, &[span("ORG", "", 2, 2)]).is_err());
    }

    #[test]
    fn test_validate_spans_rejects_mismatched_text() {
        let text = "Alice signed the lease.";
        let err = validate_spans(text, &[span("PERSON", "Bob", 0, 5)]).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_validate_spans_counts_characters_not_bytes() {
        // Multi-byte characters before the span shift byte offsets but not
        // character offsets.
        let text = "§1 Müller pays";
        validate_spans(text, &[span("PERSON", "Müller", 3, 9)]).unwrap();
    }
}
