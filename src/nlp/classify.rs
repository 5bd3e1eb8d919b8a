//! Document classification: zero-shot via a pretrained model when one is
//! configured and candidate labels were supplied, keyword heuristic otherwise.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AnalyzerError, Result};

/// Contract types the keyword heuristic can assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractType {
    #[serde(rename = "Lease Agreement")]
    Lease,
    #[serde(rename = "Purchase Agreement")]
    Purchase,
    #[serde(rename = "General Contract")]
    General,
}

impl ContractType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Lease => "Lease Agreement",
            ContractType::Purchase => "Purchase Agreement",
            ContractType::General => "General Contract",
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword heuristic over lower-cased text. The lease check runs before the
/// purchase check, so text containing both classifies as a lease.
pub fn heuristic_contract_type(text: &str) -> ContractType {
    let lowered = text.to_lowercase();
    if lowered.contains("lease") || lowered.contains("tenant") {
        ContractType::Lease
    } else if lowered.contains("purchase") || lowered.contains("seller") {
        ContractType::Purchase
    } else {
        ContractType::General
    }
}

/// Labels produced by the heuristic path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeuristicLabels {
    pub contract_type: ContractType,
}

/// Outcome of classifying one document.
///
/// Serializes to the wire shapes consumers expect: `{"raw": ...}` for model
/// output (passed through verbatim), `{"raw": null, "error": "classification
/// failed"}` when the model call failed, and `{"heuristic": {"contract_type":
/// ...}}` for the fallback.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Classification {
    Model {
        raw: Value,
    },
    Failed {
        raw: Option<Value>,
        error: String,
    },
    Heuristic {
        heuristic: HeuristicLabels,
    },
}

impl Classification {
    /// The model call failed; recoverable, the request still succeeds.
    pub fn failed() -> Self {
        Classification::Failed {
            raw: None,
            error: "classification failed".to_string(),
        }
    }

    /// Classify by keyword heuristic.
    pub fn heuristic_for(text: &str) -> Self {
        Classification::Heuristic {
            heuristic: HeuristicLabels {
                contract_type: heuristic_contract_type(text),
            },
        }
    }

    /// The document type to persist, set only when the heuristic fired.
    pub fn doc_type(&self) -> Option<&'static str> {
        match self {
            Classification::Heuristic { heuristic } => Some(heuristic.contract_type.as_str()),
            _ => None,
        }
    }
}

/// Trait for pluggable zero-shot classification backends.
///
/// Model output is returned verbatim as JSON; this service does no score
/// post-processing.
#[async_trait]
pub trait ZeroShotModel: Send + Sync {
    /// Identifier of the underlying model (e.g. "facebook/bart-large-mnli").
    fn model_id(&self) -> &str;

    /// Classify text against caller-supplied candidate labels.
    async fn classify(&self, text: &str, candidate_labels: &[String]) -> Result<Value>;
}

#[derive(Serialize)]
struct ZeroShotRequest<'a> {
    model: &'a str,
    text: &'a str,
    candidate_labels: &'a [String],
}

/// Zero-shot backend speaking the inference server's JSON API.
pub struct InferenceClassifier {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl InferenceClassifier {
    /// Connect to the inference server and verify the model is loadable.
    ///
    /// Unlike the NER probe, a failure here is not fatal: the caller logs it
    /// and degrades to heuristic classification for the process lifetime.
    pub async fn connect(base_url: &str, model: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let client = reqwest::Client::new();

        let probe = format!("{}/models/{}", base_url, model);
        let response = client
            .get(&probe)
            .send()
            .await
            .map_err(|e| AnalyzerError::Inference(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AnalyzerError::Inference(format!(
                "zero-shot model '{}' unavailable: inference server returned {}",
                model,
                response.status()
            )));
        }

        Ok(Self {
            base_url,
            model: model.to_string(),
            client,
        })
    }
}

#[async_trait]
impl ZeroShotModel for InferenceClassifier {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn classify(&self, text: &str, candidate_labels: &[String]) -> Result<Value> {
        let url = format!("{}/zero-shot", self.base_url);
        let request = ZeroShotRequest {
            model: &self.model,
            text,
            candidate_labels,
        };

        let response = self.client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(AnalyzerError::Inference(format!(
                "zero-shot request failed: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}
