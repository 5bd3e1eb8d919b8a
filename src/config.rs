use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{AnalyzerError, Result};

/// Default NER model served by the inference server.
pub const DEFAULT_NER_MODEL: &str = "dslim/bert-base-NER";
/// Default zero-shot classification model.
pub const DEFAULT_ZERO_SHOT_MODEL: &str = "facebook/bart-large-mnli";
/// Default base URL of the model inference server.
pub const DEFAULT_INFERENCE_URL: &str = "http://localhost:8090";
/// Default SQLite database path.
pub const DEFAULT_DATABASE_PATH: &str = "legal_analyzer.db";
/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Process configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// NER model identifier. Required for serving; loading it is fatal on failure.
    pub ner_model: String,
    /// Zero-shot classification model identifier. `None` disables the model
    /// path and classification falls back to the keyword heuristic.
    pub zero_shot_model: Option<String>,
    /// Base URL of the inference server hosting both models.
    pub inference_url: String,
    /// SQLite database file path.
    pub database_path: PathBuf,
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// `NER_MODEL` falls back to a documented default when unset, but an
    /// explicitly empty value is a configuration error: the operator asked
    /// for no NER model and the service cannot run without one.
    pub fn from_env() -> Result<Self> {
        let ner_model = match env::var("NER_MODEL") {
            Ok(value) => value,
            Err(_) => DEFAULT_NER_MODEL.to_string(),
        };
        if ner_model.trim().is_empty() {
            return Err(AnalyzerError::Config(
                "NER_MODEL is set but empty; the service cannot run without an NER model".to_string(),
            ));
        }

        // An empty ZERO_SHOT_MODEL disables model-based classification.
        let zero_shot_model = match env::var("ZERO_SHOT_MODEL") {
            Ok(value) if value.trim().is_empty() => None,
            Ok(value) => Some(value),
            Err(_) => Some(DEFAULT_ZERO_SHOT_MODEL.to_string()),
        };

        let inference_url =
            env::var("INFERENCE_URL").unwrap_or_else(|_| DEFAULT_INFERENCE_URL.to_string());
        let database_path = PathBuf::from(
            env::var("DATABASE_PATH").unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string()),
        );
        let bind_addr = parse_bind_addr(
            &env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
        )?;

        Ok(Self {
            ner_model,
            zero_shot_model,
            inference_url,
            database_path,
            bind_addr,
        })
    }
}

fn parse_bind_addr(raw: &str) -> Result<SocketAddr> {
    raw.parse()
        .map_err(|_| AnalyzerError::Config(format!("invalid bind address '{}'", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind_addr_valid() {
        let addr = parse_bind_addr("127.0.0.1:8080").unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_parse_bind_addr_invalid() {
        let err = parse_bind_addr("not-an-address").unwrap_err();
        assert!(err.to_string().contains("invalid bind address"));
    }

    #[test]
    fn test_default_bind_addr_parses() {
        parse_bind_addr(DEFAULT_BIND_ADDR).unwrap();
    }
}
