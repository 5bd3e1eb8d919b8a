use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Failed to load NER model '{model}': {reason}. Set NER_MODEL to a model available on the inference server and restart.")]
    ModelLoad { model: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(i64),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
