pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod nlp;
pub mod server;

pub use db::DocumentStore;
pub use error::{AnalyzerError, Result};
pub use nlp::Analyzer;
pub use server::{router, AppState, APP_NAME};
