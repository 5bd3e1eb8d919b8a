use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::db::DocumentStore;
use crate::error::Result;
use crate::nlp::Analyzer;
use crate::server::{self, AppState};

pub async fn handle_serve(bind: Option<SocketAddr>) -> Result<()> {
    let mut config = Config::from_env()?;
    if let Some(addr) = bind {
        config.bind_addr = addr;
    }

    let store = DocumentStore::open(&config.database_path)?;
    tracing::info!(path = %config.database_path.display(), "database ready");

    // Model loading happens once, before we accept any traffic; an NER
    // failure here aborts startup.
    let analyzer = Analyzer::from_config(&config).await?;

    let state = AppState {
        analyzer: Arc::new(analyzer),
        store: Arc::new(Mutex::new(store)),
    };
    server::serve(state, config.bind_addr).await
}

pub async fn handle_init_db() -> Result<()> {
    let config = Config::from_env()?;
    DocumentStore::open(&config.database_path)?;
    println!("Initialized database at {}", config.database_path.display());
    Ok(())
}
