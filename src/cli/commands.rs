use std::net::SocketAddr;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "nlp-legal-analyzer")]
#[command(version, about = "HTTP service for NLP analysis of legal documents")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP analysis service
    Serve {
        /// Bind address (overrides BIND_ADDR)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Create the database file and schema without serving
    InitDb,
}
