//! Relational persistence for analysis results.

mod store;

pub use store::{DocumentStore, Document, StoredEntity, RECENT_DOCUMENTS_LIMIT};
