use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::error::{AnalyzerError, Result};
use crate::nlp::ner::EntitySpan;

/// Maximum number of documents returned by the recent-documents listing.
pub const RECENT_DOCUMENTS_LIMIT: usize = 50;

/// Title length cap; longer raw text is truncated with an ellipsis.
const TITLE_CHARS: usize = 60;

/// One persisted document. `raw_text` is stored but omitted from document
/// summaries on the wire; the detail endpoint returns it as a separate field.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing)]
    pub raw_text: String,
    pub doc_type: Option<String>,
    /// Reserved: defined in the schema, never written by current producers.
    pub classification_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// One persisted entity span. The back-reference to the document is
/// navigational only and not serialized.
#[derive(Debug, Clone, Serialize)]
pub struct StoredEntity {
    pub id: i64,
    #[serde(skip_serializing)]
    pub document_id: i64,
    pub label: String,
    pub text: String,
    pub start_char: usize,
    pub end_char: usize,
}

/// SQLite store for documents and their extracted entities.
pub struct DocumentStore {
    conn: Connection,
}

impl DocumentStore {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory database (tests).
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // SQLite does not enforce foreign keys unless asked.
        conn.pragma_update(None, "foreign_keys", true)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                raw_text TEXT NOT NULL,
                doc_type TEXT,
                classification_score REAL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS entities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                document_id INTEGER NOT NULL
                    REFERENCES documents(id) ON DELETE CASCADE,
                label TEXT NOT NULL,
                text TEXT NOT NULL,
                start_char INTEGER NOT NULL,
                end_char INTEGER NOT NULL,
                CHECK (start_char >= 0 AND end_char > start_char)
            );

            CREATE INDEX IF NOT EXISTS idx_entities_document
                ON entities(document_id);
            ",
        )?;
        Ok(())
    }

    /// Persist one analyzed document together with its entities.
    ///
    /// The document row is written first to obtain its id, the entity rows
    /// follow inside the same transaction, and everything commits once. Any
    /// failure before the commit rolls the whole write back, so no partial
    /// document/entity rows become visible.
    pub fn insert_analysis(
        &mut self,
        raw_text: &str,
        doc_type: Option<&str>,
        spans: &[EntitySpan],
    ) -> Result<(Document, Vec<StoredEntity>)> {
        let title = derive_title(raw_text);
        let created_at = Utc::now();

        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO documents (title, raw_text, doc_type, classification_score, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![title, raw_text, doc_type, Option::<f64>::None, created_at],
        )?;
        let document_id = tx.last_insert_rowid();

        let mut entities = Vec::with_capacity(spans.len());
        {
            let mut statement = tx.prepare(
                "INSERT INTO entities (document_id, label, text, start_char, end_char)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for span in spans {
                statement.execute(params![
                    document_id,
                    span.label,
                    span.text,
                    span.start_char as i64,
                    span.end_char as i64,
                ])?;
                entities.push(StoredEntity {
                    id: tx.last_insert_rowid(),
                    document_id,
                    label: span.label.clone(),
                    text: span.text.clone(),
                    start_char: span.start_char,
                    end_char: span.end_char,
                });
            }
        }

        tx.commit()?;

        let document = Document {
            id: document_id,
            title,
            raw_text: raw_text.to_string(),
            doc_type: doc_type.map(str::to_string),
            classification_score: None,
            created_at,
        };
        Ok((document, entities))
    }

    /// Fetch one document and its entities, or `None` if the id is unknown.
    pub fn get_document(&self, id: i64) -> Result<Option<(Document, Vec<StoredEntity>)>> {
        let document = self
            .conn
            .query_row(
                "SELECT id, title, raw_text, doc_type, classification_score, created_at
                 FROM documents WHERE id = ?1",
                [id],
                row_to_document,
            )
            .optional()?;

        let Some(document) = document else {
            return Ok(None);
        };

        let mut statement = self.conn.prepare(
            "SELECT id, document_id, label, text, start_char, end_char
             FROM entities WHERE document_id = ?1 ORDER BY id",
        )?;
        let entities = statement
            .query_map([id], row_to_entity)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Some((document, entities)))
    }

    /// The most recently created documents, newest first.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<Document>> {
        let mut statement = self.conn.prepare(
            "SELECT id, title, raw_text, doc_type, classification_score, created_at
             FROM documents ORDER BY created_at DESC, id DESC LIMIT ?1",
        )?;
        let documents = statement
            .query_map([limit as i64], row_to_document)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(documents)
    }

    /// Delete a document; its entities go with it via cascade. Returns
    /// whether a row was deleted. No HTTP endpoint exposes this yet.
    pub fn delete_document(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM documents WHERE id = ?1", [id])?;
        Ok(deleted > 0)
    }

    #[cfg(test)]
    fn count_rows(&self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }
}

fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        id: row.get(0)?,
        title: row.get(1)?,
        raw_text: row.get(2)?,
        doc_type: row.get(3)?,
        classification_score: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn row_to_entity(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredEntity> {
    Ok(StoredEntity {
        id: row.get(0)?,
        document_id: row.get(1)?,
        label: row.get(2)?,
        text: row.get(3)?,
        start_char: row.get::<_, i64>(4)? as usize,
        end_char: row.get::<_, i64>(5)? as usize,
    })
}

/// Derive a document title: the first 60 characters of the text, with an
/// ellipsis when truncated.
fn derive_title(text: &str) -> String {
    let mut chars = text.chars();
    let title: String = chars.by_ref().take(TITLE_CHARS).collect();
    if chars.next().is_some() {
        format!("{title}...")
    } else {
        title
    }
}

impl From<rusqlite::Error> for AnalyzerError {
    fn from(e: rusqlite::Error) -> Self {
        AnalyzerError::Storage(format!("SQLite error: {}", e))
    }
}
