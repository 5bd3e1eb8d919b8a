use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::{Document, StoredEntity, RECENT_DOCUMENTS_LIMIT};
use crate::error::AnalyzerError;
use crate::nlp::classify::Classification;
use crate::nlp::clauses::ClauseRecord;

use super::{ApiError, AppState, APP_NAME};

/// Request bodies larger than this are rejected while buffering.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Default, Deserialize)]
struct AnalyzeBody {
    text: Option<String>,
    raw_text: Option<String>,
    /// Comma-separated candidate labels for zero-shot classification.
    candidate_labels: Option<String>,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub document: Document,
    pub entities: Vec<StoredEntity>,
    pub clauses: Vec<ClauseRecord>,
    pub classification: Classification,
}

#[derive(Serialize)]
pub struct DocumentResponse {
    pub document: Document,
    pub entities: Vec<StoredEntity>,
    pub raw_text: String,
}

pub async fn ping() -> Json<Value> {
    Json(json!({ "status": "ok", "app": APP_NAME }))
}

/// POST /analyze: run the pipeline over submitted text and persist the result.
///
/// Accepts either a JSON body (`text` or `raw_text`) or a multipart upload
/// with a `file` field; `candidate_labels` may accompany either form. Input
/// is validated before any pipeline work, so a rejected request persists
/// nothing.
pub async fn analyze(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let (text, candidate_labels) = read_analyze_input(request).await?;

    let text = match text {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(ApiError::bad_request("No text provided")),
    };

    let result = state
        .analyzer
        .analyze(&text, candidate_labels.as_deref())
        .await?;

    // Persist the document and its entities as one atomic write, built from
    // the normalized text so entity offsets stay valid against what's stored.
    let doc_type = result.classification.doc_type();
    let mut store = state.store.lock().await;
    let (document, entities) = store.insert_analysis(&result.text, doc_type, &result.entities)?;

    Ok(Json(AnalyzeResponse {
        document,
        entities,
        clauses: result.clauses,
        classification: result.classification,
    }))
}

/// GET /documents: up to 50 most recently created documents, newest first.
pub async fn list_documents(
    State(state): State<AppState>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let store = state.store.lock().await;
    Ok(Json(store.list_recent(RECENT_DOCUMENTS_LIMIT)?))
}

/// GET /documents/{id}: one document with its entities and raw text.
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let store = state.store.lock().await;
    let Some((document, entities)) = store.get_document(id)? else {
        return Err(AnalyzerError::DocumentNotFound(id).into());
    };

    let raw_text = document.raw_text.clone();
    Ok(Json(DocumentResponse {
        document,
        entities,
        raw_text,
    }))
}

/// Pull text and candidate labels out of either request form.
///
/// JSON bodies are parsed leniently: malformed or missing JSON reads as an
/// empty body, which the caller then rejects for lack of text. Uploaded file
/// bytes are decoded as lossy UTF-8.
async fn read_analyze_input(
    request: Request,
) -> Result<(Option<String>, Option<Vec<String>>), ApiError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    if is_multipart {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|_| ApiError::bad_request("Invalid multipart body"))?;

        let mut text = None;
        let mut labels = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| ApiError::bad_request("Invalid multipart body"))?
        {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("file") => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|_| ApiError::bad_request("Invalid multipart body"))?;
                    text = Some(String::from_utf8_lossy(&bytes).into_owned());
                }
                Some("candidate_labels") => {
                    let value = field
                        .text()
                        .await
                        .map_err(|_| ApiError::bad_request("Invalid multipart body"))?;
                    labels = parse_labels(&value);
                }
                _ => {}
            }
        }
        Ok((text, labels))
    } else {
        let bytes = Bytes::from_request(request, &())
            .await
            .map_err(|_| ApiError::bad_request("Unreadable request body"))?;
        if bytes.len() > MAX_BODY_BYTES {
            return Err(ApiError::bad_request("Request body too large"));
        }
        let body: AnalyzeBody = serde_json::from_slice(&bytes).unwrap_or_default();
        let labels = body.candidate_labels.as_deref().and_then(parse_labels);
        Ok((body.text.or(body.raw_text), labels))
    }
}

/// Split comma-separated labels, trimming entries and dropping empties. An
/// all-empty result counts as no labels supplied.
fn parse_labels(raw: &str) -> Option<Vec<String>> {
    let labels: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if labels.is_empty() {
        None
    } else {
        Some(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels_trims_and_drops_empties() {
        assert_eq!(
            parse_labels(" lease , purchase ,, "),
            Some(vec!["lease".to_string(), "purchase".to_string()])
        );
    }

    #[test]
    fn test_parse_labels_all_empty_is_none() {
        assert_eq!(parse_labels(" , ,"), None);
        assert_eq!(parse_labels(""), None);
    }
}
