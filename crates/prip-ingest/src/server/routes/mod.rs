//! API routes for the ingest server

pub mod documents;
pub mod messages;

use axum::{extract::DefaultBodyLimit, routing::{get, post}, Router};
use serde::{Deserialize, Serialize};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/messages", post(messages::post_message))
        // Uploads get the larger body limit
        .route(
            "/documents",
            post(documents::upload_document).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/documents/link", post(documents::ingest_link))
        .route("/info", get(info))
}

/// Chat sender id, numeric or textual
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SenderId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for SenderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SenderId::Number(n) => write!(f, "{}", n),
            SenderId::Text(s) => f.write_str(s.trim()),
        }
    }
}

/// Reply for the sender; absent when the input is ignored
#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    pub reply: Option<String>,
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "prip-ingest",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Extracts waypoint notices from text and documents into a shared collection",
        "endpoints": {
            "POST /api/messages": "Submit a text message or command ({from_id, text})",
            "POST /api/documents": "Upload a DOCX/RTF/DOC/TXT document (multipart: from_id, file)",
            "POST /api/documents/link": "Ingest a document by URL ({from_id, filename, url})",
        },
        "formats": ["docx", "rtf", "doc", "txt"]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_id_forms() {
        let id: SenderId = serde_json::from_str("123456").unwrap();
        assert_eq!(id.to_string(), "123456");
        let id: SenderId = serde_json::from_str("\" 123456 \"").unwrap();
        assert_eq!(id.to_string(), "123456");
    }
}
