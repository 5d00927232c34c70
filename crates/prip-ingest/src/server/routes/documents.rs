//! Document endpoints: direct upload and download-by-link

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::pipeline::InboundEvent;
use crate::server::routes::{ReplyResponse, SenderId};
use crate::server::state::AppState;

/// POST /api/documents - Multipart upload with `from_id` and `file` fields
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ReplyResponse>> {
    let mut sender: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::invalid_request(format!("Failed to read multipart field: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "from_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Error::invalid_request(format!("Failed to read from_id: {}", e)))?;
                sender = Some(text.trim().to_string());
            }
            "file" => {
                let filename = field.file_name().unwrap_or("document").to_string();
                let data = field.bytes().await.map_err(|e| {
                    Error::invalid_request(format!("Failed to read file '{}': {}", filename, e))
                })?;
                file = Some((filename, data.to_vec()));
            }
            other => {
                tracing::debug!("Ignoring multipart field '{}'", other);
            }
        }
    }

    let sender = sender.ok_or_else(|| Error::invalid_request("Missing from_id field"))?;
    state.authorize(&sender)?;

    let (filename, data) = file.ok_or_else(|| Error::invalid_request("Missing file field"))?;
    tracing::info!("Received document: {} ({} bytes)", filename, data.len());

    let reply = state
        .pipeline()
        .handle(InboundEvent::document(filename, data))
        .await;

    Ok(Json(ReplyResponse { reply }))
}

#[derive(Debug, Deserialize)]
pub struct LinkRequest {
    pub from_id: SenderId,
    pub filename: String,
    pub url: String,
}

/// POST /api/documents/link - Download a document, then ingest it
pub async fn ingest_link(
    State(state): State<AppState>,
    Json(request): Json<LinkRequest>,
) -> Result<Json<ReplyResponse>> {
    state.authorize(&request.from_id.to_string())?;

    let data = download(&state, &request.url).await?;
    tracing::info!(
        "Downloaded document: {} ({} bytes)",
        request.filename,
        data.len()
    );

    let reply = state
        .pipeline()
        .handle(InboundEvent::document(request.filename, data))
        .await;

    Ok(Json(ReplyResponse { reply }))
}

async fn download(state: &AppState, url: &str) -> Result<Vec<u8>> {
    let limit = state.config().server.max_upload_size;

    let response = state
        .http()
        .get(url)
        .send()
        .await
        .map_err(|e| Error::Download(e.to_string()))?;

    if !response.status().is_success() {
        return Err(Error::Download(format!("{} returned {}", url, response.status())));
    }

    if response.content_length().is_some_and(|len| len as usize > limit) {
        return Err(Error::Download(format!("{} exceeds {} bytes", url, limit)));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Download(e.to_string()))?;
    if bytes.len() > limit {
        return Err(Error::Download(format!("{} exceeds {} bytes", url, limit)));
    }

    Ok(bytes.to_vec())
}
