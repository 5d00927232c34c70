//! Text message endpoint

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::Result;
use crate::pipeline::{is_help_command, InboundEvent};
use crate::server::routes::{ReplyResponse, SenderId};
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub from_id: SenderId,
    pub text: String,
}

/// POST /api/messages - Free text, `/add`, `/start` or `/help`
pub async fn post_message(
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<ReplyResponse>> {
    // Usage help is open to everyone
    if !is_help_command(&request.text) {
        state.authorize(&request.from_id.to_string())?;
    }

    let reply = state
        .pipeline()
        .handle(InboundEvent::message(request.text))
        .await;

    Ok(Json(ReplyResponse { reply }))
}
