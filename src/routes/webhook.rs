use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{telegram::Update, AppState};

/// Telegram webhook. The bot token in the path proves the caller is Telegram.
pub async fn receive_update(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(update): Json<Update>,
) -> StatusCode {
    if token != state.config.bot.token {
        tracing::warn!("Rejected webhook call with wrong token");
        return StatusCode::FORBIDDEN;
    }

    let update_id = update.update_id;
    if let Some(event) = update.into_event() {
        if let Err(e) = state.bot.handle(event).await {
            tracing::error!("Failed to handle update {}: {:#}", update_id, e);
        }
    }

    // Telegram retries anything but 200, so handler failures are swallowed
    StatusCode::OK
}
