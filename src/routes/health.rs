use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let session = state.bot.session();
    let snapshot = session.snapshot().await;
    Json(json!({
        "status": "ok",
        "service": "alias-party-bot",
        "version": env!("CARGO_PKG_VERSION"),
        "room": session.room().await,
        "phase": format!("{:?}", snapshot.phase),
        "teams": snapshot.scores.len(),
        "game": {
            "scores": snapshot.scores,
            "turn_order": snapshot.turn_order,
            "turn_index": snapshot.turn_index,
            "words_left": snapshot.words_left,
            "active_player": snapshot.active_player,
            "round_score": snapshot.round_score,
            "round_guesses": snapshot.round_guesses,
        },
    }))
}
