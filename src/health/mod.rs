use axum::{routing::get, Json, Router};

use crate::{error::MessageResponse, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/health-check", get(health_check))
}

pub fn ping_router() -> Router<AppState> {
    Router::new().route("/ping", get(ping))
}

pub async fn health_check() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Alive and well!".into(),
    })
}

pub async fn ping() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "pong".into(),
    })
}
