//! Health check handlers

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub bot_name: String,
    pub version: String,
    pub whatsapp_configured: bool,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        bot_name: state.config.bot.name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        whatsapp_configured: state.transport.is_some(),
    })
}
