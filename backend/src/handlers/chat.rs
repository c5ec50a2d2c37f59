//! HTTP handler that runs the assistant without WhatsApp
//!
//! Replies are captured instead of sent, so the full dispatch path
//! (including the apology on failure) can be exercised over plain HTTP.

use async_trait::async_trait;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use shared::Intent;
use std::path::Path;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};
use crate::external::MessageTransport;
use crate::services::chatbot::InboundText;
use crate::services::intent;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Shown in logs in place of a WhatsApp profile name
    pub sender_name: Option<String>,
}

/// One outbound message, in delivery order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SentPart {
    Text { body: String },
    Image { path: String, caption: Option<String> },
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub intent: Intent,
    pub parts: Vec<SentPart>,
}

/// Transport that records what would have been sent
#[derive(Debug, Default)]
pub struct CapturingTransport {
    sent: Mutex<Vec<SentPart>>,
}

impl CapturingTransport {
    pub fn into_parts(self) -> Vec<SentPart> {
        self.sent.into_inner()
    }
}

#[async_trait]
impl MessageTransport for CapturingTransport {
    async fn send_text(&self, _to: &str, text: &str) -> AppResult<()> {
        self.sent.lock().await.push(SentPart::Text {
            body: text.to_string(),
        });
        Ok(())
    }

    async fn send_image(&self, _to: &str, image_path: &Path, caption: Option<&str>) -> AppResult<()> {
        self.sent.lock().await.push(SentPart::Image {
            path: image_path.to_string_lossy().into_owned(),
            caption: caption.map(String::from),
        });
        Ok(())
    }
}

/// Ask the assistant a question
/// POST /chat
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let body = request.message.trim();
    if body.is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }

    let message = InboundText {
        from: "api".to_string(),
        sender_name: request.sender_name.unwrap_or_else(|| "api".to_string()),
        body: body.to_string(),
    };

    let transport = CapturingTransport::default();
    state.chatbot.handle_message(&message, &transport).await;

    Ok(Json(ChatResponse {
        intent: intent::classify(body),
        parts: transport.into_parts(),
    }))
}
