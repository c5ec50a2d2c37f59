//! HTTP handlers for the WhatsApp Cloud API webhook

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::services::chatbot::WhatsAppWebhookRequest;
use crate::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Verification handshake query (`hub.mode`, `hub.verify_token`, `hub.challenge`)
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Response for webhook processing
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
}

fn webhook_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(WebhookResponse {
            success: false,
            message: message.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// Webhook verification handshake
/// GET /webhook
pub async fn verify_whatsapp_webhook(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Response {
    if state.transport.is_none() {
        return webhook_error(StatusCode::SERVICE_UNAVAILABLE, "WhatsApp not configured");
    }

    let subscribed = query.mode.as_deref() == Some("subscribe");
    let token_matches =
        query.verify_token.as_deref() == Some(state.config.whatsapp.verify_token.as_str());

    if subscribed && token_matches {
        tracing::info!("WhatsApp webhook verified");
        (StatusCode::OK, query.challenge.unwrap_or_default()).into_response()
    } else {
        tracing::warn!("WhatsApp webhook verification rejected");
        StatusCode::FORBIDDEN.into_response()
    }
}

/// Receive WhatsApp notifications
/// POST /webhook
///
/// Acknowledges immediately; each text message is answered on its own task
/// so a slow upstream never delays the acknowledgement.
pub async fn handle_whatsapp_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(transport) = state.transport.clone() else {
        return webhook_error(StatusCode::SERVICE_UNAVAILABLE, "WhatsApp not configured");
    };

    if let Some(secret) = state.config.whatsapp.app_secret.as_deref() {
        if let Err(e) = verify_signature(&headers, &body, secret) {
            tracing::warn!("WhatsApp webhook signature verification failed: {}", e);
            return webhook_error(StatusCode::UNAUTHORIZED, "Invalid signature");
        }
    }

    let request: WhatsAppWebhookRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            // Still 200 so WhatsApp doesn't keep redelivering
            tracing::error!("Failed to parse WhatsApp webhook: {}", e);
            return (
                StatusCode::OK,
                Json(WebhookResponse {
                    success: false,
                    message: format!("Invalid request body: {}", e),
                }),
            )
                .into_response();
        }
    };

    let messages = state.chatbot.inbound_texts(&request);
    tracing::debug!("Webhook carried {} text message(s)", messages.len());

    for message in messages {
        let chatbot = state.chatbot.clone();
        let transport = transport.clone();
        tokio::spawn(async move {
            chatbot.handle_message(&message, transport.as_ref()).await;
        });
    }

    (
        StatusCode::OK,
        Json(WebhookResponse {
            success: true,
            message: "EVENT_RECEIVED".to_string(),
        }),
    )
        .into_response()
}

/// Check `X-Hub-Signature-256: sha256=<hex hmac of body>`
pub fn verify_signature(headers: &HeaderMap, body: &[u8], app_secret: &str) -> Result<(), String> {
    let header = headers
        .get("x-hub-signature-256")
        .and_then(|v| v.to_str().ok())
        .ok_or("Missing x-hub-signature-256 header")?;
    let signature = header
        .strip_prefix("sha256=")
        .ok_or("Signature without sha256= prefix")?;

    if !signature.eq_ignore_ascii_case(&sign_body(body, app_secret)?) {
        return Err("Signature mismatch".to_string());
    }

    Ok(())
}

/// Lowercase hex HMAC-SHA256 of a request body
pub fn sign_body(body: &[u8], app_secret: &str) -> Result<String, String> {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC")?;
    mac.update(body);
    Ok(mac
        .finalize()
        .into_bytes()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect())
}
