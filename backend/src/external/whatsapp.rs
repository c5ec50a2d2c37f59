//! WhatsApp Cloud API messaging client

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::{HttpConfig, WhatsAppConfig};
use crate::error::{AppError, AppResult};

/// Outbound channel for replies
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send_text(&self, to: &str, text: &str) -> AppResult<()>;

    async fn send_image(&self, to: &str, image_path: &Path, caption: Option<&str>) -> AppResult<()>;
}

/// WhatsApp Cloud API client
#[derive(Clone)]
pub struct WhatsAppClient {
    http_client: reqwest::Client,
    api_base_url: String,
    phone_number_id: String,
    access_token: String,
}

/// Outgoing message request
#[derive(Debug, Serialize)]
struct OutgoingMessage<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    message_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<TextBody<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<ImageBody<'a>>,
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct ImageBody<'a> {
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct MediaUploadResponse {
    id: String,
}

impl<'a> OutgoingMessage<'a> {
    fn text(to: &'a str, body: &'a str) -> Self {
        Self {
            messaging_product: "whatsapp",
            to,
            message_type: "text",
            text: Some(TextBody { body }),
            image: None,
        }
    }

    fn image(to: &'a str, media_id: &'a str, caption: Option<&'a str>) -> Self {
        Self {
            messaging_product: "whatsapp",
            to,
            message_type: "image",
            text: None,
            image: Some(ImageBody {
                id: media_id,
                caption,
            }),
        }
    }
}

impl WhatsAppClient {
    /// Create a new WhatsApp client
    pub fn new(config: &WhatsAppConfig, http: &HttpConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(http.timeout())
            .build()
            .map_err(|e| AppError::Configuration(format!("WhatsApp HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            phone_number_id: config.phone_number_id.trim().to_string(),
            access_token: config.sanitized_token(),
        })
    }

    async fn post_message(&self, message: &OutgoingMessage<'_>) -> AppResult<()> {
        let response = self
            .http_client
            .post(format!("{}/{}/messages", self.api_base_url, self.phone_number_id))
            .bearer_auth(&self.access_token)
            .json(message)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Failed to send WhatsApp message: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(AppError::Transport(format!("WhatsApp API {}: {}", status, body)))
        }
    }

    /// Upload a PNG and return its media id
    async fn upload_media(&self, image_path: &Path) -> AppResult<String> {
        let bytes = tokio::fs::read(image_path)
            .await
            .map_err(|e| AppError::Transport(format!("Failed to read {}: {}", image_path.display(), e)))?;

        let part = Part::bytes(bytes)
            .file_name("previsao.png")
            .mime_str("image/png")
            .map_err(|e| AppError::Transport(e.to_string()))?;
        let form = Form::new()
            .text("messaging_product", "whatsapp")
            .text("type", "image/png")
            .part("file", part);

        let response = self
            .http_client
            .post(format!("{}/{}/media", self.api_base_url, self.phone_number_id))
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Failed to upload media: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Transport(format!("WhatsApp media upload {}: {}", status, body)));
        }

        let uploaded: MediaUploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Transport(format!("Invalid media upload response: {}", e)))?;

        Ok(uploaded.id)
    }
}

#[async_trait]
impl MessageTransport for WhatsAppClient {
    async fn send_text(&self, to: &str, text: &str) -> AppResult<()> {
        self.post_message(&OutgoingMessage::text(to, text)).await?;
        tracing::debug!("Text message sent to {}", to);
        Ok(())
    }

    async fn send_image(&self, to: &str, image_path: &Path, caption: Option<&str>) -> AppResult<()> {
        let media_id = self.upload_media(image_path).await?;
        self.post_message(&OutgoingMessage::image(to, &media_id, caption))
            .await?;
        tracing::debug!("Image {} sent to {}", image_path.display(), to);
        Ok(())
    }
}
