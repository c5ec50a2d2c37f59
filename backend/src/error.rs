//! Error handling for the AgroBot assistant
//!
//! Provides consistent error responses in Portuguese and English

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("No data found: {0}")]
    NoDataFound(String),

    // Upstream errors
    #[error("Upstream resource not found: {0}")]
    UpstreamNotFound(String),

    #[error("Upstream rejected credentials: {0}")]
    UpstreamUnauthorized(String),

    #[error("Upstream rate limit exceeded: {0}")]
    UpstreamRateLimited(String),

    #[error("Upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("Message transport error: {0}")]
    Transport(String),

    // Request errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AppError {
    /// Classify a non-success upstream HTTP status
    pub fn from_status(status: reqwest::StatusCode, context: impl Into<String>) -> Self {
        let context = context.into();
        match status.as_u16() {
            404 => AppError::UpstreamNotFound(context),
            401 | 403 => AppError::UpstreamUnauthorized(context),
            429 => AppError::UpstreamRateLimited(context),
            _ => AppError::UpstreamUnreachable(format!("{} ({})", context, status)),
        }
    }

    /// Classify a reqwest failure; transport problems and timeouts are
    /// reported as unreachable.
    pub fn from_reqwest(err: reqwest::Error, context: &str) -> Self {
        match err.status() {
            Some(status) => AppError::from_status(status, context),
            None => AppError::UpstreamUnreachable(format!("{}: {}", context, err)),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_pt: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::NoDataFound(what) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NO_DATA_FOUND".to_string(),
                    message_en: format!("No data found for {}", what),
                    message_pt: format!("Nenhum dado encontrado para {}", what),
                },
            ),
            AppError::UpstreamNotFound(what) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", what),
                    message_pt: format!("{} não encontrado", what),
                },
            ),
            AppError::UpstreamUnauthorized(service) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "UPSTREAM_UNAUTHORIZED".to_string(),
                    message_en: format!("{} rejected the configured API key", service),
                    message_pt: format!("{} recusou a chave de API configurada", service),
                },
            ),
            AppError::UpstreamRateLimited(service) => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorDetail {
                    code: "UPSTREAM_RATE_LIMITED".to_string(),
                    message_en: format!("{} rate limit exceeded, try again later", service),
                    message_pt: format!(
                        "Limite de requisições de {} excedido. Tente novamente mais tarde.",
                        service
                    ),
                },
            ),
            AppError::UpstreamUnreachable(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "UPSTREAM_UNREACHABLE".to_string(),
                    message_en: format!("External service error: {}", msg),
                    message_pt: format!("Erro no serviço externo: {}", msg),
                },
            ),
            AppError::Transport(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "TRANSPORT_ERROR".to_string(),
                    message_en: format!("Message delivery failed: {}", msg),
                    message_pt: format!("Falha ao enviar mensagem: {}", msg),
                },
            ),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_pt: format!("Dados inválidos: {}", msg),
                },
            ),
            AppError::Configuration(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "CONFIGURATION_ERROR".to_string(),
                    message_en: format!("Configuration error: {}", msg),
                    message_pt: format!("Erro de configuração: {}", msg),
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers and services
pub type AppResult<T> = Result<T, AppError>;
