//! HTTP surface tests
//!
//! Tests for:
//! - Health and root endpoints
//! - WhatsApp webhook handshake and signature checks
//! - Stored map image lookup
//! - Chat endpoint validation and greeting flow
//!
//! No upstream is contacted: every request here is answered locally.

use agro_assistant_backend::config::{
    BotConfig, Config, HttpConfig, ImagesConfig, OpenAiConfig, OpenWeatherConfig, ServerConfig,
    UsdaConfig, WhatsAppConfig,
};
use agro_assistant_backend::handlers::sign_body;
use agro_assistant_backend::{create_app, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::path::PathBuf;
use tower::ServiceExt;

const VERIFY_TOKEN: &str = "token-de-teste";
const APP_SECRET: &str = "segredo";

fn test_config(whatsapp_enabled: bool, images_root: &str) -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig::default(),
        bot: BotConfig {
            name: "AgroBot".to_string(),
        },
        whatsapp: WhatsAppConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            phone_number_id: if whatsapp_enabled { "106540352242922" } else { "" }.to_string(),
            access_token: if whatsapp_enabled { "EAAB-test" } else { "" }.to_string(),
            verify_token: VERIFY_TOKEN.to_string(),
            app_secret: Some(APP_SECRET.to_string()),
        },
        openai: OpenAiConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 500,
            temperature: 0.7,
        },
        usda: UsdaConfig {
            api_key: String::new(),
            base_url: "http://127.0.0.1:9".to_string(),
        },
        openweather: OpenWeatherConfig {
            api_key: String::new(),
            base_url: "http://127.0.0.1:9".to_string(),
            geocoding_url: "http://127.0.0.1:9".to_string(),
        },
        images: ImagesConfig {
            root_dir: images_root.to_string(),
        },
        http: HttpConfig { timeout_secs: 1 },
    }
}

fn app(whatsapp_enabled: bool, images_root: &str) -> Router {
    let state = AppState::from_config(test_config(whatsapp_enabled, images_root)).unwrap();
    create_app(state)
}

fn scratch_images(name: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!("agrobot-http-{}-{}", name, std::process::id()));
    let folder = root.join("imgrain");
    std::fs::create_dir_all(&folder).unwrap();
    std::fs::write(folder.join("saopaulo_windy_rain_24h.png"), b"png").unwrap();
    root
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let response = app(false, "static/clima")
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["bot_name"], "AgroBot");
        assert_eq!(json["whatsapp_configured"], false);
    }

    #[tokio::test]
    async fn test_webhook_unavailable_without_whatsapp() {
        let response = app(false, "static/clima")
            .oneshot(
                Request::get("/webhook?hub.mode=subscribe&hub.verify_token=token-de-teste&hub.challenge=42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_webhook_handshake() {
        let response = app(true, "static/clima")
            .oneshot(
                Request::get("/webhook?hub.mode=subscribe&hub.verify_token=token-de-teste&hub.challenge=1158201444")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "1158201444");
    }

    #[tokio::test]
    async fn test_webhook_handshake_wrong_token() {
        let response = app(true, "static/clima")
            .oneshot(
                Request::get("/webhook?hub.mode=subscribe&hub.verify_token=errado&hub.challenge=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_webhook_rejects_bad_signature() {
        let response = app(true, "static/clima")
            .oneshot(
                Request::post("/webhook")
                    .header("content-type", "application/json")
                    .header("x-hub-signature-256", "sha256=00")
                    .body(Body::from(r#"{"object":"whatsapp_business_account","entry":[]}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_webhook_acknowledges_status_notification() {
        let body = r#"{"object":"whatsapp_business_account","entry":[{"id":"1","changes":[{"field":"messages","value":{"messaging_product":"whatsapp","statuses":[{"id":"wamid.x","status":"read"}]}}]}]}"#;
        let signature = format!("sha256={}", sign_body(body.as_bytes(), APP_SECRET).unwrap());

        let response = app(true, "static/clima")
            .oneshot(
                Request::post("/webhook")
                    .header("content-type", "application/json")
                    .header("x-hub-signature-256", signature)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["message"], "EVENT_RECEIVED");
    }

    #[tokio::test]
    async fn test_layer_image_lookup() {
        let root = scratch_images("layer");
        let app = app(false, root.to_str().unwrap());

        let response = app
            .clone()
            .oneshot(
                Request::get("/api/v1/clima/images/S%C3%A3o%20Paulo/rain")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["exists"], true);
        assert_eq!(json["url"], "/static/clima/imgrain/saopaulo_windy_rain_24h.png");

        let response = app
            .clone()
            .oneshot(
                Request::get("/api/v1/clima/images/Curitiba/rain")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(
                Request::get("/api/v1/clima/images/Curitiba/neblina")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        std::fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn test_stored_image_is_served() {
        let root = scratch_images("serve");

        let response = app(false, root.to_str().unwrap())
            .oneshot(
                Request::get("/static/clima/imgrain/saopaulo_windy_rain_24h.png")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "png");

        std::fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn test_chat_rejects_empty_message() {
        let response = app(false, "static/clima")
            .oneshot(
                Request::post("/api/v1/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"message":"   "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chat_greeting() {
        let response = app(false, "static/clima")
            .oneshot(
                Request::post("/api/v1/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"message":"Bom dia!"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["intent"], "greeting");
        assert_eq!(json["parts"][0]["type"], "text");
        assert!(json["parts"][0]["body"]
            .as_str()
            .unwrap()
            .contains("Eu sou o AgroBot"));
    }

    #[tokio::test]
    async fn test_chat_apology_without_llm() {
        // No OpenAI key: the assistant fails and the apology is captured
        let response = app(false, "static/clima")
            .oneshot(
                Request::post("/api/v1/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"message":"Como plantar feijão?"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["intent"], "general");
        assert!(json["parts"][0]["body"]
            .as_str()
            .unwrap()
            .starts_with("Desculpe, ocorreu um erro"));
    }
}
