//! AgroBot - WhatsApp assistant for Brazilian agricultural data
//!
//! Answers commodity questions from USDA PSD, weather questions from
//! OpenWeather (with pre-rendered map images when available) and everything
//! else through an LLM.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod routes;
pub mod services;

pub use config::Config;

use error::AppResult;
use external::{
    FsImageStore, LlmCompletion, MessageTransport, OpenAiClient, OpenWeatherClient, PsdClient,
    WhatsAppClient,
};
use services::chatbot::AssistantSettings;
use services::{ChatbotService, CommodityService, TextNormalizer, WeatherService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub chatbot: Arc<ChatbotService>,
    /// `None` when WhatsApp credentials are missing
    pub transport: Option<Arc<dyn MessageTransport>>,
    pub psd: Arc<PsdClient>,
    pub weather: Arc<OpenWeatherClient>,
    pub images: Arc<FsImageStore>,
}

impl AppState {
    /// Wire every client and service from configuration
    pub fn from_config(config: Config) -> AppResult<Self> {
        let config = Arc::new(config);

        let openai = OpenAiClient::new(&config.openai, &config.http)?;
        let normalizer = if openai.is_configured() {
            TextNormalizer::new(Some(Arc::new(openai.clone())))
        } else {
            TextNormalizer::disabled()
        };
        tracing::info!("Text normalization enabled: {}", normalizer.is_enabled());
        let assistant: Arc<dyn LlmCompletion> = Arc::new(openai);

        let psd = Arc::new(PsdClient::new(&config.usda, &config.http)?);
        let weather = Arc::new(OpenWeatherClient::new(&config.openweather, &config.http)?);
        let images = Arc::new(FsImageStore::new(&config.images.root_dir));

        let chatbot = ChatbotService::new(
            config.whatsapp.phone_number_id.trim(),
            AssistantSettings {
                bot_name: config.bot.name.clone(),
                max_tokens: config.openai.max_tokens,
                temperature: config.openai.temperature,
            },
            CommodityService::new(psd.clone(), normalizer.clone()),
            WeatherService::new(weather.clone(), images.clone(), normalizer),
            assistant,
        );

        let transport: Option<Arc<dyn MessageTransport>> = if config.whatsapp.is_configured() {
            Some(Arc::new(WhatsAppClient::new(&config.whatsapp, &config.http)?))
        } else {
            None
        };

        Ok(Self {
            config,
            chatbot: Arc::new(chatbot),
            transport,
            psd,
            weather,
            images,
        })
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let images = ServeDir::new(state.images.root());

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .merge(routes::webhook_routes())
        .nest("/api/v1", routes::api_routes())
        .nest_service(handlers::IMAGES_URL_PREFIX, images)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "AgroBot WhatsApp Assistant API v1.0"
}
