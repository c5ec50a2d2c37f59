//! Route definitions for the AgroBot API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// WhatsApp webhook routes, mounted at the root
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route(
        "/webhook",
        get(handlers::verify_whatsapp_webhook).post(handlers::handle_whatsapp_webhook),
    )
}

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/chat", post(handlers::chat))
        .nest("/usda", usda_routes())
        .nest("/weather", weather_routes())
        .nest("/clima", clima_routes())
}

/// USDA PSD passthrough routes
fn usda_routes() -> Router<AppState> {
    Router::new()
        .route("/commodities", get(handlers::list_psd_commodities))
        .route("/regions", get(handlers::list_psd_regions))
        .route("/countries", get(handlers::list_psd_countries))
        .route(
            "/commodity/:code/country/:country/year/:year",
            get(handlers::get_psd_country_data),
        )
        .route("/commodity/:code/brazil/:year", get(handlers::get_psd_brazil_data))
        .route("/commodity/:code/world/:year", get(handlers::get_psd_world_data))
        .route(
            "/commodity/:code/data-release",
            get(handlers::get_psd_release_dates),
        )
}

/// Weather lookup routes
fn weather_routes() -> Router<AppState> {
    Router::new()
        .route("/forecast/:city", get(handlers::get_city_forecast))
        .route("/current/:city", get(handlers::get_city_current_weather))
}

/// Stored map image routes
fn clima_routes() -> Router<AppState> {
    Router::new().route("/images/:city/:layer", get(handlers::get_city_layer_image))
}
