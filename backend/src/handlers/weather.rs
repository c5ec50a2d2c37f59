//! HTTP handlers for weather lookups

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use shared::{CityReference, CurrentConditions, Forecast};

use crate::error::AppResult;
use crate::external::WeatherDataSource;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub city: CityReference,
    pub forecast: Forecast,
}

#[derive(Debug, Serialize)]
pub struct CurrentWeatherResponse {
    pub city: CityReference,
    pub current: CurrentConditions,
}

/// 5 day forecast for a city
/// GET /weather/forecast/:city
pub async fn get_city_forecast(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> AppResult<Json<ForecastResponse>> {
    let city = state.weather.geocode(&city).await?;
    let forecast = state.weather.forecast(city.latitude, city.longitude).await?;
    Ok(Json(ForecastResponse { city, forecast }))
}

/// Current conditions for a city
/// GET /weather/current/:city
pub async fn get_city_current_weather(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> AppResult<Json<CurrentWeatherResponse>> {
    let city = state.weather.geocode(&city).await?;
    let current = state.weather.current(city.latitude, city.longitude).await?;
    Ok(Json(CurrentWeatherResponse { city, current }))
}
