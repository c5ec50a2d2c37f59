//! Weather API client for geocoding and forecasts
//!
//! Integrates with OpenWeatherMap's geocoding and 5 day / 3 hour forecast APIs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use shared::{CityReference, CurrentConditions, Forecast, ForecastEntry};

use crate::config::{HttpConfig, OpenWeatherConfig};
use crate::error::{AppError, AppResult};

/// Source of geocoding and forecast data
#[async_trait]
pub trait WeatherDataSource: Send + Sync {
    /// Resolve a city name; fails with `UpstreamNotFound` when unknown
    async fn geocode(&self, city: &str) -> AppResult<CityReference>;

    /// 5 day forecast in 3 hour steps
    async fn forecast(&self, latitude: f64, longitude: f64) -> AppResult<Forecast>;
}

/// OpenWeatherMap client
#[derive(Clone)]
pub struct OpenWeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
    geocoding_url: String,
}

/// Geocoding API result
#[derive(Debug, Deserialize)]
struct OWMGeocodeResult {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: String,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OWMWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OWMMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: i32,
}

#[derive(Debug, Deserialize)]
struct OWMWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OWMForecastRain {
    #[serde(rename = "3h")]
    three_hour: Option<f64>,
}

/// OpenWeatherMap API response for forecast
#[derive(Debug, Deserialize)]
struct OWMForecastResponse {
    city: OWMCity,
    list: Vec<OWMForecastItem>,
}

#[derive(Debug, Deserialize)]
struct OWMCity {
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OWMForecastItem {
    dt: i64,
    main: OWMMain,
    weather: Vec<OWMWeather>,
    wind: OWMWind,
    rain: Option<OWMForecastRain>,
}

/// OpenWeatherMap API response for current weather
#[derive(Debug, Deserialize)]
struct OWMCurrentResponse {
    dt: i64,
    main: OWMMain,
    weather: Vec<OWMWeather>,
    wind: OWMWind,
}

impl OpenWeatherClient {
    /// Create a new OpenWeatherClient
    pub fn new(config: &OpenWeatherConfig, http: &HttpConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(http.timeout())
            .build()
            .map_err(|e| AppError::Configuration(format!("OpenWeather HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            geocoding_url: config.geocoding_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch current conditions by coordinates
    pub async fn current(&self, latitude: f64, longitude: f64) -> AppResult<CurrentConditions> {
        let url = format!("{}/weather", self.base_url);
        let data: OWMCurrentResponse = self.get_data(&url, latitude, longitude).await?;
        let weather = data.weather.first();

        Ok(CurrentConditions {
            timestamp: DateTime::from_timestamp(data.dt, 0).unwrap_or_else(Utc::now),
            weather_icon_code: weather.map(|w| w.icon.clone()).unwrap_or_default(),
            description: weather.map(|w| w.description.clone()).unwrap_or_default(),
            temp_c: data.main.temp,
            feels_like_c: data.main.feels_like,
            humidity_pct: data.main.humidity,
            wind_speed_mps: data.wind.speed,
        })
    }

    async fn get_data<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        latitude: f64,
        longitude: f64,
    ) -> AppResult<T> {
        let response = self
            .client
            .get(url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
                ("lang", "pt_br".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::from_reqwest(e, "Weather API request failed"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Weather API error: {} - {}", status, body);
            return Err(AppError::from_status(status, "OpenWeather"));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::UpstreamUnreachable(format!("Failed to parse weather response: {}", e)))
    }

    /// Convert OpenWeatherMap forecast response to our format
    fn convert_forecast_response(data: OWMForecastResponse) -> Forecast {
        let entries = data
            .list
            .into_iter()
            .map(|item| {
                let weather = item.weather.first();
                ForecastEntry {
                    timestamp: DateTime::from_timestamp(item.dt, 0).unwrap_or_else(Utc::now),
                    weather_icon_code: weather.map(|w| w.icon.clone()).unwrap_or_default(),
                    description: weather.map(|w| w.description.clone()).unwrap_or_default(),
                    temp_c: item.main.temp,
                    temp_min_c: item.main.temp_min,
                    temp_max_c: item.main.temp_max,
                    humidity_pct: item.main.humidity,
                    wind_speed_mps: item.wind.speed,
                    rain_mm: item.rain.and_then(|r| r.three_hour),
                }
            })
            .collect();

        Forecast {
            timezone_offset_seconds: data.city.timezone,
            entries,
        }
    }
}

#[async_trait]
impl WeatherDataSource for OpenWeatherClient {
    async fn geocode(&self, city: &str) -> AppResult<CityReference> {
        let url = format!("{}/direct", self.geocoding_url);

        let response = self
            .client
            .get(&url)
            .query(&[("q", city), ("limit", "1"), ("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| AppError::from_reqwest(e, "Geocoding request failed"))?;

        if !response.status().is_success() {
            return Err(AppError::from_status(response.status(), "OpenWeather geocoding"));
        }

        let results: Vec<OWMGeocodeResult> = response
            .json()
            .await
            .map_err(|e| AppError::UpstreamUnreachable(format!("Failed to parse geocoding response: {}", e)))?;

        results
            .into_iter()
            .next()
            .map(|r| CityReference {
                name: r.name,
                country: r.country,
                state: r.state,
                latitude: r.lat,
                longitude: r.lon,
            })
            .ok_or_else(|| AppError::UpstreamNotFound(format!("Cidade \"{}\"", city)))
    }

    async fn forecast(&self, latitude: f64, longitude: f64) -> AppResult<Forecast> {
        let url = format!("{}/forecast", self.base_url);
        let data: OWMForecastResponse = self.get_data(&url, latitude, longitude).await?;
        Ok(Self::convert_forecast_response(data))
    }
}
