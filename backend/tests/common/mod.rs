//! In-memory collaborators shared by the integration tests

#![allow(dead_code)]

use agro_assistant_backend::error::{AppError, AppResult};
use agro_assistant_backend::external::{
    CommodityDataSource, ImageStore, LlmCompletion, MessageTransport, WeatherDataSource,
};
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use shared::{image_key, AttributeValue, CityReference, Forecast, ForecastEntry, MapLayer, Region};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// How a fake upstream should fail
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Failure {
    NotFound,
    Unauthorized,
    RateLimited,
    Unreachable,
}

impl Failure {
    pub fn to_error(self) -> AppError {
        match self {
            Failure::NotFound => AppError::UpstreamNotFound("fake".to_string()),
            Failure::Unauthorized => AppError::UpstreamUnauthorized("fake".to_string()),
            Failure::RateLimited => AppError::UpstreamRateLimited("fake".to_string()),
            Failure::Unreachable => AppError::UpstreamUnreachable("fake".to_string()),
        }
    }
}

// ============================================================================
// Commodity source
// ============================================================================

/// PSD source answering from a table and recording every request
#[derive(Default)]
pub struct FakePsd {
    data: HashMap<(String, String, i32), Value>,
    failing: HashMap<(String, String, i32), Failure>,
    probe_failure: Option<Failure>,
    calls: Mutex<Vec<(String, String, i32)>>,
}

impl FakePsd {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(self, code: &str, region: Region, year: i32, rows: Vec<AttributeValue>) -> Self {
        self.with_body(code, region, year, json!(rows))
    }

    pub fn with_body(mut self, code: &str, region: Region, year: i32, body: Value) -> Self {
        self.data.insert((code.to_string(), region.to_string(), year), body);
        self
    }

    pub fn with_failure(mut self, code: &str, region: Region, year: i32, failure: Failure) -> Self {
        self.failing.insert((code.to_string(), region.to_string(), year), failure);
        self
    }

    pub fn with_probe_failure(mut self, failure: Failure) -> Self {
        self.probe_failure = Some(failure);
        self
    }

    pub fn calls(&self) -> Vec<(String, String, i32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommodityDataSource for FakePsd {
    async fn list_commodities(&self) -> AppResult<Value> {
        match self.probe_failure {
            Some(failure) => Err(failure.to_error()),
            None => Ok(json!([{"commodityCode": "0440000", "commodityName": "Corn"}])),
        }
    }

    async fn commodity_data(&self, code: &str, region: &Region, year: i32) -> AppResult<Value> {
        let key = (code.to_string(), region.to_string(), year);
        self.calls.lock().unwrap().push(key.clone());
        if let Some(failure) = self.failing.get(&key) {
            return Err(failure.to_error());
        }
        Ok(self.data.get(&key).cloned().unwrap_or_else(|| json!([])))
    }
}

pub fn row(attribute_id: u32, value: f64, market_year: i32) -> AttributeValue {
    AttributeValue {
        attribute_id,
        value: Some(value),
        market_year: Some(market_year),
    }
}

// ============================================================================
// Weather source
// ============================================================================

pub struct FakeWeather {
    pub city: Result<CityReference, Failure>,
    pub forecast: Result<Forecast, Failure>,
    pub geocoded: Mutex<Vec<String>>,
}

impl FakeWeather {
    pub fn new(city: CityReference, forecast: Forecast) -> Self {
        Self {
            city: Ok(city),
            forecast: Ok(forecast),
            geocoded: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_geocode(failure: Failure) -> Self {
        Self {
            city: Err(failure),
            forecast: Ok(forecast_days(-10800, 5)),
            geocoded: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl WeatherDataSource for FakeWeather {
    async fn geocode(&self, city: &str) -> AppResult<CityReference> {
        self.geocoded.lock().unwrap().push(city.to_string());
        self.city.clone().map_err(Failure::to_error)
    }

    async fn forecast(&self, _latitude: f64, _longitude: f64) -> AppResult<Forecast> {
        self.forecast.clone().map_err(Failure::to_error)
    }
}

pub fn city(name: &str) -> CityReference {
    CityReference {
        name: name.to_string(),
        country: "BR".to_string(),
        state: None,
        latitude: -23.55,
        longitude: -46.63,
    }
}

/// Forecast entry at a local wall-clock hour, for a city `offset_secs` east of UTC
pub fn entry_at(offset_secs: i32, day: u32, hour: u32, temp_c: f64) -> ForecastEntry {
    let local_as_utc = Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap();
    ForecastEntry {
        timestamp: local_as_utc - Duration::seconds(offset_secs as i64),
        weather_icon_code: "01d".to_string(),
        description: format!("céu limpo {:02}h", hour),
        temp_c,
        temp_min_c: temp_c - 2.0,
        temp_max_c: temp_c + 2.0,
        humidity_pct: 60,
        wind_speed_mps: 2.5,
        rain_mm: None,
    }
}

/// `days` full days of 3-hourly entries starting 2025-03-10 local
pub fn forecast_days(offset_secs: i32, days: u32) -> Forecast {
    let entries = (0..days)
        .flat_map(|d| (0..8).map(move |slot| entry_at(offset_secs, 10 + d, slot * 3, 20.0 + slot as f64)))
        .collect();
    Forecast {
        timezone_offset_seconds: offset_secs,
        entries,
    }
}

// ============================================================================
// LLM
// ============================================================================

/// Completion fake: corrections come from a lookup table (identity when
/// unknown); free-form questions get a fixed answer or a failure
pub struct FakeLlm {
    corrections: HashMap<String, String>,
    answer: Result<String, Failure>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeLlm {
    pub fn answering(answer: &str) -> Self {
        Self {
            corrections: HashMap::new(),
            answer: Ok(answer.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(failure: Failure) -> Self {
        Self {
            corrections: HashMap::new(),
            answer: Err(failure),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn correcting(mut self, from: &str, to: &str) -> Self {
        self.corrections.insert(from.to_string(), to.to_string());
        self
    }

    pub fn assistant_calls(&self) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.starts_with("Você é o"))
            .count()
    }
}

#[async_trait]
impl LlmCompletion for FakeLlm {
    async fn complete(&self, system: &str, user: &str, _max_tokens: u32, _temperature: f32) -> AppResult<String> {
        self.prompts.lock().unwrap().push(system.to_string());

        if system.starts_with("Você é um assistente especializado em correção") {
            let text = user.rsplit_once("corrigir: ").map(|(_, t)| t).unwrap_or(user);
            return Ok(self
                .corrections
                .get(text)
                .cloned()
                .unwrap_or_else(|| text.to_string()));
        }

        self.answer.clone().map_err(Failure::to_error)
    }
}

// ============================================================================
// Images
// ============================================================================

#[derive(Default)]
pub struct FakeImages {
    images: HashMap<String, PathBuf>,
}

impl FakeImages {
    pub fn with_image(mut self, city: &str) -> Self {
        let key = image_key(city);
        let path = PathBuf::from(format!("static/clima/imgrain/{}_windy_rain_24h.png", key));
        self.images.insert(key, path);
        self
    }
}

#[async_trait]
impl ImageStore for FakeImages {
    async fn find_image(&self, city: &str) -> Option<PathBuf> {
        self.images.get(&image_key(city)).cloned()
    }

    async fn find_layer_image(&self, city: &str, layer: MapLayer) -> Option<PathBuf> {
        self.images
            .get(&image_key(city))
            .filter(|p| p.to_string_lossy().contains(layer.folder()))
            .cloned()
    }
}

// ============================================================================
// Transport
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text(String, String),
    Image(String, PathBuf),
}

#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<Sent>>,
    pub fail_text: bool,
    pub fail_images: bool,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text(_, body) => Some(body),
                Sent::Image(..) => None,
            })
            .collect()
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn send_text(&self, to: &str, text: &str) -> AppResult<()> {
        if self.fail_text {
            return Err(AppError::Transport("fake text failure".to_string()));
        }
        self.sent.lock().unwrap().push(Sent::Text(to.to_string(), text.to_string()));
        Ok(())
    }

    async fn send_image(&self, to: &str, image_path: &Path, _caption: Option<&str>) -> AppResult<()> {
        if self.fail_images {
            return Err(AppError::Transport("fake image failure".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Image(to.to_string(), image_path.to_path_buf()));
        Ok(())
    }
}
