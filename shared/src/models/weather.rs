//! Weather data models

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A geocoded city as returned by the weather source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityReference {
    pub name: String,
    pub country: String,
    pub state: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// One 3-hour forecast step, source-neutral
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub timestamp: DateTime<Utc>,
    pub weather_icon_code: String,
    pub description: String,
    pub temp_c: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub humidity_pct: i32,
    pub wind_speed_mps: f64,
    pub rain_mm: Option<f64>,
}

/// Multi-day forecast for one city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Offset of the city's local time from UTC, in seconds
    pub timezone_offset_seconds: i32,
    pub entries: Vec<ForecastEntry>,
}

/// Current conditions for one city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub timestamp: DateTime<Utc>,
    pub weather_icon_code: String,
    pub description: String,
    pub temp_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: i32,
    pub wind_speed_mps: f64,
}

/// The one forecast entry chosen to represent a calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecastSample {
    /// "DD/MM" in the city's local time
    pub date_key: String,
    pub date: NaiveDate,
    pub timestamp: DateTime<FixedOffset>,
    pub weather_icon_code: String,
    pub description: String,
    pub temp_c: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub humidity_pct: i32,
    pub wind_kph: f64,
    pub rain_mm: f64,
}

impl DailyForecastSample {
    /// Build a sample from a raw entry in the given local offset
    pub fn from_entry(entry: &ForecastEntry, offset: FixedOffset) -> Self {
        let local = entry.timestamp.with_timezone(&offset);
        let date = local.date_naive();
        Self {
            date_key: date.format("%d/%m").to_string(),
            date,
            timestamp: local,
            weather_icon_code: entry.weather_icon_code.clone(),
            description: entry.description.clone(),
            temp_c: entry.temp_c,
            temp_min_c: entry.temp_min_c,
            temp_max_c: entry.temp_max_c,
            humidity_pct: entry.humidity_pct,
            wind_kph: entry.wind_speed_mps * 3.6,
            rain_mm: entry.rain_mm.unwrap_or(0.0),
        }
    }
}
