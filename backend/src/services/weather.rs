//! City extraction and 5-day forecast resolution

use chrono::{FixedOffset, Local, NaiveDate, Offset, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use shared::{DailyForecastSample, ForecastEntry, NormalizationKind};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use super::formatting;
use super::normalizer::TextNormalizer;
use crate::error::AppError;
use crate::external::{ImageStore, WeatherDataSource};

/// Number of days in a forecast reply
pub const FORECAST_DAYS: usize = 5;

/// Local-time window whose entries may represent the day, in minutes
const WINDOW_START: u32 = 9 * 60;
const WINDOW_END: u32 = 15 * 60;
const NOON: u32 = 12 * 60;

/// Templates tried in order; the first capture group is the city
static CITY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?:clima|tempo|temperatura|previsão|previsao)\s+(?:em|de|do|da|na|no|para)\s+([^?.,!]+)",
        r"(?i)(?:qual|como)\s+(?:o|a)\s+(?:clima|tempo|temperatura|previsão|previsao)\s+(?:em|de|do|da|na|no|para)\s+([^?.,!]+)",
        r"(?i)(?:previsão|previsao)\s+(?:de|do)\s+(?:tempo|clima)\s+(?:para|em|de|do|da|na|no)\s+([^?.,!]+)",
        r"(?i)(?:em|de|do|da|na|no|para)\s+([^?.,!]+)\s+(?:o|a)\s+(?:clima|tempo|temperatura)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("city pattern is valid"))
    .collect()
});

/// Pull a city name out of a weather question
///
/// Falls back to the last two words when no template matches, which is a
/// guess; a wrong guess surfaces later as "city not found".
pub fn extract_city(text: &str) -> Option<String> {
    for pattern in CITY_PATTERNS.iter() {
        if let Some(city) = pattern
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .filter(|c| !c.is_empty())
        {
            return Some(city.to_string());
        }
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > 2 {
        let tail = words[words.len() - 2..]
            .join(" ")
            .replace(['?', '.', ',', '!'], "");
        let tail = tail.trim();
        if !tail.is_empty() {
            return Some(tail.to_string());
        }
    }
    None
}

fn minutes_from_noon(sample: &DailyForecastSample) -> Option<u32> {
    let local = sample.timestamp;
    let minutes = local.hour() * 60 + local.minute();
    (WINDOW_START..=WINDOW_END)
        .contains(&minutes)
        .then(|| minutes.abs_diff(NOON))
}

/// Whether `candidate` should replace `current` as the day's sample
fn is_better_sample(candidate: &DailyForecastSample, current: &DailyForecastSample) -> bool {
    match (minutes_from_noon(candidate), minutes_from_noon(current)) {
        (Some(c), Some(k)) => c < k,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Reduce 3-hourly entries to one sample per local calendar day
///
/// Within each day the entry closest to noon inside 09:00–15:00 wins; ties
/// keep the earlier entry. Days with nothing in the window keep their first
/// entry. Days come back in date order, at most `FORECAST_DAYS` of them.
pub fn bucket_daily(entries: &[ForecastEntry], offset: FixedOffset) -> Vec<DailyForecastSample> {
    let mut days: BTreeMap<NaiveDate, DailyForecastSample> = BTreeMap::new();

    for entry in entries {
        let candidate = DailyForecastSample::from_entry(entry, offset);
        match days.entry(candidate.date) {
            Entry::Vacant(slot) => {
                slot.insert(candidate);
            }
            Entry::Occupied(mut slot) => {
                if is_better_sample(&candidate, slot.get()) {
                    slot.insert(candidate);
                }
            }
        }
    }

    days.into_values().take(FORECAST_DAYS).collect()
}

/// What the resolver hands back to the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherReply {
    /// Text, with an image to send before it when one is stored
    Forecast { text: String, image: Option<PathBuf> },
    /// City unknown or the source failed; the notice explains which
    Unavailable { notice: String },
}

#[derive(Clone)]
pub struct WeatherService {
    source: Arc<dyn WeatherDataSource>,
    images: Arc<dyn ImageStore>,
    normalizer: TextNormalizer,
}

impl WeatherService {
    pub fn new(
        source: Arc<dyn WeatherDataSource>,
        images: Arc<dyn ImageStore>,
        normalizer: TextNormalizer,
    ) -> Self {
        Self {
            source,
            images,
            normalizer,
        }
    }

    /// Extract and resolve in one step; `None` when no city can be found
    pub async fn answer(&self, text: &str) -> Option<WeatherReply> {
        let city = extract_city(text)?;
        Some(self.resolve(&city).await)
    }

    /// Geocode, fetch and format a 5-day forecast for a raw city name
    pub async fn resolve(&self, city_text: &str) -> WeatherReply {
        let normalized = self
            .normalizer
            .normalize(city_text, NormalizationKind::City)
            .await;

        let city = match self.source.geocode(&normalized).await {
            Ok(city) => city,
            Err(e) => return unavailable(&normalized, e),
        };

        let forecast = match self.source.forecast(city.latitude, city.longitude).await {
            Ok(forecast) => forecast,
            Err(e) => return unavailable(&normalized, e),
        };

        let offset = FixedOffset::east_opt(forecast.timezone_offset_seconds)
            .unwrap_or_else(|| Utc.fix());
        let days = bucket_daily(&forecast.entries, offset);
        let image = self.find_image(&[&normalized, city_text, &city.name]).await;

        tracing::info!(
            "Forecast for {} ({} days, image: {})",
            city.name,
            days.len(),
            image.is_some()
        );

        let today = Local::now().date_naive();
        WeatherReply::Forecast {
            text: formatting::forecast_summary(&city, &days, image.is_some(), today),
            image,
        }
    }

    /// Look up a stored image under each candidate name in turn
    async fn find_image(&self, names: &[&str]) -> Option<PathBuf> {
        for name in names {
            if let Some(path) = self.images.find_image(name).await {
                return Some(path);
            }
        }
        None
    }
}

fn unavailable(city: &str, err: AppError) -> WeatherReply {
    let notice = match &err {
        AppError::UpstreamNotFound(_) => formatting::CITY_NOT_FOUND,
        AppError::UpstreamUnauthorized(_) => formatting::WEATHER_AUTH_FAILED,
        _ => formatting::WEATHER_FAILED,
    };
    tracing::warn!("Weather lookup for {:?} failed: {}", city, err);
    WeatherReply::Unavailable {
        notice: notice.to_string(),
    }
}
