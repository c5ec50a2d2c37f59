//! Common types used across the assistant

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classified purpose of an inbound message
///
/// Classifiers may fire together; the dispatcher resolves ties in the order
/// Greeting > CommodityQuery > WeatherQuery > General.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    CommodityQuery,
    WeatherQuery,
    General,
}

/// Region scope for commodity data requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Brazil,
    World,
    /// Any other country by PSD country code
    Country(String),
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Brazil => write!(f, "BR"),
            Region::World => write!(f, "world"),
            Region::Country(code) => write!(f, "{}", code),
        }
    }
}

/// What a piece of text is expected to be when asking for correction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationKind {
    City,
    Commodity,
    General,
}

/// Meteorological layer of a pre-rendered map tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapLayer {
    Satellite,
    Clouds,
    Radar,
    Temp,
    Wind,
    Rain,
    Thunder,
    RainThunder,
}

impl MapLayer {
    /// Order in which layer folders are probed when any layer will do
    pub const SEARCH_ORDER: [MapLayer; 8] = [
        MapLayer::Rain,
        MapLayer::Temp,
        MapLayer::Wind,
        MapLayer::Clouds,
        MapLayer::Satellite,
        MapLayer::Radar,
        MapLayer::Thunder,
        MapLayer::RainThunder,
    ];

    /// Folder holding this layer's images
    pub fn folder(&self) -> &'static str {
        match self {
            MapLayer::Satellite => "imgsat",
            MapLayer::Clouds => "imgcloud",
            MapLayer::Radar => "imgradar",
            MapLayer::Temp => "imgtemp",
            MapLayer::Wind => "imgwind",
            MapLayer::Rain => "imgrain",
            MapLayer::Thunder => "imgthund",
            MapLayer::RainThunder => "imgrt",
        }
    }

    /// Layer name as used in URLs and file names
    pub fn slug(&self) -> &'static str {
        match self {
            MapLayer::Satellite => "satellite",
            MapLayer::Clouds => "clouds",
            MapLayer::Radar => "radar",
            MapLayer::Temp => "temp",
            MapLayer::Wind => "wind",
            MapLayer::Rain => "rain",
            MapLayer::Thunder => "thunder",
            MapLayer::RainThunder => "rainthunder",
        }
    }
}

/// Error for an unrecognised layer name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown map layer: {0}")]
pub struct UnknownLayer(pub String);

impl FromStr for MapLayer {
    type Err = UnknownLayer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "satellite" => Ok(MapLayer::Satellite),
            "clouds" => Ok(MapLayer::Clouds),
            "radar" => Ok(MapLayer::Radar),
            "temp" => Ok(MapLayer::Temp),
            "wind" => Ok(MapLayer::Wind),
            "rain" => Ok(MapLayer::Rain),
            "thunder" => Ok(MapLayer::Thunder),
            "rainthunder" => Ok(MapLayer::RainThunder),
            _ => Err(UnknownLayer(s.to_string())),
        }
    }
}
