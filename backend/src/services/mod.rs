//! Intent pipeline: classification, extraction, resolution and dispatch

pub mod chatbot;
pub mod commodity;
pub mod formatting;
pub mod intent;
pub mod normalizer;
pub mod weather;

pub use chatbot::ChatbotService;
pub use commodity::CommodityService;
pub use normalizer::TextNormalizer;
pub use weather::WeatherService;
