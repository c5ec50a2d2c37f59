//! External API integrations

pub mod image_store;
pub mod openai;
pub mod openweather;
pub mod usda;
pub mod whatsapp;

pub use image_store::{FsImageStore, ImageStore};
pub use openai::{LlmCompletion, OpenAiClient};
pub use openweather::{OpenWeatherClient, WeatherDataSource};
pub use usda::{CommodityDataSource, PsdClient};
pub use whatsapp::{MessageTransport, WhatsAppClient};
