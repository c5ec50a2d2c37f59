//! HTTP handlers for the AgroBot API

pub mod chat;
pub mod health;
pub mod images;
pub mod usda;
pub mod weather;
pub mod whatsapp;

pub use chat::*;
pub use health::*;
pub use images::*;
pub use usda::*;
pub use weather::*;
pub use whatsapp::*;
