//! Shared types and models for the AgroBot assistant
//!
//! This crate contains the static reference tables and transient domain
//! types used by the backend's intent pipeline. It performs no I/O.

pub mod models;
pub mod text;
pub mod types;

pub use models::*;
pub use text::*;
pub use types::*;
