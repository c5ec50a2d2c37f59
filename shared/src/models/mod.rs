//! Domain models for the AgroBot assistant

mod commodity;
mod weather;

pub use commodity::*;
pub use weather::*;
