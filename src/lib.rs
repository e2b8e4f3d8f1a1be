//! `StarrySpot` - star-gazing spot recommendations
//!
//! This library combines a user's coordinates with current weather and light
//! pollution readings and asks a schema-constrained inference engine for a nearby
//! viewing location, together with the reasoning behind the pick.

pub mod api;
pub mod config;
mod context;
pub mod error;
pub mod flow;
pub mod inference;
pub mod light_pollution;
pub mod logging;
pub mod models;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use config::StarrySpotConfig;
pub use error::{RECOMMENDATION_FAILED, SchemaBoundary, StarrySpotError};
pub use flow::{FlowTimeouts, RecommendationFlow};
pub use inference::{GenerationRequest, InferenceEngine, PromptTemplate, RecommendationPrompt};
pub use light_pollution::LightPollutionProvider;
pub use models::{
    Coordinates, LightPollutionReading, RecommendationRequest, RecommendationResult,
    WeatherReading,
};
pub use weather::WeatherProvider;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, StarrySpotError>;
