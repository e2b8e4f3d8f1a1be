//! Data models for the StarrySpot application
//!
//! This module contains the core domain models organized by concern:
//! - Location: validated geographic coordinates
//! - Weather and light pollution: per-request readings from the lookups
//! - Recommendation: the flow's request and result records and their schemas

pub mod light_pollution;
pub mod location;
pub mod recommendation;
pub mod weather;

// Re-export all public types for convenient access
pub use light_pollution::LightPollutionReading;
pub use location::Coordinates;
pub use recommendation::{RecommendationRequest, RecommendationResult};
pub use weather::WeatherReading;
