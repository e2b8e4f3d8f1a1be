//! Flattens the request and both readings into the record the instruction template reads.

use crate::models::{LightPollutionReading, RecommendationRequest, WeatherReading};

/// Placeholder names the instruction template may reference.
pub(crate) const TEMPLATE_FIELDS: [&str; 5] = [
    "latitude",
    "longitude",
    "cloudCover",
    "visibility",
    "lightPollutionLevel",
];

/// Values available to the instruction template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PromptContext {
    pub latitude: f64,
    pub longitude: f64,
    /// Percent
    pub cloud_cover: f64,
    /// Miles
    pub visibility: f64,
    /// Bortle-like, 1-9
    pub light_pollution_level: f64,
}

impl PromptContext {
    /// Look up a value by its template placeholder name
    pub(crate) fn field(&self, name: &str) -> Option<f64> {
        match name {
            "latitude" => Some(self.latitude),
            "longitude" => Some(self.longitude),
            "cloudCover" => Some(self.cloud_cover),
            "visibility" => Some(self.visibility),
            "lightPollutionLevel" => Some(self.light_pollution_level),
            _ => None,
        }
    }
}

pub(crate) fn build_prompt_context(
    request: &RecommendationRequest,
    weather: &WeatherReading,
    light_pollution: &LightPollutionReading,
) -> PromptContext {
    PromptContext {
        latitude: request.latitude,
        longitude: request.longitude,
        cloud_cover: weather.cloud_cover,
        visibility: weather.visibility,
        light_pollution_level: light_pollution.light_pollution_level,
    }
}
