//! Request and result records of the recommendation flow, with their declared schemas

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::Coordinates;
use crate::{Result, StarrySpotError};

/// Name under which the input schema is registered with the engine.
pub const INPUT_SCHEMA_NAME: &str = "RecommendOptimalViewingLocationsInput";
/// Name under which the output schema is registered with the engine.
pub const OUTPUT_SCHEMA_NAME: &str = "RecommendOptimalViewingLocationsOutput";

/// The user's position, as supplied by a geolocation capability
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RecommendationRequest {
    pub latitude: f64,
    pub longitude: f64,
}

impl RecommendationRequest {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check the request against the input schema
    pub fn validate(&self) -> Result<()> {
        self.coordinates().map(|_| ())
    }

    /// Validated coordinates of the request
    pub fn coordinates(&self) -> Result<Coordinates> {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// JSON schema of the request
    #[must_use]
    pub fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "latitude": {
                    "type": "number",
                    "minimum": -90,
                    "maximum": 90,
                    "description": "The latitude of the user location."
                },
                "longitude": {
                    "type": "number",
                    "minimum": -180,
                    "maximum": 180,
                    "description": "The longitude of the user location."
                }
            },
            "required": ["latitude", "longitude"],
            "additionalProperties": false
        })
    }
}

/// A recommended star-gazing spot and why it was chosen
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RecommendationResult {
    /// The name of the recommended location
    pub location_name: String,
    /// The location latitude
    pub location_lat: f64,
    /// The location longitude
    pub location_long: f64,
    /// Why this location suits star-gazing, based on weather and light pollution
    pub reason: String,
}

impl RecommendationResult {
    /// Check a generated result against the output schema constraints
    pub fn validate(&self) -> Result<()> {
        if self.location_name.trim().is_empty() {
            return Err(StarrySpotError::invalid_output("locationName must not be empty"));
        }
        if self.reason.trim().is_empty() {
            return Err(StarrySpotError::invalid_output("reason must not be empty"));
        }
        Coordinates::new(self.location_lat, self.location_long)
            .map_err(|e| match e {
                StarrySpotError::SchemaValidation { message, .. } => {
                    StarrySpotError::invalid_output(format!("location {message}"))
                }
                other => other,
            })
            .map(|_| ())
    }

    /// Coordinates of the recommended spot
    pub fn coordinates(&self) -> Result<Coordinates> {
        Coordinates::new(self.location_lat, self.location_long)
    }

    /// JSON schema the engine's output must conform to
    #[must_use]
    pub fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "locationName": {
                    "type": "string",
                    "description": "The name of the recommended location."
                },
                "locationLat": {
                    "type": "number",
                    "description": "The location latitude, in decimal degrees between -90 and 90."
                },
                "locationLong": {
                    "type": "number",
                    "description": "The location longitude, in decimal degrees between -180 and 180."
                },
                "reason": {
                    "type": "string",
                    "description": "The detailed reason why this location is recommended for star-gazing, based on weather and light pollution."
                }
            },
            "required": ["locationName", "locationLat", "locationLong", "reason"],
            "additionalProperties": false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn griffith() -> RecommendationResult {
        RecommendationResult {
            location_name: "Griffith Observatory".to_string(),
            location_lat: 34.12,
            location_long: -118.3,
            reason: "Clear skies and good visibility".to_string(),
        }
    }

    #[test]
    fn test_request_validation() {
        assert!(RecommendationRequest::new(40.0, -100.0).validate().is_ok());
        assert!(RecommendationRequest::new(91.0, 0.0).validate().is_err());
        assert!(RecommendationRequest::new(0.0, -180.5).validate().is_err());
    }

    #[test]
    fn test_result_wire_names() {
        let value = serde_json::to_value(griffith()).unwrap();
        assert_eq!(value["locationName"], "Griffith Observatory");
        assert_eq!(value["locationLat"], 34.12);
        assert_eq!(value["locationLong"], -118.3);
    }

    #[test]
    fn test_result_rejects_unknown_fields() {
        let value = json!({
            "locationName": "Somewhere",
            "locationLat": 1.0,
            "locationLong": 2.0,
            "reason": "dark",
            "confidence": 0.9
        });
        assert!(serde_json::from_value::<RecommendationResult>(value).is_err());
    }

    #[test]
    fn test_request_rejects_unknown_fields() {
        let value = json!({ "latitude": 34.05, "longitude": -118.24, "altitude": 9000 });
        assert!(serde_json::from_value::<RecommendationRequest>(value).is_err());
        assert_eq!(RecommendationRequest::json_schema()["additionalProperties"], false);
    }

    #[test]
    fn test_result_validation() {
        assert!(griffith().validate().is_ok());

        let mut blank_reason = griffith();
        blank_reason.reason = "   ".to_string();
        let err = blank_reason.validate().unwrap_err();
        assert!(err.to_string().contains("reason must not be empty"));

        let mut off_planet = griffith();
        off_planet.location_lat = 123.0;
        let err = off_planet.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Schema validation failed for output: location latitude 123 is outside [-90, 90]"
        );
    }

    #[test]
    fn test_schemas_require_every_field() {
        let input = RecommendationRequest::json_schema();
        assert_eq!(input["required"], json!(["latitude", "longitude"]));

        let output = RecommendationResult::json_schema();
        assert_eq!(output["required"].as_array().unwrap().len(), 4);
        assert_eq!(output["additionalProperties"], false);
    }
}
