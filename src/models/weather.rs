//! Weather reading model

use serde::{Deserialize, Serialize};

use crate::{Result, StarrySpotError};

/// Sky conditions relevant for star-gazing at a single point
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReading {
    /// Cloud cover percentage (0-100)
    pub cloud_cover: f64,
    /// Visibility in miles
    pub visibility: f64,
}

impl WeatherReading {
    /// Build a reading, treating out-of-bounds values as unusable provider data
    pub fn new(cloud_cover: f64, visibility: f64) -> Result<Self> {
        if !cloud_cover.is_finite() || !(0.0..=100.0).contains(&cloud_cover) {
            return Err(StarrySpotError::service(
                "weather",
                format!("cloud cover {cloud_cover} is not a percentage"),
            ));
        }
        if !visibility.is_finite() || visibility < 0.0 {
            return Err(StarrySpotError::service(
                "weather",
                format!("visibility {visibility} is not a distance"),
            ));
        }
        Ok(Self {
            cloud_cover,
            visibility,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_reading() {
        let reading = WeatherReading::new(20.0, 10.0).unwrap();
        assert_eq!(reading.cloud_cover, 20.0);
        assert_eq!(reading.visibility, 10.0);
    }

    #[test]
    fn test_cloud_cover_out_of_bounds_is_service_error() {
        let err = WeatherReading::new(120.0, 10.0).unwrap_err();
        assert!(matches!(err, StarrySpotError::Service { service: "weather", .. }));
    }

    #[test]
    fn test_negative_visibility_is_service_error() {
        assert!(WeatherReading::new(0.0, -1.0).is_err());
        assert!(WeatherReading::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(WeatherReading::new(20.0, 10.0).unwrap()).unwrap();
        assert_eq!(json["cloudCover"], 20.0);
        assert_eq!(json["visibility"], 10.0);
    }
}
