//! Light pollution reading model

use serde::{Deserialize, Serialize};

use super::Coordinates;
use crate::{Result, StarrySpotError};

/// Light pollution level for the queried point.
///
/// The level is a continuous Bortle-like value: 1.0 is a pristine dark sky,
/// 9.0 an inner-city sky.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LightPollutionReading {
    pub latitude: f64,
    pub longitude: f64,
    pub light_pollution_level: f64,
}

impl LightPollutionReading {
    pub fn new(coordinates: Coordinates, light_pollution_level: f64) -> Result<Self> {
        if !light_pollution_level.is_finite() || light_pollution_level < 0.0 {
            return Err(StarrySpotError::service(
                "light pollution",
                format!("light pollution level {light_pollution_level} is not usable"),
            ));
        }
        Ok(Self {
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            light_pollution_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echoes_query_coordinates() {
        let coordinates = Coordinates::new(40.0, -100.0).unwrap();
        let reading = LightPollutionReading::new(coordinates, 3.5).unwrap();
        assert_eq!(reading.latitude, 40.0);
        assert_eq!(reading.longitude, -100.0);
        assert_eq!(reading.light_pollution_level, 3.5);
    }

    #[test]
    fn test_rejects_unusable_level() {
        let coordinates = Coordinates::new(0.0, 0.0).unwrap();
        assert!(LightPollutionReading::new(coordinates, -0.5).is_err());
        assert!(LightPollutionReading::new(coordinates, f64::NAN).is_err());
    }
}
