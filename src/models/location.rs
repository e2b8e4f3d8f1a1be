//! Coordinates model for geographic positions

use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};

use crate::{Result, StarrySpotError};

/// Validated latitude/longitude pair in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees, within [-90, 90]
    pub latitude: f64,
    /// Longitude in decimal degrees, within [-180, 180]
    pub longitude: f64,
}

impl Coordinates {
    /// Create coordinates, rejecting non-finite or out-of-range values
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        check_range("latitude", latitude, 90.0)?;
        check_range("longitude", longitude, 180.0)?;
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Great-circle distance to another point in kilometers
    #[must_use]
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let from = HaversineLocation {
            latitude: self.latitude,
            longitude: self.longitude,
        };
        let to = HaversineLocation {
            latitude: other.latitude,
            longitude: other.longitude,
        };
        distance(from, to, Units::Kilometers)
    }
}

fn check_range(field: &str, value: f64, bound: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(StarrySpotError::invalid_input(format!(
            "{field} must be a finite number"
        )));
    }
    if value < -bound || value > bound {
        return Err(StarrySpotError::invalid_input(format!(
            "{field} {value} is outside [-{bound}, {bound}]"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_out_of_range_latitude() {
        let err = Coordinates::new(91.0, 0.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Schema validation failed for input: latitude 91 is outside [-90, 90]"
        );
    }

    #[test]
    fn test_non_finite_longitude() {
        let err = Coordinates::new(0.0, f64::NAN).unwrap_err();
        assert!(err.to_string().contains("longitude must be a finite number"));
    }

    #[test]
    fn test_distance_km() {
        let los_angeles = Coordinates::new(34.0, -118.0).unwrap();
        let griffith = Coordinates::new(34.12, -118.3).unwrap();
        let km = los_angeles.distance_km(&griffith);
        assert!(km > 25.0 && km < 35.0, "unexpected distance {km}");
        assert_eq!(los_angeles.distance_km(&los_angeles), 0.0);
    }

    #[test]
    fn test_format_coordinates() {
        let coordinates = Coordinates::new(46.818_234, 8.227_456).unwrap();
        assert_eq!(coordinates.format_coordinates(), "46.8182, 8.2275");
    }
}
