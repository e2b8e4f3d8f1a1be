//! Weather lookup
//!
//! A [`WeatherProvider`] turns coordinates into a [`WeatherReading`]. The flow only
//! sees the trait, so the stub and the live Open-Meteo client are interchangeable.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::{WeatherConfig, WeatherSource};
use crate::models::{Coordinates, WeatherReading};
use crate::Result;

pub mod open_meteo;

pub use open_meteo::OpenMeteoWeatherProvider;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current cloud cover and visibility at the given point
    async fn get_weather(&self, coordinates: Coordinates) -> Result<WeatherReading>;
}

/// Returns the same clear-ish sky everywhere.
#[derive(Debug, Clone, Copy)]
pub struct StubWeatherProvider {
    reading: WeatherReading,
}

impl StubWeatherProvider {
    #[must_use]
    pub fn new(reading: WeatherReading) -> Self {
        Self { reading }
    }
}

impl Default for StubWeatherProvider {
    fn default() -> Self {
        Self {
            reading: WeatherReading {
                cloud_cover: 20.0,
                visibility: 10.0,
            },
        }
    }
}

#[async_trait]
impl WeatherProvider for StubWeatherProvider {
    async fn get_weather(&self, coordinates: Coordinates) -> Result<WeatherReading> {
        debug!(
            "Serving stub weather for {}",
            coordinates.format_coordinates()
        );
        Ok(self.reading)
    }
}

/// Construct the configured weather provider
pub fn provider_from_config(config: &WeatherConfig) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let provider: Arc<dyn WeatherProvider> = match config.provider {
        WeatherSource::Stub => Arc::new(StubWeatherProvider::default()),
        WeatherSource::OpenMeteo => Arc::new(OpenMeteoWeatherProvider::new(config)?),
    };
    Ok(provider)
}
