//! Light pollution lookup
//!
//! Levels are expressed on a continuous Bortle-like scale from 1.0 (pristine dark
//! sky) to 9.0 (inner-city sky). Live providers measure artificial sky brightness and
//! convert it with [`bortle_level_from_artificial_brightness`].

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::{LightPollutionConfig, LightPollutionSource};
use crate::models::{Coordinates, LightPollutionReading};
use crate::Result;

pub mod lightpollutionmap;

pub use lightpollutionmap::LightPollutionMapProvider;

/// Natural sky background in mcd/m2, added to the artificial component.
const NATURAL_SKY_BRIGHTNESS_MCD: f64 = 0.171_168;

/// Lower sky-quality bound (mag/arcsec2) of Bortle classes 1 through 8.
const BORTLE_SQM_FLOORS: [f64; 8] = [21.99, 21.89, 21.69, 20.49, 19.50, 18.94, 18.38, 17.80];

#[async_trait]
pub trait LightPollutionProvider: Send + Sync + Debug {
    async fn get_light_pollution_data(
        &self,
        coordinates: Coordinates,
    ) -> Result<LightPollutionReading>;
}

#[derive(Debug, Clone, Copy)]
pub struct StubLightPollutionProvider {
    level: f64,
}

impl StubLightPollutionProvider {
    #[must_use]
    pub fn new(level: f64) -> Self {
        Self { level }
    }
}

impl Default for StubLightPollutionProvider {
    fn default() -> Self {
        Self { level: 3.5 }
    }
}

#[async_trait]
impl LightPollutionProvider for StubLightPollutionProvider {
    async fn get_light_pollution_data(
        &self,
        coordinates: Coordinates,
    ) -> Result<LightPollutionReading> {
        debug!(
            "Serving stub light pollution for {}",
            coordinates.format_coordinates()
        );
        LightPollutionReading::new(coordinates, self.level)
    }
}

/// Sky quality in mag/arcsec2 for a given artificial brightness in mcd/m2
#[must_use]
pub fn sky_quality_from_artificial_brightness(artificial_mcd: f64) -> f64 {
    let total_cd = (artificial_mcd.max(0.0) + NATURAL_SKY_BRIGHTNESS_MCD) / 1000.0;
    -2.5 * (total_cd / 108_000.0).log10()
}

/// Continuous Bortle level for a sky quality reading.
///
/// Class 1 skies map to 1.0 and class 9 skies to 9.0; in between the level
/// moves linearly through each class band.
#[must_use]
pub fn bortle_level_from_sky_quality(sqm: f64) -> f64 {
    if sqm >= BORTLE_SQM_FLOORS[0] {
        return 1.0;
    }
    for (idx, window) in BORTLE_SQM_FLOORS.windows(2).enumerate() {
        let (upper, lower) = (window[0], window[1]);
        if sqm >= lower {
            let class = (idx + 2) as f64;
            return class + (upper - sqm) / (upper - lower);
        }
    }
    9.0
}

#[must_use]
pub fn bortle_level_from_artificial_brightness(artificial_mcd: f64) -> f64 {
    bortle_level_from_sky_quality(sky_quality_from_artificial_brightness(artificial_mcd))
}

/// Construct the configured light pollution provider
pub fn provider_from_config(
    config: &LightPollutionConfig,
) -> anyhow::Result<Arc<dyn LightPollutionProvider>> {
    let provider: Arc<dyn LightPollutionProvider> = match config.provider {
        LightPollutionSource::Stub => Arc::new(StubLightPollutionProvider::default()),
        LightPollutionSource::LightPollutionMap => {
            Arc::new(LightPollutionMapProvider::new(config)?)
        }
    };
    Ok(provider)
}
