use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, instrument};

use super::{LightPollutionProvider, bortle_level_from_artificial_brightness};
use crate::config::LightPollutionConfig;
use crate::models::{Coordinates, LightPollutionReading};
use crate::{Result, StarrySpotError};

const SERVICE: &str = "light pollution";

/// Point queries against the lightpollutionmap.info raster service.
///
/// The World Atlas layers answer with the artificial sky brightness in mcd/m2
/// as a bare number.
#[derive(Debug, Clone)]
pub struct LightPollutionMapProvider {
    client: Client,
    base_url: String,
    api_key: String,
    layer: String,
}

impl LightPollutionMapProvider {
    pub fn new(config: &LightPollutionConfig) -> anyhow::Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            StarrySpotError::config("lightpollutionmap provider requires light_pollution.api_key")
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("StarrySpot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StarrySpotError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            layer: config.layer.clone(),
        })
    }
}

#[async_trait]
impl LightPollutionProvider for LightPollutionMapProvider {
    #[instrument(skip(self), fields(lat = coordinates.latitude, lon = coordinates.longitude, layer = %self.layer))]
    async fn get_light_pollution_data(
        &self,
        coordinates: Coordinates,
    ) -> Result<LightPollutionReading> {
        let url = format!("{}/QueryRaster/", self.base_url);
        // the raster service expects lon,lat
        let point = format!("{},{}", coordinates.longitude, coordinates.latitude);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("ql", self.layer.as_str()),
                ("qt", "point"),
                ("qd", point.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| StarrySpotError::service(SERVICE, format!("Raster query failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            StarrySpotError::service(SERVICE, format!("Failed to read raster response: {e}"))
        })?;

        match status.as_u16() {
            200..=299 => {}
            401 | 403 => {
                return Err(StarrySpotError::service(
                    SERVICE,
                    "Raster service rejected the API key",
                ));
            }
            _ => {
                return Err(StarrySpotError::service(
                    SERVICE,
                    format!("Raster service returned {status}"),
                ));
            }
        }

        let brightness: f64 = body.trim().parse().map_err(|_| {
            StarrySpotError::service(SERVICE, format!("Unexpected raster value '{}'", body.trim()))
        })?;
        if !brightness.is_finite() || brightness < 0.0 {
            return Err(StarrySpotError::service(
                SERVICE,
                format!("Artificial brightness {brightness} is not usable"),
            ));
        }

        let level = bortle_level_from_artificial_brightness(brightness);
        info!(
            artificial_brightness_mcd = brightness,
            level, "Retrieved light pollution level"
        );

        LightPollutionReading::new(coordinates, level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn provider_for(server: &MockServer) -> LightPollutionMapProvider {
        let config = LightPollutionConfig {
            base_url: server.base_url(),
            api_key: Some("test-key-123".to_string()),
            ..LightPollutionConfig::default()
        };
        LightPollutionMapProvider::new(&config).unwrap()
    }

    #[test]
    fn test_requires_api_key() {
        let config = LightPollutionConfig::default();
        assert!(LightPollutionMapProvider::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_converts_brightness_to_level() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/QueryRaster/")
                    .query_param("ql", "wa_2015")
                    .query_param("qt", "point")
                    .query_param("qd", "-100,40")
                    .query_param("key", "test-key-123");
                then.status(200).body("0.3\n");
            })
            .await;

        let reading = provider_for(&server)
            .get_light_pollution_data(Coordinates::new(40.0, -100.0).unwrap())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(reading.latitude, 40.0);
        assert_eq!(reading.longitude, -100.0);
        assert!(reading.light_pollution_level > 4.0 && reading.light_pollution_level < 5.0);
    }

    #[tokio::test]
    async fn test_non_numeric_body_is_service_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/QueryRaster/");
                then.status(200).body("Invalid key");
            })
            .await;

        let err = provider_for(&server)
            .get_light_pollution_data(Coordinates::new(0.0, 0.0).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StarrySpotError::Service {
                service: "light pollution",
                ..
            }
        ));
        assert!(err.to_string().contains("Invalid key"));
    }

    #[tokio::test]
    async fn test_rejected_key_is_service_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/QueryRaster/");
                then.status(403);
            })
            .await;

        let err = provider_for(&server)
            .get_light_pollution_data(Coordinates::new(0.0, 0.0).unwrap())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("rejected the API key"));
    }
}
