//! Open-Meteo weather client
//!
//! Uses the keyless `/forecast` endpoint with `current=cloud_cover,visibility`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::WeatherProvider;
use crate::config::WeatherConfig;
use crate::models::{Coordinates, WeatherReading};
use crate::{Result, StarrySpotError};

const SERVICE: &str = "weather";
const METRES_PER_MILE: f64 = 1609.344;

#[derive(Debug, Clone)]
pub struct OpenMeteoWeatherProvider {
    client: Client,
    base_url: String,
}

impl OpenMeteoWeatherProvider {
    pub fn new(config: &WeatherConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("StarrySpot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StarrySpotError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<CurrentData>,
}

#[derive(Debug, Deserialize)]
struct CurrentData {
    cloud_cover: Option<f64>,
    /// Metres
    visibility: Option<f64>,
}

#[async_trait]
impl WeatherProvider for OpenMeteoWeatherProvider {
    #[instrument(skip(self), fields(lat = coordinates.latitude, lon = coordinates.longitude))]
    async fn get_weather(&self, coordinates: Coordinates) -> Result<WeatherReading> {
        let start_time = Instant::now();
        let url = format!("{}/forecast", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", coordinates.latitude.to_string()),
                ("longitude", coordinates.longitude.to_string()),
                ("current", "cloud_cover,visibility".to_string()),
            ])
            .send()
            .await
            .map_err(|e| StarrySpotError::service(SERVICE, format!("Open-Meteo request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StarrySpotError::service(
                SERVICE,
                format!("Open-Meteo returned {status}: {}", truncate_body(&body)),
            ));
        }

        let forecast: ForecastResponse = response.json().await.map_err(|e| {
            StarrySpotError::service(SERVICE, format!("Failed to parse Open-Meteo response: {e}"))
        })?;

        let current = forecast.current.ok_or_else(|| {
            StarrySpotError::service(SERVICE, "Open-Meteo response has no current conditions")
        })?;
        let cloud_cover = current.cloud_cover.ok_or_else(|| {
            StarrySpotError::service(SERVICE, "Open-Meteo response has no cloud cover")
        })?;
        let visibility_m = current.visibility.ok_or_else(|| {
            StarrySpotError::service(SERVICE, "Open-Meteo response has no visibility")
        })?;

        let reading = WeatherReading::new(cloud_cover, visibility_m / METRES_PER_MILE)?;

        let elapsed = start_time.elapsed();
        info!(
            cloud_cover = reading.cloud_cover,
            visibility_miles = reading.visibility,
            "Retrieved current weather in {:.3}s",
            elapsed.as_secs_f64()
        );
        if elapsed.as_secs() > 5 {
            warn!("Slow Open-Meteo response: {:.3}s", elapsed.as_secs_f64());
        }
        debug!("Open-Meteo raw visibility: {visibility_m} m");

        Ok(reading)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn provider_for(server: &MockServer) -> OpenMeteoWeatherProvider {
        let config = WeatherConfig {
            base_url: server.base_url(),
            ..WeatherConfig::default()
        };
        OpenMeteoWeatherProvider::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_reads_current_conditions_in_miles() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/forecast")
                    .query_param("latitude", "40")
                    .query_param("longitude", "-100")
                    .query_param("current", "cloud_cover,visibility");
                then.status(200).json_body(json!({
                    "latitude": 40.0,
                    "longitude": -100.0,
                    "current": {
                        "time": "2026-10-18T21:00",
                        "interval": 900,
                        "cloud_cover": 20,
                        "visibility": 16093.44
                    }
                }));
            })
            .await;

        let provider = provider_for(&server);
        let reading = provider
            .get_weather(Coordinates::new(40.0, -100.0).unwrap())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(reading.cloud_cover, 20.0);
        assert!((reading.visibility - 10.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_http_error_is_service_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/forecast");
                then.status(503).body("upstream unavailable");
            })
            .await;

        let err = provider_for(&server)
            .get_weather(Coordinates::new(0.0, 0.0).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, StarrySpotError::Service { service: "weather", .. }));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_missing_visibility_is_service_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/forecast");
                then.status(200)
                    .json_body(json!({ "current": { "cloud_cover": 5, "visibility": null } }));
            })
            .await;

        let err = provider_for(&server)
            .get_weather(Coordinates::new(0.0, 0.0).unwrap())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("no visibility"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_service_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/forecast");
                then.status(200).body("<html>not json</html>");
            })
            .await;

        let err = provider_for(&server)
            .get_weather(Coordinates::new(0.0, 0.0).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, StarrySpotError::Service { .. }));
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(300);
        assert_eq!(truncate_body(&long).len(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
