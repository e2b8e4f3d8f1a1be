//! The recommendation flow
//!
//! Validates the request, runs the weather and light pollution lookups side by side,
//! merges both readings into the prompt context and asks the inference engine for a
//! spot. Any failure ends the run; there are no partial results.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::try_join;
use tracing::{debug, info, instrument, warn};

use crate::config::StarrySpotConfig;
use crate::context::build_prompt_context;
use crate::inference::{self, PromptTemplate, RecommendationPrompt};
use crate::light_pollution::{self, LightPollutionProvider};
use crate::models::{RecommendationRequest, RecommendationResult};
use crate::weather::{self, WeatherProvider};
use crate::{Result, StarrySpotError};

/// Upper bounds for each suspension point of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowTimeouts {
    pub weather: Duration,
    pub light_pollution: Duration,
    pub inference: Duration,
}

impl Default for FlowTimeouts {
    fn default() -> Self {
        Self {
            weather: Duration::from_secs(30),
            light_pollution: Duration::from_secs(30),
            inference: Duration::from_secs(60),
        }
    }
}

impl FlowTimeouts {
    fn from_config(config: &StarrySpotConfig) -> Self {
        Self {
            weather: Duration::from_secs(config.weather.timeout_seconds.into()),
            light_pollution: Duration::from_secs(config.light_pollution.timeout_seconds.into()),
            inference: Duration::from_secs(config.inference.timeout_seconds.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecommendationFlow {
    weather: Arc<dyn WeatherProvider>,
    light_pollution: Arc<dyn LightPollutionProvider>,
    prompt: RecommendationPrompt,
    timeouts: FlowTimeouts,
}

impl RecommendationFlow {
    pub fn new(
        weather: Arc<dyn WeatherProvider>,
        light_pollution: Arc<dyn LightPollutionProvider>,
        prompt: RecommendationPrompt,
    ) -> Self {
        Self {
            weather,
            light_pollution,
            prompt,
            timeouts: FlowTimeouts::default(),
        }
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeouts: FlowTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Wire up the configured providers and engine
    pub fn from_config(config: &StarrySpotConfig) -> anyhow::Result<Self> {
        let weather = weather::provider_from_config(&config.weather)?;
        let light_pollution = light_pollution::provider_from_config(&config.light_pollution)?;
        let engine = inference::engine_from_config(&config.inference)?;

        let template = match &config.inference.prompt_template {
            Some(text) => PromptTemplate::new(text.clone())?,
            None => PromptTemplate::default(),
        };

        Ok(
            Self::new(weather, light_pollution, RecommendationPrompt::new(engine, template))
                .with_timeouts(FlowTimeouts::from_config(config)),
        )
    }

    #[must_use]
    pub fn prompt(&self) -> &RecommendationPrompt {
        &self.prompt
    }

    #[must_use]
    pub fn timeouts(&self) -> FlowTimeouts {
        self.timeouts
    }

    /// Recommend a star-gazing spot near the requested position
    #[instrument(skip(self), fields(lat = request.latitude, lon = request.longitude))]
    pub async fn recommend(&self, request: RecommendationRequest) -> Result<RecommendationResult> {
        let start_time = Instant::now();
        let coordinates = request.coordinates()?;

        let weather = bounded(
            self.timeouts.weather,
            self.weather.get_weather(coordinates),
            || timed_out("weather", self.timeouts.weather),
        );
        let light_pollution = bounded(
            self.timeouts.light_pollution,
            self.light_pollution.get_light_pollution_data(coordinates),
            || timed_out("light pollution", self.timeouts.light_pollution),
        );

        let (weather, light_pollution) = try_join(weather, light_pollution)
            .await
            .inspect_err(|e| warn!("Lookup failed: {e}"))?;
        debug!(
            cloud_cover = weather.cloud_cover,
            visibility = weather.visibility,
            light_pollution_level = light_pollution.light_pollution_level,
            "Lookups complete"
        );

        let context = build_prompt_context(&request, &weather, &light_pollution);

        let limit = self.timeouts.inference;
        let generated = bounded(limit, self.prompt.generate(&request, &context), || {
            StarrySpotError::inference(format!(
                "Inference timed out after {}s",
                limit.as_secs_f64()
            ))
        })
        .await?;

        let result = generated
            .ok_or_else(|| StarrySpotError::inference("Inference engine produced no output"))?;

        info!(
            location = %result.location_name,
            "Recommended {:.4}, {:.4} in {:.3}s",
            result.location_lat,
            result.location_long,
            start_time.elapsed().as_secs_f64()
        );
        Ok(result)
    }
}

async fn bounded<T>(
    limit: Duration,
    future: impl Future<Output = Result<T>>,
    on_timeout: impl FnOnce() -> StarrySpotError,
) -> Result<T> {
    tokio::time::timeout(limit, future)
        .await
        .unwrap_or_else(|_| Err(on_timeout()))
}

fn timed_out(service: &'static str, limit: Duration) -> StarrySpotError {
    StarrySpotError::service(
        service,
        format!("Lookup timed out after {}s", limit.as_secs_f64()),
    )
}
