//! Scripted providers and engine shared by the integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use starryspot::{
    Coordinates, GenerationRequest, InferenceEngine, LightPollutionProvider, LightPollutionReading,
    RecommendationFlow, RecommendationPrompt, StarrySpotError, WeatherProvider, WeatherReading,
};

#[derive(Debug, Default)]
pub struct FakeWeather {
    fail: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FakeWeather {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn get_weather(&self, _coordinates: Coordinates) -> starryspot::Result<WeatherReading> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(StarrySpotError::service("weather", "provider unreachable"));
        }
        WeatherReading::new(20.0, 10.0)
    }
}

#[derive(Debug, Default)]
pub struct FakeLightPollution {
    fail: bool,
    calls: AtomicUsize,
}

impl FakeLightPollution {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LightPollutionProvider for FakeLightPollution {
    async fn get_light_pollution_data(
        &self,
        coordinates: Coordinates,
    ) -> starryspot::Result<LightPollutionReading> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(StarrySpotError::service(
                "light pollution",
                "provider unreachable",
            ));
        }
        LightPollutionReading::new(coordinates, 3.5)
    }
}

/// Answers every request with the same scripted value
#[derive(Debug)]
pub struct ScriptedEngine {
    output: std::result::Result<Option<Value>, String>,
    calls: AtomicUsize,
    last_instruction: Mutex<Option<String>>,
}

impl ScriptedEngine {
    pub fn returning(output: Option<Value>) -> Arc<Self> {
        Arc::new(Self {
            output: Ok(output),
            calls: AtomicUsize::new(0),
            last_instruction: Mutex::new(None),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            output: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            last_instruction: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_instruction(&self) -> Option<String> {
        self.last_instruction.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceEngine for ScriptedEngine {
    async fn generate(&self, request: &GenerationRequest) -> starryspot::Result<Option<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_instruction.lock().unwrap() = Some(request.instruction.clone());
        self.output
            .clone()
            .map_err(StarrySpotError::inference)
    }
}

pub fn griffith_observatory() -> Value {
    json!({
        "locationName": "Griffith Observatory",
        "locationLat": 34.1184,
        "locationLong": -118.3004,
        "reason": "Clear skies and low light pollution"
    })
}

pub fn flow_with(
    weather: Arc<FakeWeather>,
    light_pollution: Arc<FakeLightPollution>,
    engine: Arc<ScriptedEngine>,
) -> RecommendationFlow {
    RecommendationFlow::new(
        weather,
        light_pollution,
        RecommendationPrompt::with_default_template(engine),
    )
}
