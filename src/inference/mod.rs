//! Schema-constrained inference
//!
//! An [`InferenceEngine`] receives a rendered instruction together with a named JSON
//! schema and answers with a JSON value shaped by that schema, or with nothing when it
//! declines. [`RecommendationPrompt`] owns the template and both schemas and turns the
//! engine's answer into a typed [`RecommendationResult`](crate::models::RecommendationResult).

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::InferenceConfig;
use crate::Result;

pub mod openai;
pub mod prompt;

pub use openai::OpenAiCompatibleEngine;
pub use prompt::{DEFAULT_INSTRUCTION, PROMPT_NAME, PromptTemplate, RecommendationPrompt};

/// One structured-output call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt_name: String,
    pub instruction: String,
    pub input_schema_name: String,
    /// Schema the rendered input was validated against
    pub input_schema: Value,
    pub output_schema_name: String,
    pub output_schema: Value,
}

#[async_trait]
pub trait InferenceEngine: Send + Sync + Debug {
    /// Generate a value for the request's output schema.
    ///
    /// `Ok(None)` means the engine produced no answer; transport and generation
    /// failures are [`StarrySpotError::Inference`](crate::StarrySpotError::Inference).
    async fn generate(&self, request: &GenerationRequest) -> Result<Option<Value>>;
}

/// Construct the configured inference engine
pub fn engine_from_config(config: &InferenceConfig) -> anyhow::Result<Arc<dyn InferenceEngine>> {
    Ok(Arc::new(OpenAiCompatibleEngine::new(config)?))
}
