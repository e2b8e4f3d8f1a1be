//! Instruction template and the recommendation prompt built on it

use std::error::Error as _;
use std::sync::Arc;

use serde_json::Value;
use tera::{Context, Tera};
use tracing::{debug, instrument, warn};

use super::{GenerationRequest, InferenceEngine};
use crate::context::{PromptContext, TEMPLATE_FIELDS};
use crate::models::recommendation::{INPUT_SCHEMA_NAME, OUTPUT_SCHEMA_NAME};
use crate::models::{RecommendationRequest, RecommendationResult};
use crate::{Result, StarrySpotError};

pub const PROMPT_NAME: &str = "recommendOptimalViewingLocationsPrompt";

/// Built-in instruction. Criteria are listed in priority order.
pub const DEFAULT_INSTRUCTION: &str = "\
Based on the user's current location and real-time weather conditions and light pollution data, recommend an optimal star-gazing location near the user.

User's Location: Latitude: {{latitude}}, Longitude: {{longitude}}

Weather Conditions: Cloud cover: {{cloudCover}}%, Visibility: {{visibility}} miles

Light Pollution Level: {{lightPollutionLevel}} (Bortle scale, 1 = pristine dark sky, 9 = inner-city sky)

Consider these factors when recommending a location, in this order of priority:
1. Minimal cloud cover.
2. Good visibility.
3. Low light pollution.

Provide a detailed reason for your recommendation that explicitly references the cloud cover, the visibility and the light pollution level. Give the coordinates of the recommended location itself, not the user's coordinates.
";

/// Instruction text with `{{name}}` placeholders, rendered through tera
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
    tera: Tera,
}

impl PromptTemplate {
    /// Parse a template; every known placeholder must appear and no other may
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let mut tera = Tera::default();
        tera.add_raw_template(PROMPT_NAME, &text).map_err(|e| {
            StarrySpotError::config(format!("Invalid template: {}", error_chain(&e)))
        })?;
        let template = Self { text, tera };

        // each field gets a unique marker so a missing one shows up as an absent marker
        let mut context = Context::new();
        for field in TEMPLATE_FIELDS {
            context.insert(field, &marker(field));
        }
        let rendered = template.tera.render(PROMPT_NAME, &context).map_err(|e| {
            StarrySpotError::config(format!(
                "Template references an unknown placeholder ({}). Known placeholders: {}",
                error_chain(&e),
                TEMPLATE_FIELDS.join(", ")
            ))
        })?;

        if let Some(missing) = TEMPLATE_FIELDS
            .iter()
            .find(|field| !rendered.contains(&marker(field)))
        {
            return Err(StarrySpotError::config(format!(
                "Template is missing placeholder {{{{{missing}}}}}"
            )));
        }

        Ok(template)
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn render(&self, context: &PromptContext) -> Result<String> {
        let mut values = Context::new();
        for field in TEMPLATE_FIELDS {
            if let Some(value) = context.field(field) {
                // plain f64 formatting, so 40.0 renders as "40"
                values.insert(field, &value.to_string());
            }
        }
        self.tera.render(PROMPT_NAME, &values).map_err(|e| {
            StarrySpotError::inference(format!(
                "Failed to render instruction: {}",
                error_chain(&e)
            ))
        })
    }
}

impl PartialEq for PromptTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        let mut tera = Tera::default();
        // the built-in instruction always parses
        let _ = tera.add_raw_template(PROMPT_NAME, DEFAULT_INSTRUCTION);
        Self {
            text: DEFAULT_INSTRUCTION.to_string(),
            tera,
        }
    }
}

fn marker(field: &str) -> String {
    format!("<<{field}>>")
}

/// tera keeps the useful detail (variable name, parse position) in the source chain
fn error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// The registered recommendation prompt: engine, template and both schemas.
#[derive(Debug, Clone)]
pub struct RecommendationPrompt {
    engine: Arc<dyn InferenceEngine>,
    template: PromptTemplate,
    input_schema: Value,
    output_schema: Value,
}

impl RecommendationPrompt {
    pub fn new(engine: Arc<dyn InferenceEngine>, template: PromptTemplate) -> Self {
        Self {
            engine,
            template,
            input_schema: RecommendationRequest::json_schema(),
            output_schema: RecommendationResult::json_schema(),
        }
    }

    pub fn with_default_template(engine: Arc<dyn InferenceEngine>) -> Self {
        Self::new(engine, PromptTemplate::default())
    }

    #[must_use]
    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    #[must_use]
    pub fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    #[must_use]
    pub fn output_schema(&self) -> &Value {
        &self.output_schema
    }

    /// Run the prompt. `Ok(None)` when the engine declined to answer.
    #[instrument(name = "recommendation_prompt", skip_all)]
    pub(crate) async fn generate(
        &self,
        input: &RecommendationRequest,
        context: &PromptContext,
    ) -> Result<Option<RecommendationResult>> {
        input.validate()?;

        let request = GenerationRequest {
            prompt_name: PROMPT_NAME.to_string(),
            instruction: self.template.render(context)?,
            input_schema_name: INPUT_SCHEMA_NAME.to_string(),
            input_schema: self.input_schema.clone(),
            output_schema_name: OUTPUT_SCHEMA_NAME.to_string(),
            output_schema: self.output_schema.clone(),
        };
        debug!(instruction = %request.instruction, "Submitting instruction");

        let Some(value) = self.engine.generate(&request).await? else {
            warn!("Inference engine returned no output");
            return Ok(None);
        };

        let result: RecommendationResult = serde_json::from_value(value).map_err(|e| {
            StarrySpotError::inference(format!(
                "Generated output does not match {OUTPUT_SCHEMA_NAME}: {e}"
            ))
        })?;
        result.validate()?;

        Ok(Some(result))
    }
}
