use std::sync::Arc;

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::SchemaBoundary;
use crate::flow::RecommendationFlow;
use crate::models::{Coordinates, RecommendationRequest, RecommendationResult};
use crate::{StarrySpotError, VERSION};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Coordinates> for ApiLocation {
    fn from(coordinates: Coordinates) -> Self {
        Self {
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
        }
    }
}

/// Recommendation plus what a map view needs to place both markers
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub recommendation: RecommendationResult,
    pub user_location: ApiLocation,
    pub distance_km: f64,
    pub generated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiErrorBody {
    pub error: String,
    pub kind: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub struct ApiError(StarrySpotError);

impl From<StarrySpotError> for ApiError {
    fn from(err: StarrySpotError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(StarrySpotError::invalid_input(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            StarrySpotError::SchemaValidation {
                boundary: SchemaBoundary::Input,
                ..
            } => StatusCode::UNPROCESSABLE_ENTITY,
            StarrySpotError::SchemaValidation { .. }
            | StarrySpotError::Service { .. }
            | StarrySpotError::Inference { .. } => StatusCode::BAD_GATEWAY,
            StarrySpotError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(kind = self.0.kind(), "Recommendation failed: {}", self.0);
        } else {
            warn!(kind = self.0.kind(), "Rejected request: {}", self.0);
        }

        let body = ApiErrorBody {
            error: self.0.user_message(),
            kind: self.0.kind().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(flow: Arc<RecommendationFlow>) -> Router {
    Router::new()
        .route("/recommend", post(recommend))
        .route("/health", get(health))
        .with_state(flow)
}

async fn recommend(
    State(flow): State<Arc<RecommendationFlow>>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    let Json(request) = payload?;
    let user = request.coordinates()?;

    let recommendation = flow.recommend(request).await?;
    let distance_km = recommendation.coordinates()?.distance_km(&user);

    Ok(Json(RecommendationResponse {
        recommendation,
        user_location: user.into(),
        distance_km,
        generated_at: Utc::now(),
    }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: VERSION.to_string(),
    })
}
