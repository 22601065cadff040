use crate::artifacts::ArtifactBundle;
use crate::error::{ApiError, Violation};
use crate::models::{PredictionResponse, StatusResponse};
use crate::pipeline;
use crate::policy::{Degraded, FallbackPolicy};
use crate::schema::FeatureSet;
use actix_web::{web, HttpResponse, Result};
use serde_json::Value;
use tracing::{error, info, info_span, warn};
use uuid::Uuid;

/// Everything a handler needs, built once in `main` and shared read-only.
#[derive(Debug)]
pub struct AppState {
    pub bundle: Option<ArtifactBundle>,
    pub feature_set: FeatureSet,
    pub policy: FallbackPolicy,
}

impl AppState {
    pub fn new(
        bundle: Option<ArtifactBundle>,
        feature_set: FeatureSet,
        policy: FallbackPolicy,
    ) -> Self {
        Self {
            bundle,
            feature_set,
            policy,
        }
    }

    pub fn models_loaded(&self) -> bool {
        self.bundle.is_some()
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(root)))
        .service(web::resource("/predict").route(web::post().to(predict)));
}

/// Malformed or non-JSON bodies are a client error like any other violation.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::Validation(vec![Violation::new("body", err.to_string())]).into()
    })
}

pub async fn root(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(StatusResponse {
        message: "Nigeria GDP Prediction API".to_string(),
        models_loaded: state.models_loaded(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        feature_set: state.feature_set.to_string(),
    })
}

pub async fn predict(
    state: web::Data<AppState>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("predict", %request_id);
    let response = span.in_scope(|| serve_prediction(&state, &body))?;
    Ok(HttpResponse::Ok().json(response))
}

/// Validate, run the pipeline and apply the fallback policy. Synchronous.
fn serve_prediction(state: &AppState, body: &Value) -> Result<PredictionResponse, ApiError> {
    let input = state.feature_set.validate(body).map_err(|violations| {
        info!(violations = violations.len(), "Rejected prediction request");
        ApiError::Validation(violations)
    })?;
    let year = input.year();

    let outcome = match &state.bundle {
        Some(bundle) => pipeline::predict(bundle, &input).map_err(Degraded::Pipeline),
        None => Err(Degraded::ModelsUnavailable),
    };
    if let Err(cause) = &outcome {
        match state.policy {
            FallbackPolicy::DegradeToHeuristic => {
                warn!(year, cause = %cause, "Using fallback prediction")
            }
            FallbackPolicy::FailClosed => error!(year, cause = %cause, "Prediction failed"),
        }
    }

    let estimate = state.policy.resolve(year, outcome)?;
    info!(year, predicted_gdp = estimate.predicted_gdp, "Prediction served");

    let input_data = match state.feature_set {
        FeatureSet::Year => None,
        FeatureSet::Indicators => Some(input.to_json()),
    };

    Ok(PredictionResponse {
        year,
        predicted_gdp: estimate.predicted_gdp,
        input_data,
        note: estimate.note,
    })
}
