//! Error types for the GDP predictor.
//!
//! - [`ArtifactError`]: a model or scaler could not be loaded at startup.
//!   Never fatal; the service runs without a bundle.
//! - [`PipelineFailure`]: a numeric or shape problem while scaling or running
//!   the model for one request.
//! - [`ApiError`]: what a request handler returns. Implements
//!   [`ResponseError`] so actix renders it as a JSON body.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::json;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tract_onnx::prelude::TractError;

/// Failure to load one of the three artifacts.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("artifact not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt artifact {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to load ONNX model {}: {source}", path.display())]
    Onnx {
        path: PathBuf,
        #[source]
        source: TractError,
    },

    #[error("unsupported model format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("incompatible artifact {}: {reason}", path.display())]
    Incompatible { path: PathBuf, reason: String },
}

/// A stage of the prediction pipeline rejected its input or produced garbage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineFailure {
    #[error("{stage}: expected {expected} features, got {actual}")]
    Shape {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("model produced no output")]
    EmptyOutput,

    #[error("{stage} produced a non-finite value")]
    NonFinite { stage: &'static str },
}

/// One violated field constraint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<serde_json::Value>,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            input: None,
        }
    }

    pub fn with_input(mut self, input: serde_json::Value) -> Self {
        self.input = Some(input);
        self
    }
}

/// Errors surfaced to HTTP clients.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request validation failed ({} violation(s))", .0.len())]
    Validation(Vec<Violation>),

    #[error("models are not loaded")]
    ModelsUnavailable,

    #[error("prediction failed: {0}")]
    Pipeline(#[from] PipelineFailure),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ModelsUnavailable | ApiError::Pipeline(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Validation(violations) => json!({ "detail": violations }),
            other => json!({ "detail": other.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
