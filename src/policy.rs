//! What to answer when the model cannot: degrade to a linear heuristic, or
//! fail closed with a server error. Decided once per deployment.

use crate::error::{ApiError, PipelineFailure};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const HEURISTIC_BASE_GDP: f64 = 2000.0;
pub const HEURISTIC_BASE_YEAR: i64 = 2024;
pub const HEURISTIC_SLOPE: f64 = 100.0;

/// `2000 + (year - 2024) * 100`
pub fn heuristic_gdp(year: i64) -> f64 {
    HEURISTIC_BASE_GDP + (year - HEURISTIC_BASE_YEAR) as f64 * HEURISTIC_SLOPE
}

/// Why the real pipeline produced no value.
#[derive(Debug, Clone, PartialEq)]
pub enum Degraded {
    ModelsUnavailable,
    Pipeline(PipelineFailure),
}

impl fmt::Display for Degraded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degraded::ModelsUnavailable => f.write_str("models are not loaded"),
            Degraded::Pipeline(failure) => write!(f, "{failure}"),
        }
    }
}

/// A GDP figure and, if it did not come from the model, why.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub predicted_gdp: f64,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    #[default]
    #[serde(rename = "heuristic")]
    DegradeToHeuristic,
    FailClosed,
}

impl FallbackPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackPolicy::DegradeToHeuristic => "heuristic",
            FallbackPolicy::FailClosed => "fail_closed",
        }
    }

    /// Turn a pipeline outcome into a response value under this policy.
    pub fn resolve(&self, year: i64, outcome: Result<f64, Degraded>) -> Result<Estimate, ApiError> {
        let cause = match outcome {
            Ok(predicted_gdp) => {
                return Ok(Estimate {
                    predicted_gdp,
                    note: None,
                })
            }
            Err(cause) => cause,
        };

        match self {
            FallbackPolicy::DegradeToHeuristic => Ok(Estimate {
                predicted_gdp: heuristic_gdp(year),
                note: Some(format!("Using fallback prediction due to error: {cause}")),
            }),
            FallbackPolicy::FailClosed => Err(match cause {
                Degraded::ModelsUnavailable => ApiError::ModelsUnavailable,
                Degraded::Pipeline(failure) => ApiError::Pipeline(failure),
            }),
        }
    }
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
