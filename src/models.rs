use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StatusResponse {
    pub message: String,
    pub models_loaded: bool,
    pub version: String,
    pub feature_set: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionResponse {
    pub year: i64,
    pub predicted_gdp: f64,
    /// Validated request, echoed for the multi-indicator schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_data: Option<Value>,
    /// Present only when the value came from the fallback heuristic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
