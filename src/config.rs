//! Configuration management for the GDP predictor

use crate::policy::FallbackPolicy;
use crate::schema::FeatureSet;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file used when `GDP_PREDICTOR_CONFIG` is not set. Optional.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub models: ModelsConfig,
    pub prediction: PredictionConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Actix worker threads; defaults to the number of physical cores
    pub workers: Option<usize>,
}

/// Artifact locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Directory holding the artifacts, relative to the working directory
    pub dir: PathBuf,
    /// Regressor file; `.onnx` or `.json`
    pub model_file: String,
    pub x_scaler_file: String,
    pub y_scaler_file: String,
}

/// Request schema and degraded-mode behaviour
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub feature_set: FeatureSet,
    pub fallback_policy: FallbackPolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10000,
            workers: None,
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("models"),
            model_file: "nigeria_gdp_model.onnx".to_string(),
            x_scaler_file: "nigeria_gdp_X_scaler.json".to_string(),
            y_scaler_file: "nigeria_gdp_y_scaler.json".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl ModelsConfig {
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.model_file)
    }

    pub fn x_scaler_path(&self) -> PathBuf {
        self.dir.join(&self.x_scaler_file)
    }

    pub fn y_scaler_path(&self) -> PathBuf {
        self.dir.join(&self.y_scaler_file)
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

impl AppConfig {
    /// Load configuration from `GDP_PREDICTOR_CONFIG` (or the default path)
    /// layered under `GDP_PREDICTOR__*` environment variables
    pub fn load() -> Result<Self> {
        let path = std::env::var("GDP_PREDICTOR_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path. A missing file is not an error.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix("GDP_PREDICTOR").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
