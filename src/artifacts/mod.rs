//! Model artifacts: the fitted scalers and regressor, loaded once at startup.

pub mod regressor;
pub mod scaler;

pub use regressor::{LinearRegressor, OnnxRegressor, Regressor};
pub use scaler::Scaler;

use crate::config::ModelsConfig;
use crate::error::{ArtifactError, PipelineFailure};
use crate::schema::FeatureSet;
use ndarray::{Array1, ArrayView1};
use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Input scaler, output scaler and regressor. Immutable once built.
pub struct ArtifactBundle {
    x_scaler: Scaler,
    y_scaler: Scaler,
    model: Box<dyn Regressor>,
}

impl std::fmt::Debug for ArtifactBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactBundle")
            .field("x_scaler", &self.x_scaler)
            .field("y_scaler", &self.y_scaler)
            .field("model", &self.model_kind())
            .finish()
    }
}

impl ArtifactBundle {
    pub fn new(x_scaler: Scaler, y_scaler: Scaler, model: Box<dyn Regressor>) -> Self {
        Self {
            x_scaler,
            y_scaler,
            model,
        }
    }

    /// Load the three artifacts named in `config` and check they fit `feature_set`.
    pub fn load(config: &ModelsConfig, feature_set: FeatureSet) -> Result<Self, ArtifactError> {
        let width = feature_set.width();

        let x_path = config.x_scaler_path();
        let x_scaler: Scaler = read_json(&x_path)?;
        check_scaler(&x_path, &x_scaler, width)?;

        let y_path = config.y_scaler_path();
        let y_scaler: Scaler = read_json(&y_path)?;
        check_scaler(&y_path, &y_scaler, 1)?;

        let model = load_regressor(&config.model_path(), width)?;

        Ok(Self::new(x_scaler, y_scaler, model))
    }

    /// Like [`ArtifactBundle::load`], but logs the failure and returns `None`
    /// so the service can keep running in degraded mode.
    pub fn load_or_degrade(config: &ModelsConfig, feature_set: FeatureSet) -> Option<Self> {
        match Self::load(config, feature_set) {
            Ok(bundle) => {
                info!(
                    dir = %config.dir.display(),
                    model = bundle.model_kind(),
                    features = feature_set.width(),
                    "Models loaded successfully"
                );
                Some(bundle)
            }
            Err(e) => {
                error!(
                    dir = %config.dir.display(),
                    error = %e,
                    "Error loading models, serving in degraded mode"
                );
                None
            }
        }
    }

    pub fn model_kind(&self) -> &'static str {
        self.model.kind()
    }

    pub fn transform_input(&self, features: ArrayView1<f64>) -> Result<Array1<f64>, PipelineFailure> {
        self.x_scaler.transform(features)
    }

    pub fn predict(&self, scaled: ArrayView1<f64>) -> Result<f64, PipelineFailure> {
        self.model.predict(scaled)
    }

    pub fn transform_output(&self, scaled: f64) -> Result<f64, PipelineFailure> {
        let out = self
            .y_scaler
            .inverse_transform(Array1::from(vec![scaled]).view())?;
        out.first().copied().ok_or(PipelineFailure::EmptyOutput)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = fs::read(path).map_err(|e| io_error(path, e))?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn io_error(path: &Path, source: io::Error) -> ArtifactError {
    if source.kind() == io::ErrorKind::NotFound {
        ArtifactError::Missing {
            path: path.to_path_buf(),
        }
    } else {
        ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn check_scaler(path: &Path, scaler: &Scaler, width: usize) -> Result<(), ArtifactError> {
    let incompatible = |reason: String| ArtifactError::Incompatible {
        path: path.to_path_buf(),
        reason,
    };
    scaler.check().map_err(incompatible)?;
    if scaler.width() != width {
        return Err(incompatible(format!(
            "scaler has {} columns, expected {}",
            scaler.width(),
            width
        )));
    }
    Ok(())
}

fn load_regressor(path: &Path, width: usize) -> Result<Box<dyn Regressor>, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::Missing {
            path: path.to_path_buf(),
        });
    }

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let model: Box<dyn Regressor> = match extension {
        "onnx" => Box::new(OnnxRegressor::load(path, width)?),
        "json" => Box::new(read_json::<LinearRegressor>(path)?),
        _ => {
            return Err(ArtifactError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    if model.width() != width {
        return Err(ArtifactError::Incompatible {
            path: path.to_path_buf(),
            reason: format!("model takes {} features, expected {}", model.width(), width),
        });
    }
    Ok(model)
}

/// Where the artifacts were read from, for diagnostics.
pub fn artifact_paths(config: &ModelsConfig) -> [PathBuf; 3] {
    [
        config.model_path(),
        config.x_scaler_path(),
        config.y_scaler_path(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, value: serde_json::Value) {
        fs::write(dir.path().join(name), value.to_string()).unwrap();
    }

    fn linear_config(dir: &TempDir) -> ModelsConfig {
        ModelsConfig {
            dir: dir.path().to_path_buf(),
            model_file: "model.json".to_string(),
            x_scaler_file: "x.json".to_string(),
            y_scaler_file: "y.json".to_string(),
        }
    }

    fn write_year_artifacts(dir: &TempDir) {
        write(dir, "x.json", json!({"kind": "standard", "mean": [2012.0], "scale": [8.0]}));
        write(dir, "y.json", json!({"kind": "standard", "mean": [450.0], "scale": [50.0]}));
        write(dir, "model.json", json!({"coefficients": [1.0], "intercept": 0.0}));
    }

    #[test]
    fn test_load_linear_bundle() {
        let dir = tempfile::tempdir().unwrap();
        write_year_artifacts(&dir);

        let bundle = ArtifactBundle::load(&linear_config(&dir), FeatureSet::Year).unwrap();
        assert_eq!(bundle.model_kind(), "linear");

        let scaled = bundle.transform_input(array![2028.0].view()).unwrap();
        assert_eq!(scaled, array![2.0]);
        let raw = bundle.predict(scaled.view()).unwrap();
        assert_eq!(bundle.transform_output(raw).unwrap(), 550.0);
    }

    #[test]
    fn test_load_onnx_bundle_through_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        write_year_artifacts(&dir);
        regressor::fixtures::write_linear_onnx(&dir.path().join("model.onnx"), &[1.0], 0.0);
        let config = ModelsConfig {
            model_file: "model.onnx".to_string(),
            ..linear_config(&dir)
        };

        let bundle = ArtifactBundle::load(&config, FeatureSet::Year).unwrap();
        assert_eq!(bundle.model_kind(), "onnx");

        let input = FeatureSet::Year.validate(&json!({ "year": 2028 })).unwrap();
        let gdp = crate::pipeline::predict(&bundle, &input).unwrap();
        assert!((gdp - 550.0).abs() < 1e-3, "gdp = {gdp}");
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArtifactBundle::load(&linear_config(&dir), FeatureSet::Year).unwrap_err();
        assert!(matches!(err, ArtifactError::Missing { .. }));
        assert!(ArtifactBundle::load_or_degrade(&linear_config(&dir), FeatureSet::Year).is_none());
    }

    #[test]
    fn test_corrupt_scaler() {
        let dir = tempfile::tempdir().unwrap();
        write_year_artifacts(&dir);
        fs::write(dir.path().join("y.json"), b"\x80\x04pickle").unwrap();

        let err = ArtifactBundle::load(&linear_config(&dir), FeatureSet::Year).unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt { .. }));
    }

    #[test]
    fn test_unsupported_model_format() {
        let dir = tempfile::tempdir().unwrap();
        write_year_artifacts(&dir);
        fs::write(dir.path().join("model.pkl"), b"\x80\x04").unwrap();
        let config = ModelsConfig {
            model_file: "model.pkl".to_string(),
            ..linear_config(&dir)
        };

        let err = ArtifactBundle::load(&config, FeatureSet::Year).unwrap_err();
        assert!(matches!(err, ArtifactError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_wrong_feature_width() {
        let dir = tempfile::tempdir().unwrap();
        write_year_artifacts(&dir);

        // year-only artifacts cannot serve the five-indicator schema
        let err = ArtifactBundle::load(&linear_config(&dir), FeatureSet::Indicators).unwrap_err();
        assert!(matches!(err, ArtifactError::Incompatible { .. }));
    }

    #[test]
    fn test_swapped_scalers_detected() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir,
            "x.json",
            json!({"kind": "standard", "mean": [450.0], "scale": [50.0]}),
        );
        write(
            &dir,
            "y.json",
            json!({"kind": "standard", "mean": [2012.0, 2.5, 78.0, 55.0, 70.0], "scale": [8.0, 0.3, 1.0, 5.0, 20.0]}),
        );
        write(
            &dir,
            "model.json",
            json!({"coefficients": [0.5, 0.1, -0.1, 0.2, 0.3], "intercept": 0.0}),
        );

        let err = ArtifactBundle::load(&linear_config(&dir), FeatureSet::Indicators).unwrap_err();
        match err {
            ArtifactError::Incompatible { path, .. } => assert!(path.ends_with("x.json")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_scaler_pairing_magnitude() {
        let dir = tempfile::tempdir().unwrap();
        write_year_artifacts(&dir);
        let bundle = ArtifactBundle::load(&linear_config(&dir), FeatureSet::Year).unwrap();

        // the output scaler maps back into GDP units, not year units
        let scaled = bundle.transform_input(array![2030.0].view()).unwrap();
        let gdp = bundle.transform_output(scaled[0]).unwrap();
        assert!(gdp > 100.0 && gdp < 1000.0, "gdp {gdp} is not GDP-scale");
        assert!((gdp - 2030.0).abs() > 1000.0);
    }

    #[test]
    fn test_artifact_paths() {
        let dir = tempfile::tempdir().unwrap();
        let paths = artifact_paths(&linear_config(&dir));
        assert!(paths[0].ends_with("model.json"));
        assert!(paths[1].ends_with("x.json"));
        assert!(paths[2].ends_with("y.json"));
    }
}
