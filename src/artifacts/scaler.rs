//! Fitted feature scalers.

use crate::error::PipelineFailure;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// A per-column affine transform fitted offline.
///
/// Stored as JSON tagged by `kind`:
///
/// ```json
/// {"kind": "standard", "mean": [2012.0], "scale": [7.5]}
/// {"kind": "min_max", "min": [-0.5], "scale": [0.02]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// `(x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// `x * scale + min`
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

impl Scaler {
    pub fn standard(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Scaler::Standard { mean, scale }
    }

    pub fn min_max(min: Vec<f64>, scale: Vec<f64>) -> Self {
        Scaler::MinMax { min, scale }
    }

    pub fn width(&self) -> usize {
        match self {
            Scaler::Standard { scale, .. } | Scaler::MinMax { scale, .. } => scale.len(),
        }
    }

    /// Structural problems that would make every transform fail or divide by zero.
    pub fn check(&self) -> Result<(), String> {
        let (offset, scale) = self.parts();
        if scale.is_empty() {
            return Err("scaler has no columns".to_string());
        }
        if offset.len() != scale.len() {
            return Err(format!(
                "offset has {} columns but scale has {}",
                offset.len(),
                scale.len()
            ));
        }
        if let Some(bad) = scale.iter().find(|s| !s.is_finite() || **s == 0.0) {
            return Err(format!("scale entries must be finite and non-zero, got {bad}"));
        }
        if offset.iter().any(|o| !o.is_finite()) {
            return Err("offset entries must be finite".to_string());
        }
        Ok(())
    }

    pub fn transform(&self, x: ArrayView1<f64>) -> Result<Array1<f64>, PipelineFailure> {
        self.ensure_width(x.len())?;
        let out = match self {
            Scaler::Standard { mean, scale } => {
                (&x - &ArrayView1::from(mean)) / &ArrayView1::from(scale)
            }
            Scaler::MinMax { min, scale } => {
                &x * &ArrayView1::from(scale) + &ArrayView1::from(min)
            }
        };
        Ok(out)
    }

    pub fn inverse_transform(&self, x: ArrayView1<f64>) -> Result<Array1<f64>, PipelineFailure> {
        self.ensure_width(x.len())?;
        let out = match self {
            Scaler::Standard { mean, scale } => {
                &x * &ArrayView1::from(scale) + &ArrayView1::from(mean)
            }
            Scaler::MinMax { min, scale } => {
                (&x - &ArrayView1::from(min)) / &ArrayView1::from(scale)
            }
        };
        Ok(out)
    }

    fn parts(&self) -> (&[f64], &[f64]) {
        match self {
            Scaler::Standard { mean, scale } => (mean.as_slice(), scale.as_slice()),
            Scaler::MinMax { min, scale } => (min.as_slice(), scale.as_slice()),
        }
    }

    fn ensure_width(&self, actual: usize) -> Result<(), PipelineFailure> {
        if actual != self.width() {
            return Err(PipelineFailure::Shape {
                stage: "scaler",
                expected: self.width(),
                actual,
            });
        }
        Ok(())
    }
}
