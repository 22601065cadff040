//! Trained regressors: an ONNX graph run with tract, or a plain linear model
//! stored as JSON.

use crate::error::{ArtifactError, PipelineFailure};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tract_onnx::prelude::*;

/// A model mapping one scaled feature row to one scaled target value.
pub trait Regressor: Send + Sync {
    /// Short label for logs.
    fn kind(&self) -> &'static str;

    /// Number of features the model consumes.
    fn width(&self) -> usize;

    fn predict(&self, features: ArrayView1<f64>) -> Result<f64, PipelineFailure>;
}

/// `y = coefficients · x + intercept`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegressor {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }
}

impl Regressor for LinearRegressor {
    fn kind(&self) -> &'static str {
        "linear"
    }

    fn width(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: ArrayView1<f64>) -> Result<f64, PipelineFailure> {
        if features.len() != self.width() {
            return Err(PipelineFailure::Shape {
                stage: "regressor",
                expected: self.width(),
                actual: features.len(),
            });
        }
        let coefficients = Array1::from(self.coefficients.clone());
        Ok(features.dot(&coefficients) + self.intercept)
    }
}

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// An ONNX regressor (e.g. a linear or random-forest model exported with
/// skl2onnx), optimized for a single `[1, width]` float row.
pub struct OnnxRegressor {
    plan: OnnxPlan,
    width: usize,
}

impl OnnxRegressor {
    pub fn load(path: &Path, width: usize) -> Result<Self, ArtifactError> {
        let onnx_err = |source: TractError| ArtifactError::Onnx {
            path: path.to_path_buf(),
            source,
        };

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(onnx_err)?
            .with_input_fact(0, f32::fact([1, width]).into())
            .map_err(onnx_err)?
            .into_optimized()
            .map_err(onnx_err)?
            .into_runnable()
            .map_err(onnx_err)?;

        Ok(Self { plan, width })
    }
}

impl Regressor for OnnxRegressor {
    fn kind(&self) -> &'static str {
        "onnx"
    }

    fn width(&self) -> usize {
        self.width
    }

    fn predict(&self, features: ArrayView1<f64>) -> Result<f64, PipelineFailure> {
        if features.len() != self.width {
            return Err(PipelineFailure::Shape {
                stage: "regressor",
                expected: self.width,
                actual: features.len(),
            });
        }

        let row: Vec<f32> = features.iter().map(|v| *v as f32).collect();
        let tensor: Tensor = tract_ndarray::Array2::from_shape_vec((1, self.width), row)
            .map_err(|e| PipelineFailure::Inference(e.to_string()))?
            .into();

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| PipelineFailure::Inference(e.to_string()))?;

        let output = outputs.first().ok_or(PipelineFailure::EmptyOutput)?;
        let values = output
            .cast_to::<f64>()
            .map_err(|e| PipelineFailure::Inference(e.to_string()))?;
        let values = values
            .as_slice::<f64>()
            .map_err(|e| PipelineFailure::Inference(e.to_string()))?;

        values.first().copied().ok_or(PipelineFailure::EmptyOutput)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use prost::Message;
    use std::path::Path;
    use tract_onnx::pb;
    use tract_onnx::pb::tensor_shape_proto::{dimension, Dimension};

    fn float_type(dims: &[i64]) -> pb::TypeProto {
        let dim = dims
            .iter()
            .map(|d| Dimension {
                denotation: String::new(),
                value: Some(dimension::Value::DimValue(*d)),
            })
            .collect();
        pb::TypeProto {
            denotation: String::new(),
            value: Some(pb::type_proto::Value::TensorType(pb::type_proto::Tensor {
                elem_type: pb::tensor_proto::DataType::Float as i32,
                shape: Some(pb::TensorShapeProto { dim }),
            })),
        }
    }

    fn value_info(name: &str, dims: &[i64]) -> pb::ValueInfoProto {
        pb::ValueInfoProto {
            name: name.to_string(),
            r#type: Some(float_type(dims)),
            ..Default::default()
        }
    }

    fn initializer(name: &str, dims: Vec<i64>, values: Vec<f32>) -> pb::TensorProto {
        pb::TensorProto {
            name: name.to_string(),
            dims,
            data_type: pb::tensor_proto::DataType::Float as i32,
            float_data: values,
            ..Default::default()
        }
    }

    /// Write `y = x · weights + bias` as a MatMul + Add ONNX graph taking `[1, n]`.
    pub(crate) fn write_linear_onnx(path: &Path, weights: &[f32], bias: f32) {
        let width = weights.len() as i64;
        let graph = pb::GraphProto {
            name: "linear".to_string(),
            node: vec![
                pb::NodeProto {
                    name: "matmul".to_string(),
                    op_type: "MatMul".to_string(),
                    input: vec!["x".to_string(), "W".to_string()],
                    output: vec!["xw".to_string()],
                    ..Default::default()
                },
                pb::NodeProto {
                    name: "add".to_string(),
                    op_type: "Add".to_string(),
                    input: vec!["xw".to_string(), "B".to_string()],
                    output: vec!["y".to_string()],
                    ..Default::default()
                },
            ],
            initializer: vec![
                initializer("W", vec![width, 1], weights.to_vec()),
                initializer("B", vec![1], vec![bias]),
            ],
            input: vec![value_info("x", &[1, width])],
            output: vec![value_info("y", &[1, 1])],
            ..Default::default()
        };
        let model = pb::ModelProto {
            ir_version: 7,
            opset_import: vec![pb::OperatorSetIdProto {
                domain: String::new(),
                version: 13,
            }],
            producer_name: "gdp-predictor-tests".to_string(),
            graph: Some(graph),
            ..Default::default()
        };
        std::fs::write(path, model.encode_to_vec()).unwrap();
    }
}
