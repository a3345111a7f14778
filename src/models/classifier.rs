//! Classifier backends

use crate::error::{PipelineError, Result};
use crate::models::scaler::ScaledVector;
use ndarray::{Array1, Array2};
use serde::Deserialize;

/// A trained classifier mapping one scaled row to class probabilities.
///
/// Implementations are read-only after loading and shared across requests.
pub trait Classifier: Send + Sync {
    /// Short backend name for logs
    fn backend(&self) -> &'static str;

    /// Number of input features
    fn input_width(&self) -> usize;

    /// Number of output classes
    fn output_width(&self) -> usize;

    /// Forward pass for a batch of one
    fn predict_proba(&self, input: &ScaledVector) -> Result<Vec<f32>>;
}

/// Layer activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Tanh,
    Sigmoid,
    Softmax,
}

impl Activation {
    fn apply(self, x: &mut Array1<f32>) {
        match self {
            Activation::Linear => {}
            Activation::Relu => x.mapv_inplace(|v| v.max(0.0)),
            Activation::Tanh => x.mapv_inplace(f32::tanh),
            Activation::Sigmoid => x.mapv_inplace(|v| 1.0 / (1.0 + (-v).exp())),
            Activation::Softmax => {
                let max = x.fold(f32::NEG_INFINITY, |a, &b| a.max(b));
                x.mapv_inplace(|v| (v - max).exp());
                let sum = x.sum();
                x.mapv_inplace(|v| v / sum);
            }
        }
    }
}

/// Dense layer as stored on disk; `weights` is laid out `[inputs][units]`
#[derive(Debug, Clone, Deserialize)]
pub struct DenseLayerSpec {
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
    #[serde(default)]
    pub activation: Activation,
}

/// Feed-forward network as stored on disk
#[derive(Debug, Clone, Deserialize)]
pub struct DenseNetworkSpec {
    pub layers: Vec<DenseLayerSpec>,
}

#[derive(Debug, Clone)]
struct DenseLayer {
    weights: Array2<f32>,
    bias: Array1<f32>,
    activation: Activation,
}

/// Fully connected network evaluated with `ndarray`
#[derive(Debug, Clone)]
pub struct DenseNetwork {
    layers: Vec<DenseLayer>,
}

impl DenseNetwork {
    /// Check layer shapes chain together and build the network
    pub fn from_spec(spec: DenseNetworkSpec) -> std::result::Result<Self, String> {
        if spec.layers.is_empty() {
            return Err("network has no layers".to_string());
        }

        let mut layers = Vec::with_capacity(spec.layers.len());
        let mut prev_units: Option<usize> = None;

        for (i, layer) in spec.layers.into_iter().enumerate() {
            let inputs = layer.weights.len();
            let units = layer.weights.first().map(Vec::len).unwrap_or(0);

            if inputs == 0 || units == 0 {
                return Err(format!("layer {} has an empty kernel", i));
            }
            if layer.weights.iter().any(|row| row.len() != units) {
                return Err(format!("layer {} kernel rows have uneven lengths", i));
            }
            if layer.bias.len() != units {
                return Err(format!(
                    "layer {} has {} units but {} bias values",
                    i,
                    units,
                    layer.bias.len()
                ));
            }
            if let Some(prev) = prev_units {
                if prev != inputs {
                    return Err(format!(
                        "layer {} expects {} inputs but previous layer has {} units",
                        i, inputs, prev
                    ));
                }
            }

            let flat: Vec<f32> = layer.weights.into_iter().flatten().collect();
            if flat.iter().chain(layer.bias.iter()).any(|v| !v.is_finite()) {
                return Err(format!("layer {} contains non-finite weights", i));
            }

            let weights = Array2::from_shape_vec((inputs, units), flat)
                .map_err(|e| format!("layer {}: {}", i, e))?;

            layers.push(DenseLayer {
                weights,
                bias: Array1::from(layer.bias),
                activation: layer.activation,
            });
            prev_units = Some(units);
        }

        Ok(Self { layers })
    }
}

impl Classifier for DenseNetwork {
    fn backend(&self) -> &'static str {
        "dense"
    }

    fn input_width(&self) -> usize {
        self.layers[0].weights.nrows()
    }

    fn output_width(&self) -> usize {
        self.layers[self.layers.len() - 1].weights.ncols()
    }

    fn predict_proba(&self, input: &ScaledVector) -> Result<Vec<f32>> {
        if input.width() != self.input_width() {
            return Err(PipelineError::SchemaMismatch {
                stage: "classifier",
                expected: self.input_width(),
                actual: input.width(),
            });
        }

        let mut x = Array1::from(input.as_slice().to_vec());
        for layer in &self.layers {
            let mut z = x.dot(&layer.weights) + &layer.bias;
            layer.activation.apply(&mut z);
            x = z;
        }

        Ok(x.to_vec())
    }
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;

#[cfg(feature = "onnx")]
mod onnx {
    use super::Classifier;
    use crate::error::{PipelineError, Result};
    use crate::models::scaler::ScaledVector;
    use ort::session::{builder::GraphOptimizationLevel, Session};
    use ort::value::Tensor;
    use std::path::Path;
    use std::sync::Mutex;
    use tracing::info;

    /// Classifier exported to ONNX and run through ONNX Runtime
    pub struct OnnxClassifier {
        session: Mutex<Session>,
        input_name: String,
        output_name: String,
        input_width: usize,
        output_width: usize,
    }

    impl OnnxClassifier {
        /// Load a session; widths come from the schema and label decoder
        /// because the graph may declare dynamic dimensions.
        pub fn load(
            path: &Path,
            threads: usize,
            input_width: usize,
            output_width: usize,
        ) -> std::result::Result<Self, String> {
            ort::init().commit().map_err(|e| e.to_string())?;

            let session = Session::builder()
                .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
                .and_then(|b| b.with_intra_threads(threads))
                .and_then(|b| b.commit_from_file(path))
                .map_err(|e| e.to_string())?;

            let input_name = session
                .inputs
                .first()
                .map(|i| i.name.clone())
                .ok_or_else(|| "model declares no inputs".to_string())?;

            let output_name = session
                .outputs
                .iter()
                .find(|o| o.name.contains("prob") || o.name.contains("output"))
                .or_else(|| session.outputs.last())
                .map(|o| o.name.clone())
                .ok_or_else(|| "model declares no outputs".to_string())?;

            info!(
                path = %path.display(),
                input = %input_name,
                output = %output_name,
                threads = threads,
                "ONNX classifier loaded"
            );

            Ok(Self {
                session: Mutex::new(session),
                input_name,
                output_name,
                input_width,
                output_width,
            })
        }
    }

    impl Classifier for OnnxClassifier {
        fn backend(&self) -> &'static str {
            "onnx"
        }

        fn input_width(&self) -> usize {
            self.input_width
        }

        fn output_width(&self) -> usize {
            self.output_width
        }

        fn predict_proba(&self, input: &ScaledVector) -> Result<Vec<f32>> {
            if input.width() != self.input_width {
                return Err(PipelineError::SchemaMismatch {
                    stage: "classifier",
                    expected: self.input_width,
                    actual: input.width(),
                });
            }

            let shape = vec![1_i64, input.width() as i64];
            let tensor = Tensor::from_array((shape, input.as_slice().to_vec()))
                .map_err(|e| PipelineError::Inference(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|e| PipelineError::Inference(format!("session lock poisoned: {}", e)))?;
            let outputs = session
                .run(ort::inputs![&self.input_name => tensor])
                .map_err(|e| PipelineError::Inference(e.to_string()))?;

            let output = outputs.get(&self.output_name).ok_or_else(|| {
                PipelineError::Inference(format!("missing output {}", self.output_name))
            })?;
            let (_, data) = output
                .try_extract_tensor::<f32>()
                .map_err(|e| PipelineError::Inference(e.to_string()))?;

            Ok(data.to_vec())
        }
    }
}
