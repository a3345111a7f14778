//! Per-column standardization fitted at training time

use crate::error::{PipelineError, Result};
use crate::feature_extractor::FeatureVector;
use serde::Deserialize;

/// Feature vector after scaling; same width and column order as its input
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledVector(Vec<f32>);

impl ScaledVector {
    pub fn width(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

/// Scaler parameters as stored on disk
#[derive(Debug, Clone, Deserialize)]
pub struct ScalerParams {
    #[serde(alias = "mean_", alias = "center")]
    pub mean: Vec<f32>,
    #[serde(alias = "scale_")]
    pub scale: Vec<f32>,
}

/// Affine transform `(x - mean) / scale` applied column by column
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Vec<f32>,
    scale: Vec<f32>,
}

impl StandardScaler {
    /// Validate raw parameters.
    ///
    /// A zero scale marks a constant training column and is replaced by 1.
    pub fn from_params(params: ScalerParams) -> std::result::Result<Self, String> {
        if params.mean.len() != params.scale.len() {
            return Err(format!(
                "mean has {} entries but scale has {}",
                params.mean.len(),
                params.scale.len()
            ));
        }
        if let Some(idx) = params
            .mean
            .iter()
            .chain(params.scale.iter())
            .position(|v| !v.is_finite())
        {
            return Err(format!("non-finite parameter at position {}", idx));
        }

        let scale = params
            .scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect();

        Ok(Self {
            mean: params.mean,
            scale,
        })
    }

    /// Number of columns the scaler was fitted on
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, vector: &FeatureVector) -> Result<ScaledVector> {
        if vector.width() != self.width() {
            return Err(PipelineError::SchemaMismatch {
                stage: "scaler",
                expected: self.width(),
                actual: vector.width(),
            });
        }

        let scaled = vector
            .as_slice()
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(x, (m, s))| (x - m) / s)
            .collect();

        Ok(ScaledVector(scaled))
    }
}
