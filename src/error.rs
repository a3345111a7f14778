//! Error types for artifact loading and per-request inference

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the classification pipeline.
///
/// `ArtifactLoad` is fatal for the whole process. Every other variant is
/// scoped to the request that produced it and leaves the loaded artifacts
/// untouched.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A model artifact is missing, unreadable or structurally invalid
    #[error("failed to load {artifact} artifact from {}: {reason}", path.display())]
    ArtifactLoad {
        artifact: &'static str,
        path: PathBuf,
        reason: String,
    },

    /// Vector width disagrees with what the scaler or classifier expects
    #[error("{stage} expected {expected} features, got {actual}")]
    SchemaMismatch {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Distribution length disagrees with the number of known classes
    #[error("label decoder knows {expected} classes, distribution has {actual} entries")]
    DecoderMismatch { expected: usize, actual: usize },

    /// Classifier forward pass failed or produced an invalid distribution
    #[error("inference failed: {0}")]
    Inference(String),

    /// A user-entered field is outside the range the form accepts
    #[error("{field} = {value} is outside the accepted range [{min}, {max}]")]
    InvalidInput {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl PipelineError {
    pub(crate) fn artifact(
        artifact: &'static str,
        path: impl Into<PathBuf>,
        reason: impl ToString,
    ) -> Self {
        PipelineError::ArtifactLoad {
            artifact,
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Short machine-readable kind, used in error reports and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::ArtifactLoad { .. } => "artifact_load",
            PipelineError::SchemaMismatch { .. } => "schema_mismatch",
            PipelineError::DecoderMismatch { .. } => "decoder_mismatch",
            PipelineError::Inference(_) => "inference",
            PipelineError::InvalidInput { .. } => "invalid_input",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
