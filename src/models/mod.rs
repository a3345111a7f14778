//! Model artifacts and inference components

pub mod classifier;
pub mod decoder;
pub mod inference;
pub mod loader;
pub mod scaler;

#[cfg(test)]
pub(crate) mod fixtures;

pub use classifier::Classifier;
pub use decoder::{LabelDecoder, PredictionResult};
pub use inference::{infer, InferenceEngine, ProbabilityDistribution};
pub use loader::{ArtifactLoader, ArtifactStore, Artifacts};
pub use scaler::{ScaledVector, StandardScaler};
