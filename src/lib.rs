//! Mental Health Classifier Library
//!
//! Classifies a user's mental state from self-reported social media usage
//! and lifestyle fields with a pre-trained neural classifier.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod schema;
pub mod types;

pub use config::AppConfig;
pub use error::PipelineError;
pub use feature_extractor::{FeatureVector, FeatureVectorBuilder};
pub use models::inference::InferenceEngine;
pub use models::loader::{ArtifactLoader, ArtifactStore, Artifacts};
pub use schema::FeatureSchema;
pub use types::{AnalysisReport, AnalysisRequest, UserInput};
