//! Configuration management for the classifier service

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Which classifier backend reads the classifier artifact
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierBackend {
    /// JSON dense network evaluated in-process
    #[default]
    Dense,
    /// ONNX graph run through ONNX Runtime (needs the `onnx` feature)
    Onnx,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub presentation: PresentationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Model artifact locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Directory containing all artifact files
    pub dir: String,
    pub classifier_file: String,
    pub scaler_file: String,
    pub label_encoder_file: String,
    pub columns_file: String,
    pub backend: ClassifierBackend,
    /// Intra-op threads for the ONNX backend
    pub onnx_threads: usize,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: "model_assets".to_string(),
            classifier_file: "classifier.json".to_string(),
            scaler_file: "scaler.json".to_string(),
            label_encoder_file: "label_encoder.json".to_string(),
            columns_file: "model_columns.json".to_string(),
            backend: ClassifierBackend::Dense,
            onnx_threads: 1,
        }
    }
}

/// Request processing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of requests analysed concurrently
    pub workers: usize,
    /// Seconds between periodic metrics summaries (0 disables them)
    pub metrics_interval_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            metrics_interval_secs: 60,
        }
    }
}

/// How results are presented
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    /// Labels shown as a stable mental state
    pub benign_labels: Vec<String>,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            benign_labels: vec!["Normal".to_string(), "Healthy".to_string()],
        }
    }
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

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path, falling back to defaults
    /// when the file does not exist
    pub fn load() -> Result<Self> {
        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from_path(DEFAULT_CONFIG_PATH)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.artifacts.dir, "model_assets");
        assert_eq!(config.artifacts.backend, ClassifierBackend::Dense);
        assert_eq!(config.pipeline.workers, 4);
        assert_eq!(config.presentation.benign_labels, vec!["Normal", "Healthy"]);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[artifacts]
dir = "/srv/models"
backend = "onnx"
classifier_file = "classifier.onnx"

[pipeline]
workers = 8
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();

        assert_eq!(config.artifacts.dir, "/srv/models");
        assert_eq!(config.artifacts.backend, ClassifierBackend::Onnx);
        assert_eq!(config.artifacts.classifier_file, "classifier.onnx");
        assert_eq!(config.artifacts.scaler_file, "scaler.json");
        assert_eq!(config.pipeline.workers, 8);
        assert_eq!(config.pipeline.metrics_interval_secs, 60);
        assert_eq!(config.logging.format, "pretty");
    }
}
