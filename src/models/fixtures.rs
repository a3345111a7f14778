//! Small, fully known artifact set written to a temporary directory

use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

pub const COLUMNS: [&str; 8] = [
    "age",
    "sleep_hours",
    "stress_level",
    "gender_Male",
    "gender_Female",
    "platform_Instagram",
    "platform_TikTok",
    "platform_YouTube",
];

pub const CLASSES: [&str; 3] = ["Anxious", "Normal", "Stressed"];

/// Fixed output of the fixture classifier, whatever the input
pub const FIXED_DISTRIBUTION: [f32; 3] = [0.1, 0.7, 0.2];

pub fn write(dir: &Path, file: &str, value: &Value) {
    std::fs::write(dir.join(file), serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

pub fn write_scaler(dir: &Path) {
    let width = COLUMNS.len();
    write(
        dir,
        "scaler.json",
        &json!({ "mean": vec![0.0; width], "scale": vec![1.0; width] }),
    );
}

/// Single softmax layer with a zero kernel, so the bias alone decides the
/// output: softmax(ln p) = p
pub fn constant_network(width: usize, distribution: &[f32]) -> Value {
    let bias: Vec<f32> = distribution.iter().map(|p| p.ln()).collect();
    json!({
        "layers": [{
            "weights": vec![vec![0.0_f32; distribution.len()]; width],
            "bias": bias,
            "activation": "softmax"
        }]
    })
}

/// Directory holding a complete, consistent artifact set
pub fn artifact_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "model_columns.json", &json!(COLUMNS));
    write(dir.path(), "label_encoder.json", &json!(CLASSES));
    write_scaler(dir.path());
    write(
        dir.path(),
        "classifier.json",
        &constant_network(COLUMNS.len(), &FIXED_DISTRIBUTION),
    );
    dir
}
