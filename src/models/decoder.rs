//! Label decoding: class probabilities to a human-readable result

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Ordered class names, index-aligned to the classifier output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDecoder {
    classes: Vec<String>,
}

impl LabelDecoder {
    pub fn new(classes: Vec<String>) -> Self {
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Turn a distribution into the top-1 label, its confidence and the
    /// full per-class table
    pub fn decode(&self, dist: &[f32]) -> Result<PredictionResult> {
        if dist.len() != self.classes.len() {
            return Err(PipelineError::DecoderMismatch {
                expected: self.classes.len(),
                actual: dist.len(),
            });
        }

        // Strict comparison keeps the lowest index on ties
        let (best, confidence) = dist
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, p)| match best {
                Some((_, top)) if p <= top => best,
                _ => Some((i, p)),
            })
            .ok_or(PipelineError::DecoderMismatch {
                expected: self.classes.len(),
                actual: 0,
            })?;

        let distribution = self
            .classes
            .iter()
            .zip(dist.iter())
            .map(|(label, &probability)| ClassScore {
                label: label.clone(),
                probability,
            })
            .collect();

        Ok(PredictionResult {
            label: self.classes[best].clone(),
            class_index: best,
            confidence,
            distribution,
        })
    }
}

/// Probability assigned to one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScore {
    pub label: String,
    pub probability: f32,
}

/// Decoded classifier output for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Top-1 class label
    pub label: String,
    /// Index of the top-1 class
    pub class_index: usize,
    /// Probability of the top-1 class (0.0 - 1.0)
    pub confidence: f32,
    /// Every known class with its probability, in class-index order
    pub distribution: Vec<ClassScore>,
}

impl PredictionResult {
    /// Scores sorted ascending, the order a bar chart shows them in
    pub fn sorted_ascending(&self) -> Vec<ClassScore> {
        let mut scores = self.distribution.clone();
        scores.sort_by(|a, b| a.probability.total_cmp(&b.probability));
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> LabelDecoder {
        LabelDecoder::new(vec![
            "Anxious".to_string(),
            "Normal".to_string(),
            "Stressed".to_string(),
        ])
    }

    #[test]
    fn test_decode_picks_max() {
        let result = decoder().decode(&[0.1, 0.7, 0.2]).unwrap();

        assert_eq!(result.label, "Normal");
        assert_eq!(result.class_index, 1);
        assert_eq!(result.confidence, 0.7);
        assert_eq!(result.distribution.len(), 3);
        assert_eq!(
            result.distribution[2],
            ClassScore {
                label: "Stressed".to_string(),
                probability: 0.2
            }
        );
    }

    #[test]
    fn test_tie_goes_to_lowest_index() {
        let result = decoder().decode(&[0.2, 0.4, 0.4]).unwrap();
        assert_eq!(result.label, "Normal");

        let result = decoder().decode(&[0.5, 0.0, 0.5]).unwrap();
        assert_eq!(result.label, "Anxious");
    }

    #[test]
    fn test_length_mismatch() {
        let err = decoder().decode(&[0.5, 0.5]).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DecoderMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_sorted_ascending() {
        let result = decoder().decode(&[0.1, 0.7, 0.2]).unwrap();
        let labels: Vec<String> = result
            .sorted_ascending()
            .into_iter()
            .map(|s| s.label)
            .collect();

        assert_eq!(labels, vec!["Anxious", "Stressed", "Normal"]);
    }
}
