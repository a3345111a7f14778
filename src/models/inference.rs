//! Inference engine: scaling, classifier forward pass and decoding

use crate::error::{PipelineError, Result};
use crate::feature_extractor::{FeatureVector, FeatureVectorBuilder};
use crate::models::classifier::Classifier;
use crate::models::decoder::PredictionResult;
use crate::models::loader::Artifacts;
use crate::models::scaler::StandardScaler;
use crate::types::input::{AnalysisRequest, UserInput};
use crate::types::report::AnalysisReport;
use std::sync::Arc;
use tracing::debug;

/// Allowed deviation of a distribution's sum from 1
pub const DISTRIBUTION_TOLERANCE: f32 = 1e-3;

/// Class probabilities in class-index order
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityDistribution(Vec<f32>);

impl ProbabilityDistribution {
    /// Accept classifier output only if every entry is in [0, 1] and the
    /// entries sum to 1 within [`DISTRIBUTION_TOLERANCE`]
    pub fn new(values: Vec<f32>) -> Result<Self> {
        if values.is_empty() {
            return Err(PipelineError::Inference(
                "classifier produced an empty distribution".to_string(),
            ));
        }
        if let Some(idx) = values
            .iter()
            .position(|p| !p.is_finite() || !(0.0..=1.0).contains(p))
        {
            return Err(PipelineError::Inference(format!(
                "probability {} at class {} is outside [0, 1]",
                values[idx], idx
            )));
        }

        let sum: f32 = values.iter().sum();
        if (sum - 1.0).abs() > DISTRIBUTION_TOLERANCE {
            return Err(PipelineError::Inference(format!(
                "probabilities sum to {}, expected 1",
                sum
            )));
        }

        Ok(Self(values))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

/// Scale a feature vector and run it through the classifier.
///
/// Pure and deterministic; errors are reported to the caller, never retried.
pub fn infer(
    vector: &FeatureVector,
    scaler: &StandardScaler,
    classifier: &dyn Classifier,
) -> Result<ProbabilityDistribution> {
    let scaled = scaler.transform(vector)?;
    let output = classifier.predict_proba(&scaled)?;
    ProbabilityDistribution::new(output)
}

/// Runs the full build, infer and decode path against shared artifacts.
///
/// Cheap to clone; every request gets its own vectors, so one engine can
/// serve many tasks at once.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    artifacts: Arc<Artifacts>,
    builder: FeatureVectorBuilder,
}

impl InferenceEngine {
    pub fn new(artifacts: Arc<Artifacts>) -> Self {
        Self {
            artifacts,
            builder: FeatureVectorBuilder::new(),
        }
    }

    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    /// Feature column names the model was trained with
    pub fn feature_columns(&self) -> &[String] {
        self.artifacts.schema.columns()
    }

    pub fn class_labels(&self) -> &[String] {
        self.artifacts.decoder.classes()
    }

    /// Assemble the unscaled feature vector for an input
    pub fn features(&self, input: &UserInput) -> FeatureVector {
        self.builder.build(input, &self.artifacts.schema)
    }

    /// Classify one input
    pub fn predict(&self, input: &UserInput) -> Result<PredictionResult> {
        let vector = self.features(input);
        let dist = infer(
            &vector,
            &self.artifacts.scaler,
            self.artifacts.classifier.as_ref(),
        )?;
        let result = self.artifacts.decoder.decode(dist.as_slice())?;

        debug!(
            label = %result.label,
            confidence = result.confidence,
            "Inference complete"
        );

        Ok(result)
    }

    /// Validate a submitted form, classify it and render the report
    pub fn analyze(
        &self,
        request: &AnalysisRequest,
        benign_labels: &[String],
    ) -> Result<AnalysisReport> {
        request.input.validate()?;
        let prediction = self.predict(&request.input)?;
        Ok(prediction.to_report(request, benign_labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;
    use crate::models::loader::ArtifactLoader;
    use crate::models::scaler::{ScaledVector, ScalerParams};
    use crate::types::input::Platform;

    struct FixedOutput(Vec<f32>);

    impl Classifier for FixedOutput {
        fn backend(&self) -> &'static str {
            "fixed"
        }
        fn input_width(&self) -> usize {
            2
        }
        fn output_width(&self) -> usize {
            self.0.len()
        }
        fn predict_proba(&self, _input: &ScaledVector) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    fn identity_scaler(width: usize) -> StandardScaler {
        StandardScaler::from_params(ScalerParams {
            mean: vec![0.0; width],
            scale: vec![1.0; width],
        })
        .unwrap()
    }

    fn engine() -> (tempfile::TempDir, InferenceEngine) {
        let dir = fixtures::artifact_dir();
        let artifacts = ArtifactLoader::with_dir(dir.path()).load().unwrap();
        (dir, InferenceEngine::new(Arc::new(artifacts)))
    }

    #[test]
    fn test_distribution_validation() {
        assert!(ProbabilityDistribution::new(vec![0.2, 0.8]).is_ok());
        assert!(ProbabilityDistribution::new(vec![0.2, 0.8005]).is_ok());
        assert!(ProbabilityDistribution::new(vec![]).is_err());
        assert!(ProbabilityDistribution::new(vec![0.5, 0.6]).is_err());
        assert!(ProbabilityDistribution::new(vec![1.5, -0.5]).is_err());
        assert!(ProbabilityDistribution::new(vec![f32::NAN, 1.0]).is_err());
    }

    #[test]
    fn test_infer_rejects_wrong_width() {
        let classifier = FixedOutput(vec![0.5, 0.5]);
        let err = infer(
            &FeatureVector::from(vec![1.0, 2.0, 3.0]),
            &identity_scaler(2),
            &classifier,
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::SchemaMismatch { stage: "scaler", .. }));
    }

    #[test]
    fn test_infer_reports_invalid_output() {
        let classifier = FixedOutput(vec![3.0, -2.0]);
        let err = infer(
            &FeatureVector::from(vec![1.0, 2.0]),
            &identity_scaler(2),
            &classifier,
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::Inference(_)));
    }

    #[test]
    fn test_predict_end_to_end() {
        let (_dir, engine) = engine();
        let result = engine.predict(&UserInput::default()).unwrap();

        assert_eq!(result.label, "Normal");
        assert!((result.confidence - 0.7).abs() < 1e-4);
        assert_eq!(result.distribution.len(), fixtures::CLASSES.len());

        let total: f32 = result.distribution.iter().map(|s| s.probability).sum();
        assert!((total - 1.0).abs() < DISTRIBUTION_TOLERANCE);
    }

    #[test]
    fn test_features_follow_schema() {
        let (_dir, engine) = engine();
        let input = UserInput {
            platform: Platform::Unlisted("ClubHouse".to_string()),
            ..UserInput::default()
        };
        let vector = engine.features(&input);

        assert_eq!(vector.width(), engine.feature_columns().len());
        assert_eq!(vector.as_slice(), &[25.0, 7.0, 5.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_analyze_validates_before_predicting() {
        let (_dir, engine) = engine();
        let benign = vec!["Normal".to_string()];

        let report = engine
            .analyze(&AnalysisRequest::new("Ana", UserInput::default()), &benign)
            .unwrap();
        assert_eq!(report.label, "Normal");
        assert_eq!(report.confidence_pct, "70.00%");

        let request = AnalysisRequest::new(
            "Ana",
            UserInput {
                sleep_hours: 13.0,
                ..UserInput::default()
            },
        );
        let err = engine.analyze(&request, &benign).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput { field: "sleep_hours", .. }));
    }

    #[test]
    fn test_concurrent_predictions_agree() {
        let (_dir, engine) = engine();

        let results: Vec<PredictionResult> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..4)
                .map(|_| {
                    let engine = engine.clone();
                    scope.spawn(move || engine.predict(&UserInput::default()).unwrap())
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        assert!(results.iter().all(|r| r == &results[0]));
    }
}
