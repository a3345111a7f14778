//! Analysis report shown to the user

use crate::models::decoder::{ClassScore, PredictionResult};
use crate::types::input::AnalysisRequest;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Visual state of a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentalStatus {
    /// Label is in the benign set; shown as success
    Stable,
    /// Any other label; shown as a warning
    Attention,
}

impl MentalStatus {
    pub fn for_label(label: &str, benign_labels: &[String]) -> Self {
        if benign_labels.iter().any(|b| b == label) {
            MentalStatus::Stable
        } else {
            MentalStatus::Attention
        }
    }
}

/// Rendered outcome of one analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Unique report identifier
    pub report_id: String,

    pub person_name: String,

    pub assessed_on: NaiveDate,

    /// Predicted mental state
    pub label: String,

    pub status: MentalStatus,

    /// Probability of the predicted label (0.0 - 1.0)
    pub confidence: f32,

    /// Confidence formatted as a percentage, e.g. "70.00%"
    pub confidence_pct: String,

    pub message: String,

    /// Suggested next step, only for non-benign labels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,

    /// Per-class scores, lowest first
    pub scores: Vec<ClassScore>,

    pub generated_at: DateTime<Utc>,
}

/// One JSON line written per input line, tagged with the input line number
/// so results can be matched to requests whatever order they finish in
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutputLine {
    Report {
        line: u64,
        #[serde(flatten)]
        report: AnalysisReport,
    },
    Error {
        line: u64,
        error: &'static str,
        message: String,
    },
}

impl PredictionResult {
    /// Convert a prediction into the report shown for `request`
    pub fn to_report(&self, request: &AnalysisRequest, benign_labels: &[String]) -> AnalysisReport {
        let status = MentalStatus::for_label(&self.label, benign_labels);

        let (message, advice) = match status {
            MentalStatus::Stable => (
                format!(
                    "Hello {}, your mental state looks stable. Keep up your positive interactions.",
                    request.person_name
                ),
                None,
            ),
            MentalStatus::Attention => (
                format!(
                    "Hello {}, the model detected a tendency towards {}.",
                    request.person_name, self.label
                ),
                Some("Try reducing screen time and improving the quality of your rest.".to_string()),
            ),
        };

        AnalysisReport {
            report_id: uuid::Uuid::new_v4().to_string(),
            person_name: request.person_name.clone(),
            assessed_on: request.assessed_on,
            label: self.label.clone(),
            status,
            confidence: self.confidence,
            confidence_pct: format!("{:.2}%", self.confidence * 100.0),
            message,
            advice,
            scores: self.sorted_ascending(),
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::decoder::LabelDecoder;
    use crate::types::input::UserInput;

    fn benign() -> Vec<String> {
        vec!["Normal".to_string(), "Healthy".to_string()]
    }

    fn prediction(dist: &[f32]) -> PredictionResult {
        LabelDecoder::new(vec![
            "Anxious".to_string(),
            "Normal".to_string(),
            "Stressed".to_string(),
        ])
        .decode(dist)
        .unwrap()
    }

    #[test]
    fn test_status_for_label() {
        assert_eq!(MentalStatus::for_label("Healthy", &benign()), MentalStatus::Stable);
        assert_eq!(MentalStatus::for_label("Normal", &benign()), MentalStatus::Stable);
        assert_eq!(MentalStatus::for_label("normal", &benign()), MentalStatus::Attention);
        assert_eq!(MentalStatus::for_label("Stressed", &benign()), MentalStatus::Attention);
    }

    #[test]
    fn test_stable_report() {
        let request = AnalysisRequest::new("Ana", UserInput::default());
        let report = prediction(&[0.1, 0.7, 0.2]).to_report(&request, &benign());

        assert_eq!(report.label, "Normal");
        assert_eq!(report.status, MentalStatus::Stable);
        assert_eq!(report.confidence_pct, "70.00%");
        assert!(report.message.contains("Ana"));
        assert!(report.advice.is_none());
        assert_eq!(report.scores.last().map(|s| s.label.as_str()), Some("Normal"));
    }

    #[test]
    fn test_attention_report() {
        let request = AnalysisRequest::new("Ana", UserInput::default());
        let report = prediction(&[0.05, 0.15, 0.8]).to_report(&request, &benign());

        assert_eq!(report.status, MentalStatus::Attention);
        assert!(report.message.contains("Stressed"));
        assert!(report.advice.is_some());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "attention");
        assert_eq!(json["scores"][0]["label"], "Anxious");
    }

    #[test]
    fn test_output_lines_carry_input_line() {
        let request = AnalysisRequest::new("Ana", UserInput::default());
        let report = prediction(&[0.1, 0.7, 0.2]).to_report(&request, &benign());

        let json = serde_json::to_value(OutputLine::Report { line: 3, report }).unwrap();
        assert_eq!(json["line"], 3);
        assert_eq!(json["label"], "Normal");
        assert_eq!(json["person_name"], "Ana");

        let json = serde_json::to_value(OutputLine::Error {
            line: 4,
            error: "parse",
            message: "bad json".to_string(),
        })
        .unwrap();
        assert_eq!(json["line"], 4);
        assert_eq!(json["error"], "parse");
    }
}
