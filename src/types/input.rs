//! User-entered fields for a single analysis

use crate::error::{PipelineError, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Gender options offered by the input form, parsed case-insensitively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl TryFrom<String> for Gender {
    type Error = String;

    fn try_from(name: String) -> std::result::Result<Self, Self::Error> {
        [Gender::Male, Gender::Female, Gender::Other]
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| format!("unknown gender `{}`, expected Male, Female or Other", name))
    }
}

impl From<Gender> for String {
    fn from(gender: Gender) -> Self {
        gender.as_str().to_string()
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Social media platform.
///
/// The form offers a fixed list, but any other name is carried through as
/// `Unlisted` so that it reaches the feature builder and simply encodes to
/// no platform column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Platform {
    Instagram,
    Twitter,
    TikTok,
    YouTube,
    Snapchat,
    Facebook,
    WhatsApp,
    Unlisted(String),
}

impl Platform {
    /// Platforms offered by the input form, in display order
    pub const LISTED: [Platform; 7] = [
        Platform::Instagram,
        Platform::Twitter,
        Platform::TikTok,
        Platform::YouTube,
        Platform::Snapchat,
        Platform::Facebook,
        Platform::WhatsApp,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Platform::Instagram => "Instagram",
            Platform::Twitter => "Twitter",
            Platform::TikTok => "TikTok",
            Platform::YouTube => "YouTube",
            Platform::Snapchat => "Snapchat",
            Platform::Facebook => "Facebook",
            Platform::WhatsApp => "WhatsApp",
            Platform::Unlisted(name) => name,
        }
    }
}

impl From<String> for Platform {
    fn from(name: String) -> Self {
        Platform::LISTED
            .iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(&name))
            .cloned()
            .unwrap_or(Platform::Unlisted(name))
    }
}

impl From<Platform> for String {
    fn from(platform: Platform) -> Self {
        platform.as_str().to_string()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accept an integer or a float with no fractional part, e.g. `25` or `25.0`.
///
/// Form sliders and spreadsheets send whole numbers either way.
fn whole_number<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64>,
{
    use serde::de::Error;

    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value.fract() != 0.0 || value < 0.0 || value > u64::MAX as f64 {
        return Err(D::Error::custom(format!(
            "expected a non-negative whole number, got {}",
            value
        )));
    }
    T::try_from(value as u64)
        .map_err(|_| D::Error::custom(format!("{} is too large for this field", value)))
}

/// Self-reported usage and lifestyle record, created per request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInput {
    #[serde(deserialize_with = "whole_number")]
    pub age: u32,
    pub gender: Gender,
    pub platform: Platform,
    #[serde(alias = "screen_time", deserialize_with = "whole_number")]
    pub daily_screen_time_min: u32,
    #[serde(alias = "sm_time", deserialize_with = "whole_number")]
    pub social_media_time_min: u32,
    #[serde(alias = "neg_int", deserialize_with = "whole_number")]
    pub negative_interactions_count: u32,
    #[serde(alias = "pos_int", deserialize_with = "whole_number")]
    pub positive_interactions_count: u32,
    #[serde(alias = "sleep")]
    pub sleep_hours: f64,
    #[serde(alias = "phys_act", deserialize_with = "whole_number")]
    pub physical_activity_min: u32,
    #[serde(alias = "mood", deserialize_with = "whole_number")]
    pub mood_level: u8,
    #[serde(alias = "anxiety", deserialize_with = "whole_number")]
    pub anxiety_level: u8,
    #[serde(alias = "stress", deserialize_with = "whole_number")]
    pub stress_level: u8,
}

impl UserInput {
    /// Numeric fields keyed by their training-time column name.
    ///
    /// Every value is widened to `f32`; the conversion cannot fail.
    pub fn numeric_fields(&self) -> [(&'static str, f32); 10] {
        [
            ("age", self.age as f32),
            ("daily_screen_time_min", self.daily_screen_time_min as f32),
            ("social_media_time_min", self.social_media_time_min as f32),
            ("negative_interactions_count", self.negative_interactions_count as f32),
            ("positive_interactions_count", self.positive_interactions_count as f32),
            ("sleep_hours", self.sleep_hours as f32),
            ("physical_activity_min", self.physical_activity_min as f32),
            ("anxiety_level", self.anxiety_level as f32),
            ("stress_level", self.stress_level as f32),
            ("mood_level", self.mood_level as f32),
        ]
    }

    /// Categorical fields as `(field, value)` pairs
    pub fn categorical_fields(&self) -> [(&'static str, &str); 2] {
        [
            ("gender", self.gender.as_str()),
            ("platform", self.platform.as_str()),
        ]
    }

    /// Check every numeric field against the bounds of the input form
    pub fn validate(&self) -> Result<()> {
        check("age", self.age as f64, 10.0, 100.0)?;
        check("daily_screen_time_min", self.daily_screen_time_min as f64, 0.0, 1440.0)?;
        check("social_media_time_min", self.social_media_time_min as f64, 0.0, 1440.0)?;
        check("negative_interactions_count", self.negative_interactions_count as f64, 0.0, 500.0)?;
        check("positive_interactions_count", self.positive_interactions_count as f64, 0.0, 500.0)?;
        check("sleep_hours", self.sleep_hours, 0.0, 12.0)?;
        check("physical_activity_min", self.physical_activity_min as f64, 0.0, 300.0)?;
        check("mood_level", self.mood_level as f64, 1.0, 10.0)?;
        check("anxiety_level", self.anxiety_level as f64, 1.0, 10.0)?;
        check("stress_level", self.stress_level as f64, 1.0, 10.0)?;
        Ok(())
    }
}

fn check(field: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    // NaN fails both comparisons, so test for containment rather than exclusion
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(PipelineError::InvalidInput {
            field,
            value,
            min,
            max,
        })
    }
}

impl Default for UserInput {
    /// The values the input form starts with
    fn default() -> Self {
        Self {
            age: 25,
            gender: Gender::Male,
            platform: Platform::Instagram,
            daily_screen_time_min: 300,
            social_media_time_min: 120,
            negative_interactions_count: 2,
            positive_interactions_count: 10,
            sleep_hours: 7.0,
            physical_activity_min: 30,
            mood_level: 5,
            anxiety_level: 5,
            stress_level: 5,
        }
    }
}

fn default_person_name() -> String {
    "John Doe".to_string()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// One submitted form: who is being assessed, when, and their answers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default = "default_person_name")]
    pub person_name: String,

    #[serde(default = "today", alias = "date")]
    pub assessed_on: NaiveDate,

    #[serde(flatten)]
    pub input: UserInput,
}

impl AnalysisRequest {
    pub fn new(person_name: impl Into<String>, input: UserInput) -> Self {
        Self {
            person_name: person_name.into(),
            assessed_on: today(),
            input,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parsing() {
        assert_eq!(Platform::from("instagram".to_string()), Platform::Instagram);
        assert_eq!(Platform::from("TikTok".to_string()), Platform::TikTok);
        assert_eq!(
            Platform::from("ClubHouse".to_string()),
            Platform::Unlisted("ClubHouse".to_string())
        );
        assert_eq!(Platform::Unlisted("ClubHouse".to_string()).as_str(), "ClubHouse");
    }

    #[test]
    fn test_request_deserialization_with_form_aliases() {
        let json = r#"{
            "person_name": "Ana",
            "date": "2026-03-14",
            "age": 25, "gender": "Male", "platform": "Instagram",
            "screen_time": 300, "sm_time": 120, "neg_int": 2, "pos_int": 10,
            "sleep": 7.0, "phys_act": 30, "mood": 5, "anxiety": 5, "stress": 5
        }"#;

        let request: AnalysisRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.person_name, "Ana");
        assert_eq!(request.assessed_on, NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
        assert_eq!(request.input, UserInput::default());
    }

    #[test]
    fn test_whole_number_floats_accepted() {
        let json = r#"{
            "age": 25.0, "gender": "Male", "platform": "Instagram",
            "daily_screen_time_min": 300.0, "social_media_time_min": 120,
            "negative_interactions_count": 2.0, "positive_interactions_count": 10,
            "sleep_hours": 7, "physical_activity_min": 30.0,
            "mood_level": 5.0, "anxiety_level": 5, "stress_level": 5.0
        }"#;

        let request: AnalysisRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.input, UserInput::default());
    }

    #[test]
    fn test_fractional_or_negative_counts_rejected() {
        let base = serde_json::to_value(UserInput::default()).unwrap();

        for (field, value) in [
            ("age", serde_json::json!(25.5)),
            ("mood_level", serde_json::json!(-1)),
            ("stress_level", serde_json::json!(300)),
        ] {
            let mut json = base.clone();
            json[field] = value;
            assert!(
                serde_json::from_value::<AnalysisRequest>(json).is_err(),
                "{} accepted",
                field
            );
        }
    }

    #[test]
    fn test_gender_is_case_insensitive() {
        let mut json = serde_json::to_value(UserInput::default()).unwrap();
        json["gender"] = serde_json::json!("female");

        let request: AnalysisRequest = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(request.input.gender, Gender::Female);
        assert_eq!(serde_json::to_value(request.input).unwrap()["gender"], "Female");

        json["gender"] = serde_json::json!("robot");
        assert!(serde_json::from_value::<AnalysisRequest>(json).is_err());
    }

    #[test]
    fn test_request_defaults() {
        let json = serde_json::to_string(&UserInput::default()).unwrap();
        let request: AnalysisRequest = serde_json::from_str(&json).unwrap();

        assert_eq!(request.person_name, "John Doe");
        assert_eq!(request.input.platform, Platform::Instagram);
    }

    #[test]
    fn test_numeric_fields_are_widened() {
        let input = UserInput {
            sleep_hours: 6.5,
            ..UserInput::default()
        };
        let fields = input.numeric_fields();

        assert_eq!(fields.len(), 10);
        assert!(fields.contains(&("age", 25.0)));
        assert!(fields.contains(&("sleep_hours", 6.5)));
        assert!(fields.contains(&("mood_level", 5.0)));
    }

    #[test]
    fn test_validate_bounds() {
        assert!(UserInput::default().validate().is_ok());

        let too_young = UserInput {
            age: 9,
            ..UserInput::default()
        };
        match too_young.validate() {
            Err(PipelineError::InvalidInput { field, .. }) => assert_eq!(field, "age"),
            other => panic!("expected InvalidInput, got {:?}", other),
        }

        let no_sleep_value = UserInput {
            sleep_hours: f64::NAN,
            ..UserInput::default()
        };
        assert!(no_sleep_value.validate().is_err());

        let calm = UserInput {
            stress_level: 0,
            ..UserInput::default()
        };
        assert!(calm.validate().is_err());
    }
}
