//! Sample Request Generator
//!
//! Writes random, form-valid analysis requests as JSON lines to stdout, for
//! piping into the classifier binary.

use mental_health_classifier::types::{AnalysisRequest, Gender, Platform, UserInput};
use rand::Rng;
use tracing::info;

/// Request generator for smoke tests
struct RequestGenerator {
    rng: rand::rngs::ThreadRng,
    request_counter: u64,
}

impl RequestGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            request_counter: 0,
        }
    }

    /// Moderate usage, decent sleep, low stress
    fn generate_balanced(&mut self) -> AnalysisRequest {
        self.request_counter += 1;

        let input = UserInput {
            age: self.rng.gen_range(16..=65),
            gender: self.random_gender(),
            platform: self.random_platform(),
            daily_screen_time_min: self.rng.gen_range(60..=360),
            social_media_time_min: self.rng.gen_range(15..=120),
            negative_interactions_count: self.rng.gen_range(0..=3),
            positive_interactions_count: self.rng.gen_range(5..=40),
            sleep_hours: self.half_hours(6.5, 9.0),
            physical_activity_min: self.rng.gen_range(20..=120),
            mood_level: self.rng.gen_range(6..=10),
            anxiety_level: self.rng.gen_range(1..=4),
            stress_level: self.rng.gen_range(1..=4),
        };

        AnalysisRequest::new(format!("sample_{:06}", self.request_counter), input)
    }

    /// Heavy usage, poor sleep, many negative interactions
    fn generate_strained(&mut self) -> AnalysisRequest {
        self.request_counter += 1;

        let input = UserInput {
            age: self.rng.gen_range(13..=35),
            gender: self.random_gender(),
            platform: self.random_platform(),
            daily_screen_time_min: self.rng.gen_range(480..=1200),
            social_media_time_min: self.rng.gen_range(240..=720),
            negative_interactions_count: self.rng.gen_range(10..=80),
            positive_interactions_count: self.rng.gen_range(0..=10),
            sleep_hours: self.half_hours(3.0, 6.0),
            physical_activity_min: self.rng.gen_range(0..=20),
            mood_level: self.rng.gen_range(1..=4),
            anxiety_level: self.rng.gen_range(6..=10),
            stress_level: self.rng.gen_range(6..=10),
        };

        AnalysisRequest::new(format!("sample_{:06}", self.request_counter), input)
    }

    fn random_gender(&mut self) -> Gender {
        match self.rng.gen_range(0..3) {
            0 => Gender::Male,
            1 => Gender::Female,
            _ => Gender::Other,
        }
    }

    fn random_platform(&mut self) -> Platform {
        Platform::LISTED[self.rng.gen_range(0..Platform::LISTED.len())].clone()
    }

    /// Sleep in half-hour steps, like the form slider
    fn half_hours(&mut self, low: f64, high: f64) -> f64 {
        let steps = ((high - low) * 2.0) as u32;
        low + self.rng.gen_range(0..=steps) as f64 * 0.5
    }
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_inputs=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let count: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(20);
    let strained_rate: f64 = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.3_f64)
        .clamp(0.0, 1.0);

    info!(count, strained_rate, "Generating sample requests");

    let mut generator = RequestGenerator::new();
    let mut rng = rand::thread_rng();
    let mut strained_count = 0;

    for _ in 0..count {
        let request = if rng.gen_bool(strained_rate) {
            strained_count += 1;
            generator.generate_strained()
        } else {
            generator.generate_balanced()
        };

        debug_assert!(request.input.validate().is_ok());
        println!("{}", serde_json::to_string(&request)?);
    }

    info!(
        "Generated {} requests ({} balanced, {} strained)",
        count,
        count - strained_count,
        strained_count
    );

    Ok(())
}
