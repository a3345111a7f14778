//! Mental Health Classifier - Main Entry Point
//!
//! Reads analysis requests as JSON lines on stdin, classifies them with the
//! loaded model and writes one JSON report per line to stdout.

use anyhow::{Context, Result};
use mental_health_classifier::{
    config::{AppConfig, LoggingConfig},
    metrics::{AnalysisMetrics, MetricsReporter},
    models::{ArtifactLoader, ArtifactStore, InferenceEngine},
    types::{AnalysisRequest, OutputLine},
};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("mental_health_classifier={}", config.level)))?;

    // stdout carries the reports
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
    Ok(())
}

fn emit(output: &OutputLine) {
    match serde_json::to_string(output) {
        Ok(json) => println!("{}", json),
        Err(e) => error!(error = %e, "Failed to serialize output line"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting mental health classifier");

    // Without a model there is nothing to serve
    let store = ArtifactStore::new(ArtifactLoader::new(&config.artifacts));
    let artifacts = match store.get() {
        Ok(artifacts) => artifacts,
        Err(e) => {
            error!(error = %e, "Failed to load model artifacts");
            error!("{}", store.loader().expected_layout());
            return Err(e).context("Model artifacts unavailable");
        }
    };

    let engine = InferenceEngine::new(artifacts);
    info!(
        features = engine.feature_columns().len(),
        classes = ?engine.class_labels(),
        "Inference engine initialized"
    );
    debug!(columns = ?engine.feature_columns(), "Model feature columns");

    let metrics = Arc::new(AnalysisMetrics::new());
    if config.pipeline.metrics_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.pipeline.metrics_interval_secs);
        tokio::spawn(reporter.start());
    }

    let workers = config.pipeline.workers.max(1);
    info!(workers, "Reading analysis requests from stdin");

    // Semaphore to limit concurrent analyses
    let semaphore = Arc::new(Semaphore::new(workers));
    let benign_labels = Arc::new(config.presentation.benign_labels.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_no = 0_u64;

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .context("Worker semaphore closed")?;

        let engine = engine.clone();
        let metrics = metrics.clone();
        let benign_labels = benign_labels.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();

            match serde_json::from_str::<AnalysisRequest>(&line) {
                Ok(request) => match engine.analyze(&request, &benign_labels) {
                    Ok(report) => {
                        let processing_time = start_time.elapsed();
                        metrics.record_prediction(processing_time, &report.label, report.confidence);

                        info!(
                            line = line_no,
                            report_id = %report.report_id,
                            label = %report.label,
                            status = ?report.status,
                            confidence = %report.confidence_pct,
                            processing_time_us = processing_time.as_micros(),
                            "Analysis complete"
                        );
                        emit(&OutputLine::Report {
                            line: line_no,
                            report,
                        });
                    }
                    Err(e) => {
                        warn!(line = line_no, error = %e, "Analysis failed");
                        metrics.record_failure(e.kind());
                        emit(&OutputLine::Error {
                            line: line_no,
                            error: e.kind(),
                            message: e.to_string(),
                        });
                    }
                },
                Err(e) => {
                    warn!(line = line_no, error = %e, "Failed to deserialize request");
                    metrics.record_failure("parse");
                    emit(&OutputLine::Error {
                        line: line_no,
                        error: "parse",
                        message: e.to_string(),
                    });
                }
            }

            drop(permit);
        });
    }

    // Wait for in-flight analyses by taking every permit back
    let _drained = semaphore
        .acquire_many(workers as u32)
        .await
        .context("Worker semaphore closed")?;

    info!("Input exhausted, shutting down");
    metrics.print_summary();

    Ok(())
}
