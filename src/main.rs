//! Fraud Spike Engine - Main Entry Point
//!
//! Consumes evaluation requests from NATS, scores each amount against the
//! transaction history baseline, and publishes the verdict.

use anyhow::Result;
use fraud_spike_engine::{
    config::{AppConfig, LoggingConfig},
    consumer::RequestConsumer,
    detection::FraudEngine,
    dispatch::spawn_with_permit,
    history::HistoryLoader,
    metrics::{MetricsReporter, PipelineMetrics},
    producer::VerdictProducer,
    types::{EvaluationFailure, EvaluationRequest, EvaluationResponse},
    Assessment,
};
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().or_else(|_| {
        tracing_subscriber::EnvFilter::try_new(format!("fraud_spike_engine={}", logging.level))
    })?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };

    init_logging(&config.logging)?;
    info!("Starting Fraud Spike Engine");
    info!(
        history = %config.history.path,
        window_size = config.detection.window_size,
        confidence_percent = config.detection.confidence_percent,
        "Configuration loaded successfully"
    );

    let metrics = Arc::new(PipelineMetrics::new());
    let engine = Arc::new(FraudEngine::new(&config.detection)?);
    let loader = Arc::new(HistoryLoader::from_config(&config.history));

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = RequestConsumer::new(client.clone(), &config.nats.request_subject);
    let producer = Arc::new(VerdictProducer::new(client.clone(), &config.nats.verdict_subject));

    let num_workers = config.pipeline.workers.max(1);
    info!(
        workers = num_workers,
        requests = %consumer.subject(),
        verdicts = %producer.subject(),
        "Starting evaluation loop"
    );

    // Semaphore to limit concurrent evaluations
    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));
    let timeout = Duration::from_millis(config.pipeline.timeout_ms);
    let history_path = Arc::new(config.history.path.clone());

    let metrics_clone = metrics.clone();
    let interval = config.pipeline.metrics_interval_secs;
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, interval);
        reporter.start().await;
    });

    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        let permit = semaphore.clone().acquire_owned().await?;

        let engine = engine.clone();
        let loader = loader.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();
        let processed_count = processed_count.clone();
        let history_path = history_path.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();
            let reply = message.reply.as_ref().map(|s| s.to_string());

            let request = match serde_json::from_slice::<EvaluationRequest>(&message.payload) {
                Ok(request) => request,
                Err(e) => {
                    warn!(error = %e, "Failed to deserialize evaluation request");
                    metrics.record_failure(start_time.elapsed(), "malformed_request");
                    if let Some(reply) = reply.as_deref() {
                        let failure = EvaluationFailure::malformed_request(e.to_string());
                        if let Err(e) = producer.publish_failure(&failure, Some(reply)).await {
                            error!(error = %e, "Failed to publish failure");
                        }
                    }
                    drop(permit);
                    return;
                }
            };
            let request_id = request.request_id.clone();
            let amount = request.amount;

            // History is re-read per request; the core keeps nothing between calls
            let work = spawn_with_permit(permit, move || {
                let series = loader.load_series(history_path.as_str())?;
                engine.evaluate(&series, amount)
            });

            let outcome: std::result::Result<Assessment, EvaluationFailure> =
                match tokio::time::timeout(timeout, work).await {
                    Ok(Ok(Ok(assessment))) => Ok(assessment),
                    Ok(Ok(Err(e))) => {
                        warn!(request_id = %request_id, kind = e.kind(), error = %e, "Evaluation failed");
                        Err(EvaluationFailure::new(request_id.clone(), &e))
                    }
                    Ok(Err(join_error)) => {
                        error!(request_id = %request_id, error = %join_error, "Evaluation task failed");
                        Err(EvaluationFailure::with_kind(
                            request_id.clone(),
                            "internal",
                            join_error.to_string(),
                        ))
                    }
                    Err(_) => {
                        warn!(
                            request_id = %request_id,
                            timeout_ms = timeout.as_millis() as u64,
                            "Evaluation timed out"
                        );
                        Err(EvaluationFailure::with_kind(
                            request_id.clone(),
                            "timeout",
                            format!("evaluation exceeded {} ms", timeout.as_millis()),
                        ))
                    }
                };

            let processing_time = start_time.elapsed();
            match outcome {
                Ok(assessment) => {
                    metrics.record_evaluation(
                        processing_time,
                        assessment.verdict.action,
                        assessment.anomaly_count,
                    );

                    let response = EvaluationResponse::new(request_id.clone(), amount, &assessment);
                    if let Err(e) = producer.publish(&response, reply.as_deref()).await {
                        error!(request_id = %request_id, error = %e, "Failed to publish verdict");
                    } else {
                        info!(
                            request_id = %request_id,
                            amount = amount,
                            status = response.verdict.status_code,
                            action = response.verdict.action.as_str(),
                            processing_time_us = processing_time.as_micros() as u64,
                            "Verdict published"
                        );
                    }
                }
                Err(failure) => {
                    metrics.record_failure(processing_time, &failure.kind);
                    if let Err(e) = producer.publish_failure(&failure, reply.as_deref()).await {
                        error!(request_id = %request_id, error = %e, "Failed to publish failure");
                    }
                }
            }

            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
            if count % 100 == 0 {
                let stats = metrics.get_processing_stats();
                info!(
                    processed = count,
                    throughput = format!("{:.1} req/s", metrics.get_throughput()),
                    avg_latency_us = stats.mean_us,
                    "Processing milestone"
                );
            } else {
                debug!(processed = count, "Request handled");
            }
        });
    }

    info!("Engine shutting down...");
    metrics.print_summary();

    Ok(())
}
