//! Test Request Producer
//!
//! Publishes sample evaluation requests to NATS and logs any verdicts that
//! come back on the reply subject.

use futures::StreamExt;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Request structure matching the engine's expected format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EvaluationRequest {
    request_id: String,
    amount: f64,
}

/// Amount generator for testing
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

    /// Everyday card payment
    fn generate_ordinary(&mut self) -> EvaluationRequest {
        self.request_counter += 1;
        EvaluationRequest {
            request_id: format!("req_{:012}", self.request_counter),
            amount: (self.rng.gen_range(5.0..250.0_f64) * 100.0).round() / 100.0,
        }
    }

    /// Amount well outside the usual range, high or suspiciously low
    fn generate_unusual(&mut self) -> EvaluationRequest {
        self.request_counter += 1;
        let amount = if self.rng.gen_bool(0.8) {
            self.rng.gen_range(1000.0..25000.0_f64)
        } else {
            self.rng.gen_range(0.01..1.0_f64)
        };
        EvaluationRequest {
            request_id: format!("req_{:012}", self.request_counter),
            amount: (amount * 100.0).round() / 100.0,
        }
    }

    fn generate(&mut self, unusual_rate: f64) -> EvaluationRequest {
        if self.rng.gen_bool(unusual_rate) {
            self.generate_unusual()
        } else {
            self.generate_ordinary()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("request_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Request Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("fraud.evaluate");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let unusual_rate: f64 = args
        .get(4)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.1_f64)
        .clamp(0.0, 1.0);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        unusual_rate = unusual_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, unusual_rate, delay_ms).await;
        }
    };

    // Verdicts come back on a private inbox
    let inbox = client.new_inbox();
    let mut replies = client.subscribe(inbox.clone()).await?;
    tokio::spawn(async move {
        while let Some(message) = replies.next().await {
            match serde_json::from_slice::<serde_json::Value>(&message.payload) {
                Ok(body) => info!(response = %body, "Received verdict"),
                Err(e) => warn!(error = %e, "Unreadable verdict payload"),
            }
        }
    });

    let mut generator = RequestGenerator::new();
    info!("Starting to publish {} requests...", count);

    for i in 0..count {
        let request = generator.generate(unusual_rate);
        let payload = serde_json::to_vec(&request)?;

        client
            .publish_with_reply(subject.to_string(), inbox.clone(), payload.into())
            .await?;

        if (i + 1) % 10 == 0 {
            info!("Published {}/{} requests", i + 1, count);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    client.flush().await?;
    // Give outstanding verdicts a moment to arrive
    tokio::time::sleep(Duration::from_secs(1)).await;

    info!("Completed! Published {} requests", count);
    Ok(())
}

async fn run_dry_mode(count: u64, unusual_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = RequestGenerator::new();

    for i in 0..count {
        let request = generator.generate(unusual_rate);
        let json = serde_json::to_string(&request)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample request {}: {}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
