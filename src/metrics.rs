//! Performance metrics and verdict statistics for the evaluation service.

use crate::types::Action;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for the evaluation service
pub struct PipelineMetrics {
    /// Requests scored successfully
    pub evaluations: AtomicU64,
    /// Requests that failed
    pub failures: AtomicU64,
    /// Verdict counts by action
    verdicts_by_action: RwLock<HashMap<Action, u64>>,
    /// Failure counts by error kind
    failures_by_kind: RwLock<HashMap<String, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Spikes found per evaluated history
    anomaly_counts: RwLock<Vec<usize>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            evaluations: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            verdicts_by_action: RwLock::new(HashMap::new()),
            failures_by_kind: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            anomaly_counts: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a scored request
    pub fn record_evaluation(&self, processing_time: Duration, action: Action, anomaly_count: usize) {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        self.record_processing_time(processing_time);

        if let Ok(mut by_action) = self.verdicts_by_action.write() {
            *by_action.entry(action).or_insert(0) += 1;
        }

        if let Ok(mut counts) = self.anomaly_counts.write() {
            counts.push(anomaly_count);
            if counts.len() > 1000 {
                counts.drain(0..500);
            }
        }
    }

    /// Record a failed request
    pub fn record_failure(&self, processing_time: Duration, kind: &str) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.record_processing_time(processing_time);

        if let Ok(mut by_kind) = self.failures_by_kind.write() {
            *by_kind.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    fn record_processing_time(&self, processing_time: Duration) {
        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let sorted = match self.processing_times.read() {
            Ok(times) if !times.is_empty() => {
                let mut sorted = times.clone();
                sorted.sort_unstable();
                sorted
            }
            _ => return ProcessingStats::default(),
        };

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[((count as f64 * 0.95) as usize).min(count - 1)],
            p99_us: sorted[((count as f64 * 0.99) as usize).min(count - 1)],
            max_us: sorted[count - 1],
        }
    }

    /// Average number of spikes per evaluated history
    pub fn get_avg_anomaly_count(&self) -> f64 {
        match self.anomaly_counts.read() {
            Ok(counts) if !counts.is_empty() => {
                counts.iter().sum::<usize>() as f64 / counts.len() as f64
            }
            _ => 0.0,
        }
    }

    /// Get current throughput (requests per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            let total = self.evaluations.load(Ordering::Relaxed) + self.failures.load(Ordering::Relaxed);
            total as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_verdicts_by_action(&self) -> HashMap<Action, u64> {
        self.verdicts_by_action
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn get_failures_by_kind(&self) -> HashMap<String, u64> {
        self.failures_by_kind
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let evaluations = self.evaluations.load(Ordering::Relaxed);
        let failures = self.failures.load(Ordering::Relaxed);
        let total = evaluations + failures;
        let failure_rate = if total > 0 {
            (failures as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();
        let by_action = self.get_verdicts_by_action();
        let by_kind = self.get_failures_by_kind();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║            FRAUD SPIKE ENGINE - METRICS SUMMARY              ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Evaluations: {:>8}  │  Throughput: {:>6.1} req/s            ║",
            evaluations, throughput
        );
        info!(
            "║ Failures:    {:>8}  │  Failure Rate: {:>6.1}%             ║",
            failures, failure_rate
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!(
            "║ Avg spikes per history: {:>6.1}                               ║",
            self.get_avg_anomaly_count()
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Verdicts by Action:                                          ║");
        for action in [Action::Process, Action::Monitor, Action::Report, Action::Review] {
            let count = by_action.get(&action).copied().unwrap_or(0);
            let pct = if evaluations > 0 {
                (count as f64 / evaluations as f64) * 100.0
            } else {
                0.0
            };
            info!("║   {:10}: {:>6} ({:>5.1}%)                                ║", action.as_str(), count, pct);
        }
        if !by_kind.is_empty() {
            info!("╠══════════════════════════════════════════════════════════════╣");
            info!("║ Failures by Kind:                                            ║");
            for (kind, count) in &by_kind {
                info!("║   {:20}: {:>6}                                ║", kind, count);
            }
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Real-time metrics reporter that prints periodic summaries
pub struct MetricsReporter {
    metrics: Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs: interval_secs.max(1),
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
