//! Prediction statistics for the DT service.

use crate::error::FieldError;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Width of one predicted-DT histogram bucket (µs/ft)
const DT_BUCKET_WIDTH: f64 = 20.0;
const DT_BUCKETS: usize = 10;

/// Metrics collector for predictions
pub struct PredictionMetrics {
    /// Successful predictions
    pub predictions_served: AtomicU64,
    /// Predictions the model failed to produce
    pub predictions_failed: AtomicU64,
    /// Submissions rejected by input validation
    pub inputs_rejected: AtomicU64,
    /// Rejections by feature name
    rejections_by_feature: RwLock<HashMap<String, u64>>,
    /// Inference latencies (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Predicted DT distribution, 0-200 µs/ft in 20 µs/ft buckets
    dt_buckets: RwLock<[u64; DT_BUCKETS]>,
    start_time: Instant,
}

impl PredictionMetrics {
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            predictions_failed: AtomicU64::new(0),
            inputs_rejected: AtomicU64::new(0),
            rejections_by_feature: RwLock::new(HashMap::new()),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            dt_buckets: RwLock::new([0; DT_BUCKETS]),
            start_time: Instant::now(),
        }
    }

    /// Record a successful prediction
    pub fn record_prediction(&self, latency: Duration, predicted_dt: f64) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut latencies) = self.latencies.write() {
            latencies.push(latency.as_micros() as u64);
            // Keep only the most recent samples
            if latencies.len() > 10000 {
                latencies.drain(0..5000);
            }
        }

        let bucket = ((predicted_dt / DT_BUCKET_WIDTH).max(0.0) as usize).min(DT_BUCKETS - 1);
        if let Ok(mut buckets) = self.dt_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    pub fn record_failure(&self) {
        self.predictions_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected submission and the fields that caused it
    pub fn record_rejection(&self, errors: &[FieldError]) {
        self.inputs_rejected.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut by_feature) = self.rejections_by_feature.write() {
            for err in errors {
                *by_feature.entry(err.feature().to_string()).or_insert(0) += 1;
            }
        }
    }

    /// Inference latency statistics
    pub fn get_latency_stats(&self) -> LatencyStats {
        let mut sorted: Vec<u64> = match self.latencies.read() {
            Ok(latencies) => latencies.clone(),
            Err(_) => return LatencyStats::default(),
        };
        if sorted.is_empty() {
            return LatencyStats::default();
        }
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let percentile = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: percentile(0.50),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Predictions per second since startup
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.predictions_served.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_dt_distribution(&self) -> [u64; DT_BUCKETS] {
        self.dt_buckets.read().map(|b| *b).unwrap_or_default()
    }

    pub fn get_rejections_by_feature(&self) -> HashMap<String, u64> {
        self.rejections_by_feature
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Point-in-time copy for the health endpoint
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            predictions_served: self.predictions_served.load(Ordering::Relaxed),
            predictions_failed: self.predictions_failed.load(Ordering::Relaxed),
            inputs_rejected: self.inputs_rejected.load(Ordering::Relaxed),
            rejections_by_feature: self.get_rejections_by_feature(),
            latency: self.get_latency_stats(),
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }

    fn total_requests(&self) -> u64 {
        self.predictions_served.load(Ordering::Relaxed)
            + self.predictions_failed.load(Ordering::Relaxed)
            + self.inputs_rejected.load(Ordering::Relaxed)
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let served = self.predictions_served.load(Ordering::Relaxed);
        let failed = self.predictions_failed.load(Ordering::Relaxed);
        let rejected = self.inputs_rejected.load(Ordering::Relaxed);
        let latency = self.get_latency_stats();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║              DT PREDICTION SERVICE - METRICS SUMMARY         ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Predictions: {:>8}  │  Failed: {:>6}  │  Rejected: {:>6} ║",
            served, failed, rejected
        );
        info!(
            "║ Inference Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            latency.mean_us, latency.p50_us, latency.p95_us, latency.p99_us
        );
        info!(
            "║ Throughput: {:>8.2} predictions/s                             ║",
            self.get_throughput()
        );

        let rejections = self.get_rejections_by_feature();
        if !rejections.is_empty() {
            info!("╠══════════════════════════════════════════════════════════════╣");
            info!("║ Rejections by Feature:                                       ║");
            for (feature, count) in &rejections {
                info!("║   {:6}: {:>6}                                             ║", feature, count);
            }
        }

        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Predicted DT Distribution (µs/ft):                           ║");
        let distribution = self.get_dt_distribution();
        let total: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate() {
            let pct = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar: String = "█".repeat(((pct / 5.0) as usize).min(20));
            info!(
                "║   {:>3.0}-{:<3.0}: {:>6} ({:>5.1}%) {}",
                i as f64 * DT_BUCKET_WIDTH,
                (i + 1) as f64 * DT_BUCKET_WIDTH,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for PredictionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Inference latency statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub predictions_served: u64,
    pub predictions_failed: u64,
    pub inputs_rejected: u64,
    pub rejections_by_feature: HashMap<String, u64>,
    pub latency: LatencyStats,
    pub uptime_secs: u64,
}

/// Periodically logs a metrics summary
pub struct MetricsReporter {
    metrics: Arc<PredictionMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PredictionMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task. Quiet intervals are skipped.
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // The first tick completes immediately
        interval.tick().await;

        let mut last_reported = 0;
        loop {
            interval.tick().await;
            let total = self.metrics.total_requests();
            if total != last_reported {
                self.metrics.print_summary();
                last_reported = total;
            }
        }
    }
}
