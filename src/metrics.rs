//! Metrics module - Tick latency and monitoring outcome counters

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hdrhistogram::{CreationError, Histogram};
use parking_lot::Mutex;

// ============================================================================
// TIMING METRICS - Thread-safe performance tracking
// ============================================================================

#[derive(Clone)]
pub struct TimingMetrics {
    tick_hist: Arc<Mutex<Histogram<u64>>>,
    batch_row_hist: Arc<Mutex<Histogram<u64>>>,
    ticks: Arc<AtomicU64>,
    anomalies: Arc<AtomicU64>,
    rejected: Arc<AtomicU64>,
    log_failures: Arc<AtomicU64>,
}

impl TimingMetrics {
    pub fn new() -> Result<Self, CreationError> {
        Ok(Self {
            tick_hist: Arc::new(Mutex::new(Histogram::new(3)?)),
            batch_row_hist: Arc::new(Mutex::new(Histogram::new(3)?)),
            ticks: Arc::new(AtomicU64::new(0)),
            anomalies: Arc::new(AtomicU64::new(0)),
            rejected: Arc::new(AtomicU64::new(0)),
            log_failures: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn record_tick(&self, duration: Duration, is_anomaly: bool) {
        self.tick_hist.lock().record(duration.as_nanos() as u64).ok();
        self.ticks.fetch_add(1, Ordering::Relaxed);
        if is_anomaly {
            self.anomalies.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_log_failure(&self) {
        self.log_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records the mean per-row cost of one batch run.
    pub fn record_batch(&self, duration: Duration, rows: usize) {
        if rows > 0 {
            let per_row = duration.as_nanos() as u64 / rows as u64;
            self.batch_row_hist.lock().record(per_row).ok();
        }
    }

    pub fn report(&self) -> MetricsReport {
        let tick = self.tick_hist.lock();
        let batch = self.batch_row_hist.lock();

        MetricsReport {
            tick_p50: Duration::from_nanos(tick.value_at_quantile(0.5)),
            tick_p99: Duration::from_nanos(tick.value_at_quantile(0.99)),
            tick_max: Duration::from_nanos(tick.max()),
            batch_row_p50: Duration::from_nanos(batch.value_at_quantile(0.5)),
            ticks: self.ticks.load(Ordering::Relaxed),
            anomalies: self.anomalies.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            log_failures: self.log_failures.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// METRICS REPORT - Summary statistics
// ============================================================================

#[derive(Debug)]
pub struct MetricsReport {
    pub tick_p50: Duration,
    pub tick_p99: Duration,
    pub tick_max: Duration,
    pub batch_row_p50: Duration,
    pub ticks: u64,
    pub anomalies: u64,
    pub rejected: u64,
    pub log_failures: u64,
}
