use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{Sender, TrySendError};

use crate::error::EvaluatorError;
use crate::evaluator::{Snapshot, StreamEvaluator};
use crate::ipc::channels::MonitorEvent;
use crate::metrics::TimingMetrics;

pub struct MonitorOptions {
    pub interval: Duration,
    /// Stop after this many tick attempts; `None` runs until shutdown.
    pub max_ticks: Option<u64>,
}

/// Drives `evaluator` on its own thread at a fixed cadence. The thread
/// pauses the session on exit and returns its final snapshot.
pub fn spawn_monitor_thread(
    mut evaluator: StreamEvaluator,
    options: MonitorOptions,
    event_tx: Sender<MonitorEvent>,
    metrics: TimingMetrics,
) -> (thread::JoinHandle<Snapshot>, Arc<AtomicBool>) {
    let shutdown = Arc::new(AtomicBool::new(false));
    let stop_flag = shutdown.clone();

    let handle = thread::spawn(move || {
        evaluator.start();
        let mut attempts = 0u64;

        loop {
            if stop_flag.load(Ordering::Relaxed) {
                tracing::info!("monitor thread shutting down");
                break;
            }
            if options.max_ticks.is_some_and(|max| attempts >= max) {
                break;
            }
            let cycle_start = Instant::now();
            attempts += 1;

            let event = match evaluator.tick() {
                Ok(labeled) => {
                    metrics.record_tick(cycle_start.elapsed(), labeled.is_anomaly);
                    MonitorEvent::Tick { labeled, anomaly_count: evaluator.anomaly_count() }
                }
                Err(EvaluatorError::LogAppend { labeled, source }) => {
                    metrics.record_tick(cycle_start.elapsed(), labeled.is_anomaly);
                    metrics.record_log_failure();
                    MonitorEvent::LogFailure {
                        labeled,
                        anomaly_count: evaluator.anomaly_count(),
                        reason: source.to_string(),
                    }
                }
                Err(e) => {
                    metrics.record_rejected();
                    MonitorEvent::Rejected { reason: e.to_string() }
                }
            };

            match event_tx.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => tracing::debug!("event channel full, dropping event"),
                Err(TrySendError::Disconnected(_)) => {
                    tracing::info!("event receiver gone, stopping monitor");
                    break;
                }
            }

            // Sleep to maintain tick cadence
            let elapsed = cycle_start.elapsed();
            if elapsed < options.interval {
                thread::sleep(options.interval - elapsed);
            }
        }

        evaluator.stop();
        evaluator.snapshot()
    });

    (handle, shutdown)
}
