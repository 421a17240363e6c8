use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{EvaluatorError, EvaluatorResult};
use crate::ipc::AnomalyLog;
use crate::sensor::anomaly::Scorer;
use crate::sensor::generator::SignalSource;
use crate::sensor::window::{SlidingWindow, DEFAULT_WINDOW_CAPACITY};
use crate::sensor::LabeledSample;

/// Builds a fresh signal source for every new session.
pub type SourceFactory = Box<dyn FnMut() -> Box<dyn SignalSource> + Send>;

// ============================================================================
// EVALUATOR STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluatorState {
    Idle,
    Running,
    Paused,
}

impl fmt::Display for EvaluatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluatorState::Idle => write!(f, "idle"),
            EvaluatorState::Running => write!(f, "running"),
            EvaluatorState::Paused => write!(f, "paused"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    pub window_capacity: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self { window_capacity: DEFAULT_WINDOW_CAPACITY }
    }
}

/// Point-in-time copy of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub state: EvaluatorState,
    pub window: Vec<LabeledSample>,
    pub anomaly_count: u64,
    pub capacity: usize,
    pub ticks_since_reset: u64,
}

impl Snapshot {
    pub fn anomalies(&self) -> impl Iterator<Item = &LabeledSample> {
        self.window.iter().filter(|l| l.is_anomaly)
    }
}

// ============================================================================
// STREAM EVALUATOR - Externally ticked monitoring session
// ============================================================================

pub struct StreamEvaluator {
    scorer: Arc<Scorer>,
    log: AnomalyLog,
    factory: SourceFactory,
    source: Box<dyn SignalSource>,
    window: SlidingWindow,
    anomaly_count: u64,
    ticks_since_reset: u64,
    state: EvaluatorState,
}

impl StreamEvaluator {
    pub fn new<F, S>(
        scorer: Arc<Scorer>,
        log: AnomalyLog,
        config: EvaluatorConfig,
        mut factory: F,
    ) -> EvaluatorResult<Self>
    where
        F: FnMut() -> S + Send + 'static,
        S: SignalSource + 'static,
    {
        if config.window_capacity == 0 {
            return Err(EvaluatorError::InvalidConfig(
                "window capacity must be at least 1".into(),
            ));
        }

        let mut make_source: SourceFactory =
            Box::new(move || Box::new(factory()) as Box<dyn SignalSource>);
        let source = make_source();

        Ok(Self {
            scorer,
            log,
            factory: make_source,
            source,
            window: SlidingWindow::new(config.window_capacity),
            anomaly_count: 0,
            ticks_since_reset: 0,
            state: EvaluatorState::Idle,
        })
    }

    /// Opens (or creates) the anomaly log at `log_path` and builds the evaluator on it.
    pub fn open<F, S>(
        scorer: Arc<Scorer>,
        log_path: impl Into<PathBuf>,
        config: EvaluatorConfig,
        factory: F,
    ) -> EvaluatorResult<Self>
    where
        F: FnMut() -> S + Send + 'static,
        S: SignalSource + 'static,
    {
        let path = log_path.into();
        let log = AnomalyLog::open(&path)
            .map_err(|source| EvaluatorError::LogOpen { path, source })?;
        Self::new(scorer, log, config, factory)
    }

    pub fn state(&self) -> EvaluatorState {
        self.state
    }

    pub fn anomaly_count(&self) -> u64 {
        self.anomaly_count
    }

    /// Samples accepted into the window since the last reset.
    pub fn tick_count(&self) -> u64 {
        self.ticks_since_reset
    }

    pub fn log(&self) -> &AnomalyLog {
        &self.log
    }

    pub fn start(&mut self) {
        if self.state != EvaluatorState::Running {
            info!(from = %self.state, "monitoring started");
            self.state = EvaluatorState::Running;
        }
    }

    pub fn stop(&mut self) {
        if self.state == EvaluatorState::Running {
            info!(anomalies = self.anomaly_count, "monitoring paused");
            self.state = EvaluatorState::Paused;
        }
    }

    /// Clears window and counter and draws a fresh source. The anomaly log is kept.
    pub fn reset(&mut self) {
        self.window.clear();
        self.anomaly_count = 0;
        self.ticks_since_reset = 0;
        self.source = (self.factory)();
        self.state = EvaluatorState::Idle;
        info!("monitoring reset");
    }

    /// Draws, scores and records one sample.
    ///
    /// On `LogAppend` the window and counter already include the sample; the
    /// error carries the labeled sample so the classification is not lost.
    pub fn tick(&mut self) -> EvaluatorResult<LabeledSample> {
        if self.state != EvaluatorState::Running {
            return Err(EvaluatorError::InvalidState { operation: "tick", state: self.state });
        }

        let sample = self.source.next_sample();
        let labeled = match self.scorer.label(sample) {
            Ok(labeled) => labeled,
            Err(e) => {
                warn!(error = %e, "sample rejected");
                return Err(e.into());
            }
        };

        self.window.push(labeled.clone());
        self.ticks_since_reset += 1;

        if !labeled.is_anomaly {
            debug!(timestamp = %labeled.sample.timestamp, error = labeled.error, "normal");
            return Ok(labeled);
        }

        self.anomaly_count += 1;
        warn!(
            count = self.anomaly_count,
            timestamp = %labeled.sample.timestamp,
            error = labeled.error,
            "anomaly detected"
        );
        if let Err(source) = self.log.append(&labeled.sample) {
            warn!(path = %self.log.path().display(), error = %source, "anomaly log append failed");
            return Err(EvaluatorError::LogAppend { labeled, source });
        }
        Ok(labeled)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            window: self.window.to_vec(),
            anomaly_count: self.anomaly_count,
            capacity: self.window.capacity(),
            ticks_since_reset: self.ticks_since_reset,
        }
    }
}
