pub mod config;
pub mod error;
pub mod evaluator;
pub mod ipc;
pub mod metrics;
pub mod model;
pub mod sensor;
pub mod threaded_impl;

pub use error::{BatchError, EvaluatorError, ModelLoadError, ScoreError};
pub use evaluator::{BatchEvaluator, EvaluatorConfig, EvaluatorState, Snapshot, StreamEvaluator};
pub use ipc::{AnomalyLog, AnomalyRecord};
pub use model::{ReconstructionModel, Transform};
pub use sensor::anomaly::{Score, Scorer};
pub use sensor::generator::{SignalSource, VibrationSimulator};
pub use sensor::{LabeledSample, Sample, Timestamp};
