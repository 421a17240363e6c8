//! Evaluator module - Streaming session state machine and independent batch scoring

pub mod batch;
pub mod stream;

pub use batch::{BatchEvaluator, BatchSummary, Record};
pub use stream::{EvaluatorConfig, EvaluatorState, Snapshot, StreamEvaluator};
