use std::sync::Arc;
use std::time::Duration;

use vibration_monitor::error::BatchError;
use vibration_monitor::evaluator::{
    BatchEvaluator, EvaluatorConfig, EvaluatorState, StreamEvaluator,
};
use vibration_monitor::ipc::{AnomalyLog, MonitorChannels, MonitorEvent};
use vibration_monitor::metrics::TimingMetrics;
use vibration_monitor::sensor::generator::SignalSource;
use vibration_monitor::threaded_impl::{spawn_monitor_thread, MonitorOptions};
use vibration_monitor::{
    EvaluatorError, ModelLoadError, ReconstructionModel, Sample, Scorer, Timestamp, Transform,
};

struct Identity;

impl Transform for Identity {
    fn dimension(&self) -> usize {
        3
    }
    fn transform(&self, input: &[f64]) -> Vec<f64> {
        input.to_vec()
    }
}

struct Origin;

impl ReconstructionModel for Origin {
    fn input_dimension(&self) -> usize {
        3
    }
    fn output_dimension(&self) -> usize {
        3
    }
    fn reconstruct(&self, _normalized: &[f64]) -> Vec<f64> {
        vec![0.0; 3]
    }
}

/// Every sample is far from the origin.
struct AlwaysSpiking(u64);

impl SignalSource for AlwaysSpiking {
    fn next_sample(&mut self) -> Sample {
        self.0 += 1;
        Sample::new(Timestamp::logical(self.0), 4.0, 4.0, 4.0)
    }
}

fn spiking_evaluator(log: AnomalyLog) -> StreamEvaluator {
    let scorer = Arc::new(Scorer::new(Identity, Origin, 0.01).unwrap());
    let config = EvaluatorConfig { window_capacity: 4 };
    StreamEvaluator::new(scorer, log, config, || AlwaysSpiking(0)).unwrap()
}

#[test]
fn unwritable_log_commits_state_and_reports() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.csv");
    let log = AnomalyLog::open(&path).unwrap();
    let mut ev = spiking_evaluator(log);
    ev.start();
    ev.tick().unwrap();

    // swap the log file for a directory so the next append fails
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();

    let err = ev.tick().unwrap_err();
    assert!(err.is_warning());
    match err {
        EvaluatorError::LogAppend { labeled, .. } => {
            assert!(labeled.is_anomaly);
            assert_eq!(labeled.sample.timestamp.as_str(), "2");
        }
        other => panic!("expected log append failure, got {:?}", other),
    }

    let snap = ev.snapshot();
    assert_eq!(snap.state, EvaluatorState::Running);
    assert_eq!(snap.anomaly_count, 2);
    assert_eq!(snap.window.len(), 2);

    // the session keeps going once the log is writable again
    std::fs::remove_dir(&path).unwrap();
    ev.tick().unwrap();
    assert_eq!(ev.anomaly_count(), 3);
    assert_eq!(ev.log().record_count().unwrap(), 1);
}

#[test]
fn deleted_log_is_recreated_with_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.csv");
    let log = AnomalyLog::open(&path).unwrap();
    let mut ev = spiking_evaluator(log.clone());
    ev.start();
    ev.tick().unwrap();

    std::fs::remove_file(&path).unwrap();
    ev.tick().unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("timestamp,X,Y,Z\n"));
    assert_eq!(log.record_count().unwrap(), 1);
}

#[test]
fn mismatched_scorer_rejects_without_state_change() {
    struct Wide;
    impl Transform for Wide {
        fn dimension(&self) -> usize {
            4
        }
        fn transform(&self, input: &[f64]) -> Vec<f64> {
            input.to_vec()
        }
    }
    struct WideModel;
    impl ReconstructionModel for WideModel {
        fn input_dimension(&self) -> usize {
            4
        }
        fn output_dimension(&self) -> usize {
            4
        }
        fn reconstruct(&self, _normalized: &[f64]) -> Vec<f64> {
            vec![0.0; 4]
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let log = AnomalyLog::open(dir.path().join("log.csv")).unwrap();
    let scorer = Arc::new(Scorer::new(Wide, WideModel, 0.01).unwrap());
    let config = EvaluatorConfig::default();
    let mut ev = StreamEvaluator::new(scorer, log.clone(), config, || AlwaysSpiking(0)).unwrap();
    ev.start();
    let before = ev.snapshot();

    assert!(matches!(ev.tick(), Err(EvaluatorError::Score(_))));
    assert_eq!(ev.snapshot(), before);
    assert_eq!(log.record_count().unwrap(), 0);
}

#[test]
fn corrupt_artifact_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let models = concat!(env!("CARGO_MANIFEST_DIR"), "/models");
    std::fs::copy(format!("{}/scaler.json", models), dir.path().join("scaler.json")).unwrap();
    std::fs::write(dir.path().join("autoencoder.json"), "{ \"layers\": [").unwrap();

    let err: ModelLoadError = Scorer::from_artifacts(dir.path(), 0.01).unwrap_err();
    assert_eq!(err.artifact, "autoencoder");
}

#[test]
fn missing_artifact_dir_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Scorer::from_artifacts(dir.path().join("nope"), 0.01).is_err());
}

#[test]
fn non_numeric_batch_cell_is_schema_error() {
    let scorer = Arc::new(Scorer::new(Identity, Origin, 0.01).unwrap());
    let input = "timestamp,X,Y,Z\nt0,0.1,0.1,0.1\nt1,0.1,abc,0.1\n";
    match BatchEvaluator::new(scorer).evaluate_csv(input.as_bytes()) {
        Err(BatchError::Schema(report)) => {
            assert_eq!(report.rows.len(), 1);
            assert_eq!(report.rows[0].row, 1);
            assert_eq!(report.rows[0].invalid, vec!["Y"]);
        }
        other => panic!("expected schema error, got {:?}", other),
    }
}

#[test]
fn full_event_channel_does_not_stall_monitor() {
    let dir = tempfile::tempdir().unwrap();
    let log = AnomalyLog::open(dir.path().join("log.csv")).unwrap();
    let ev = spiking_evaluator(log);
    let MonitorChannels { event_tx, event_rx } = MonitorChannels::new(1);
    let metrics = TimingMetrics::new().unwrap();

    let (handle, _shutdown) = spawn_monitor_thread(
        ev,
        MonitorOptions { interval: Duration::from_millis(1), max_ticks: Some(10) },
        event_tx,
        metrics.clone(),
    );
    let snapshot = handle.join().unwrap();

    // nobody drained the channel, yet every tick ran
    assert_eq!(snapshot.anomaly_count, 10);
    assert_eq!(metrics.report().ticks, 10);
    let events: Vec<MonitorEvent> = event_rx.try_iter().collect();
    assert_eq!(events.len(), 1);
}
