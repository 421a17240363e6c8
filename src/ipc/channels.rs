use crossbeam::channel::{bounded, Receiver, Sender};

use crate::sensor::LabeledSample;

#[derive(Clone)]
pub struct MonitorChannels {
    // Monitor thread -> presentation layer
    pub event_tx: Sender<MonitorEvent>,
    pub event_rx: Receiver<MonitorEvent>,
}

#[derive(Clone, Debug)]
pub enum MonitorEvent {
    Tick {
        labeled: LabeledSample,
        anomaly_count: u64,
    },
    /// Classified and counted, but not persisted to the anomaly log.
    LogFailure {
        labeled: LabeledSample,
        anomaly_count: u64,
        reason: String,
    },
    Rejected {
        reason: String,
    },
}

impl MonitorChannels {
    pub fn new(buffer_size: usize) -> Self {
        let (event_tx, event_rx) = bounded(buffer_size);
        Self { event_tx, event_rx }
    }
}
