//! IPC module - Durable anomaly log and the monitor event channel

pub mod anomaly_log;
pub mod channels;

pub use anomaly_log::{AnomalyLog, AnomalyRecord};
pub use channels::{MonitorChannels, MonitorEvent};
