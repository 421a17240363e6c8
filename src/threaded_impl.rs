//! Threaded driver - Calls `tick()` on a fixed cadence from a background thread

pub mod monitor_thread;

pub use monitor_thread::{spawn_monitor_thread, MonitorOptions};
