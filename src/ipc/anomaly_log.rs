use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::sensor::Sample;

pub const LOG_HEADER: &str = "timestamp,X,Y,Z\n";
pub const DEFAULT_LOG_PATH: &str = "logs/anomaly_log_realtime.csv";

/// One persisted anomaly row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub timestamp: String,
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
    #[serde(rename = "Z")]
    pub z: f64,
}

impl From<&Sample> for AnomalyRecord {
    fn from(sample: &Sample) -> Self {
        Self {
            timestamp: sample.timestamp.as_str().to_owned(),
            x: sample.x,
            y: sample.y,
            z: sample.z,
        }
    }
}

// Durable append-only anomaly log. Clones share one lock so appends from
// several evaluators never interleave.
#[derive(Clone, Debug)]
pub struct AnomalyLog {
    path: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
}

impl AnomalyLog {
    /// Opens `path`, creating it (and its directory) with the header if absent.
    /// An existing file is left untouched.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(LOG_HEADER.as_bytes())?;
                file.flush()?;
                tracing::info!(path = %path.display(), "created anomaly log");
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e),
        }
        Ok(Self {
            path: Arc::new(path),
            lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one complete line with a single write, then flushes and closes.
    pub fn append(&self, sample: &Sample) -> io::Result<()> {
        let line = render_line(&AnomalyRecord::from(sample))?;

        let _guard = self.lock.lock();
        let mut file = OpenOptions::new().create(true).append(true).open(self.path.as_ref())?;
        // recreated after external deletion: restore the header in the same write
        let buf = if file.metadata()?.len() == 0 {
            [LOG_HEADER.as_bytes(), &line].concat()
        } else {
            line
        };
        file.write_all(&buf)?;
        file.flush()
    }

    pub fn read_records(&self) -> Result<Vec<AnomalyRecord>, csv::Error> {
        let _guard = self.lock.lock();
        let mut rdr = csv::Reader::from_path(self.path.as_ref())?;
        rdr.deserialize().collect()
    }

    pub fn record_count(&self) -> Result<usize, csv::Error> {
        let _guard = self.lock.lock();
        let mut rdr = csv::Reader::from_path(self.path.as_ref())?;
        let mut count = 0;
        for record in rdr.records() {
            record?;
            count += 1;
        }
        Ok(count)
    }
}

fn render_line(record: &AnomalyRecord) -> io::Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    wtr.serialize(record).map_err(io::Error::other)?;
    wtr.into_inner().map_err(|e| io::Error::other(e.to_string()))
}
