use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{BatchError, BatchResult, RowIssue, SchemaReport};
use crate::sensor::anomaly::Scorer;
use crate::sensor::{LabeledSample, Sample, Timestamp};

pub const REQUIRED_COLUMNS: [&str; 4] = ["timestamp", "X", "Y", "Z"];
const AXIS_COLUMNS: [&str; 3] = ["X", "Y", "Z"];

/// One untyped input row: column name to cell text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(BTreeMap<String, String>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.0.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[derive(Serialize)]
struct LabeledRow<'a> {
    timestamp: &'a str,
    #[serde(rename = "X")]
    x: f64,
    #[serde(rename = "Y")]
    y: f64,
    #[serde(rename = "Z")]
    z: f64,
    #[serde(rename = "Anomaly")]
    anomaly: bool,
}

/// Scores every row on its own: no window, no counter, no log.
pub struct BatchEvaluator {
    scorer: Arc<Scorer>,
}

impl BatchEvaluator {
    pub fn new(scorer: Arc<Scorer>) -> Self {
        Self { scorer }
    }

    pub fn evaluate(&self, dataset: &[Sample]) -> BatchResult<Vec<LabeledSample>> {
        dataset
            .iter()
            .map(|sample| self.scorer.label(sample.clone()).map_err(BatchError::from))
            .collect()
    }

    /// Validates every row before scoring any of them.
    pub fn evaluate_records(&self, records: &[Record]) -> BatchResult<Vec<LabeledSample>> {
        let samples = parse_records(records)?;
        self.evaluate(&samples)
    }

    pub fn evaluate_csv<R: io::Read>(&self, reader: R) -> BatchResult<Vec<LabeledSample>> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: csv::StringRecord = rdr
            .headers()?
            .iter()
            .enumerate()
            // spreadsheet exports often lead with a UTF-8 byte order mark
            .map(|(i, h)| if i == 0 { h.trim_start_matches('\u{feff}') } else { h })
            .collect();
        let missing_header: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|&&col| !headers.iter().any(|h| h == col))
            .map(|col| col.to_string())
            .collect();
        if !missing_header.is_empty() {
            return Err(BatchError::Schema(SchemaReport { missing_header, rows: vec![] }));
        }

        let mut records = Vec::new();
        for row in rdr.records() {
            let row = row?;
            records.push(headers.iter().zip(row.iter()).collect::<Record>());
        }
        tracing::debug!(rows = records.len(), "parsed batch csv");
        self.evaluate_records(&records)
    }
}

fn parse_records(records: &[Record]) -> BatchResult<Vec<Sample>> {
    let mut report = SchemaReport::default();
    let mut samples = Vec::with_capacity(records.len());

    for (row, record) in records.iter().enumerate() {
        let present = |col: &str| record.get(col).filter(|v| !v.is_empty());

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|&&col| present(col).is_none())
            .map(|col| col.to_string())
            .collect();

        let mut axes = [0.0; 3];
        let mut invalid = Vec::new();
        for (slot, col) in axes.iter_mut().zip(AXIS_COLUMNS) {
            if let Some(text) = present(col) {
                match text.parse::<f64>() {
                    Ok(v) if v.is_finite() => *slot = v,
                    _ => invalid.push(col.to_string()),
                }
            }
        }

        if !missing.is_empty() || !invalid.is_empty() {
            report.rows.push(RowIssue { row, missing, invalid });
            continue;
        }
        if let Some(ts) = present("timestamp") {
            let [x, y, z] = axes;
            samples.push(Sample::new(Timestamp::new(ts), x, y, z));
        }
    }

    if report.is_empty() {
        Ok(samples)
    } else {
        Err(BatchError::Schema(report))
    }
}

/// Writes `timestamp,X,Y,Z,Anomaly` in input order.
pub fn write_csv<W: io::Write>(writer: W, rows: &[LabeledSample]) -> BatchResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(LabeledRow {
            timestamp: row.sample.timestamp.as_str(),
            x: row.sample.x,
            y: row.sample.y,
            z: row.sample.z,
            anomaly: row.is_anomaly,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub anomaly_count: usize,
    pub anomalies: Vec<LabeledSample>,
}

impl BatchSummary {
    pub fn from_rows(rows: &[LabeledSample]) -> Self {
        let anomalies: Vec<LabeledSample> = rows.iter().filter(|r| r.is_anomaly).cloned().collect();
        Self {
            total: rows.len(),
            anomaly_count: anomalies.len(),
            anomalies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ReconstructionModel, Transform};

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

    fn batch() -> BatchEvaluator {
        BatchEvaluator::new(Arc::new(Scorer::new(Identity, Origin, 0.01).unwrap()))
    }

    fn row(ts: &str, x: &str, y: &str, z: Option<&str>) -> Record {
        let mut r: Record = [("timestamp", ts), ("X", x), ("Y", y)].into_iter().collect();
        if let Some(z) = z {
            r.insert("Z", z);
        }
        r
    }

    #[test]
    fn missing_column_rejects_whole_batch() {
        let records = vec![
            row("t0", "0", "0", Some("0")),
            row("t1", "1", "0", Some("0")),
            row("t2", "0", "0", None),
            row("t3", "0", "1", Some("0")),
            row("t4", "0", "0", Some("1")),
        ];
        match batch().evaluate_records(&records) {
            Err(BatchError::Schema(report)) => {
                assert_eq!(report.rows.len(), 1);
                assert_eq!(report.rows[0].row, 2);
                assert_eq!(report.rows[0].missing, vec!["Z".to_string()]);
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn non_numeric_axis_is_reported() {
        let records = vec![row("t0", "abc", "0", Some(""))];
        let Err(BatchError::Schema(report)) = batch().evaluate_records(&records) else {
            panic!("expected schema error");
        };
        assert_eq!(report.rows[0].invalid, vec!["X".to_string()]);
        assert_eq!(report.rows[0].missing, vec!["Z".to_string()]);
    }

    #[test]
    fn csv_missing_header_column() {
        let input = "timestamp,X,Y\n2024-01-01 00:00:00,0.1,0.2\n";
        let Err(BatchError::Schema(report)) = batch().evaluate_csv(input.as_bytes()) else {
            panic!("expected schema error");
        };
        assert_eq!(report.missing_header, vec!["Z".to_string()]);
    }

    #[test]
    fn csv_rows_keep_order_and_timestamps() {
        let input = "\
timestamp,X,Y,Z,extra
2024-01-01 00:00:00,0.0,0.0,0.0,a
2024-01-01 00:00:01,1.0,0.0,0.0,b
2024-01-01 00:00:02,0.01,0.01,0.01,c
";
        let rows = batch().evaluate_csv(input.as_bytes()).unwrap();
        let flags: Vec<bool> = rows.iter().map(|r| r.is_anomaly).collect();
        assert_eq!(flags, vec![false, true, false]);
        assert_eq!(rows[1].sample.timestamp.as_str(), "2024-01-01 00:00:01");

        let summary = BatchSummary::from_rows(&rows);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.anomaly_count, 1);

        let mut out = Vec::new();
        write_csv(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("timestamp,X,Y,Z,Anomaly"));
        assert_eq!(lines.nth(1), Some("2024-01-01 00:00:01,1.0,0.0,0.0,true"));
    }

    #[test]
    fn short_csv_row_counts_as_missing() {
        let input = "timestamp,X,Y,Z\nt0,0,0,0\nt1,0,0\n";
        let Err(BatchError::Schema(report)) = batch().evaluate_csv(input.as_bytes()) else {
            panic!("expected schema error");
        };
        assert_eq!(report.rows[0].row, 1);
        assert_eq!(report.rows[0].missing, vec!["Z".to_string()]);
    }

    #[test]
    fn csv_with_byte_order_mark_is_accepted() {
        let input = "\u{feff}timestamp,X,Y,Z\nt0,0,0,0\nt1,1,0,0\n";
        let rows = batch().evaluate_csv(input.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sample.timestamp.as_str(), "t0");
        assert!(rows[1].is_anomaly);
    }
}
