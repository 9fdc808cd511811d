// 12.0 snapshot.rs: diagnostic pnl snapshot written on every bar.
// purely informational. nothing in the engines reads it back.

use crate::types::{InstrumentId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionLine {
    pub instrument: InstrumentId,
    pub symbol: String,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnlSnapshot {
    pub bar_time: Timestamp,
    pub total_pnl: Decimal,
    pub positions: Vec<PositionLine>,
}

impl PnlSnapshot {
    /// Single-record text form: bar time followed by total pnl.
    pub fn render(&self) -> String {
        format!("{} {}\n", self.bar_time, self.total_pnl)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Failed to write snapshot to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub trait SnapshotSink {
    fn write_snapshot(&mut self, snapshot: &PnlSnapshot) -> Result<(), SinkError>;
}

/// Overwrites one file with the latest snapshot on every write.
#[derive(Debug, Clone)]
pub struct FileSnapshotSink {
    path: PathBuf,
}

impl FileSnapshotSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSink for FileSnapshotSink {
    fn write_snapshot(&mut self, snapshot: &PnlSnapshot) -> Result<(), SinkError> {
        fs::write(&self.path, snapshot.render()).map_err(|source| SinkError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Keeps every snapshot in memory. used by the simulator and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub snapshots: Vec<PnlSnapshot>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&PnlSnapshot> {
        self.snapshots.last()
    }
}

impl SnapshotSink for MemorySink {
    fn write_snapshot(&mut self, snapshot: &PnlSnapshot) -> Result<(), SinkError> {
        self.snapshots.push(snapshot.clone());
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn write_snapshot(&mut self, _snapshot: &PnlSnapshot) -> Result<(), SinkError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot(ms: i64, pnl: Decimal) -> PnlSnapshot {
        PnlSnapshot {
            bar_time: Timestamp::from_millis(ms),
            total_pnl: pnl,
            positions: Vec::new(),
        }
    }

    #[test]
    fn file_sink_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("account.txt");
        let mut sink = FileSnapshotSink::new(&path);

        sink.write_snapshot(&snapshot(0, dec!(12.5))).unwrap();
        sink.write_snapshot(&snapshot(60_000, dec!(-3))).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "1970-01-01 00:01:00.000 -3\n");
    }

    #[test]
    fn file_sink_reports_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSnapshotSink::new(dir.path().join("missing").join("account.txt"));
        let err = sink.write_snapshot(&snapshot(0, dec!(1))).unwrap_err();
        assert!(matches!(err, SinkError::Io { .. }));
    }

    #[test]
    fn memory_sink_keeps_history() {
        let mut sink = MemorySink::new();
        sink.write_snapshot(&snapshot(1, dec!(1))).unwrap();
        sink.write_snapshot(&snapshot(2, dec!(2))).unwrap();
        assert_eq!(sink.snapshots.len(), 2);
        assert_eq!(sink.last().unwrap().total_pnl, dec!(2));
    }
}
