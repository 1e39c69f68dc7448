//! Critical-section audit trail
//!
//! One record per entry and per exit, appended in the order the worker
//! observes them. The file form is one human-readable line per record:
//!
//! ```text
//! 2024.05.01.13:45:12 - 6f9619ff-8b86-d011-b42d-00cf4fc964ff entered critical section
//! ```

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::membership::ProcessId;

/// Timestamp layout of an audit line
pub const AUDIT_TIMESTAMP_FORMAT: &str = "%Y.%m.%d.%H:%M:%S";

/// Audited event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Entered,
    Left,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Entered => "entered critical section",
            AuditAction::Left => "left critical section",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Local>,
    pub process: ProcessId,
    pub round: u64,
    pub action: AuditAction,
}

impl AuditRecord {
    /// Record an event happening now.
    pub fn now(process: ProcessId, round: u64, action: AuditAction) -> Self {
        Self {
            timestamp: Local::now(),
            process,
            round,
            action,
        }
    }

    /// Line written to the audit file
    pub fn to_line(&self) -> String {
        format!(
            "{} - {} {}",
            self.timestamp.format(AUDIT_TIMESTAMP_FORMAT),
            self.process,
            self.action
        )
    }
}

/// Audit sink
pub trait AuditLog: Send + Sync {
    /// Append a record; visible to readers once this returns.
    fn append(&self, record: &AuditRecord) -> io::Result<()>;

    /// Flush buffered records to durable storage.
    fn sync(&self) -> io::Result<()>;
}

fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "audit lock poisoned")
}

/// Append-only audit file shared by every process of a simulation.
#[derive(Debug, Clone)]
pub struct FileAuditLog {
    path: PathBuf,
    writer: Arc<Mutex<BufWriter<File>>>,
}

impl FileAuditLog {
    /// Open or create an audit file. Existing content is kept.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            writer: Arc::new(Mutex::new(BufWriter::new(file))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditLog for FileAuditLog {
    fn append(&self, record: &AuditRecord) -> io::Result<()> {
        let mut writer = self.writer.lock().map_err(|_| poisoned())?;
        writeln!(writer, "{}", record.to_line())?;
        writer.flush()
    }

    fn sync(&self) -> io::Result<()> {
        let mut writer = self.writer.lock().map_err(|_| poisoned())?;
        writer.flush()?;
        writer.get_ref().sync_all()
    }
}

/// In-memory audit log for testing.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditLog {
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditLog for MemoryAuditLog {
    fn append(&self, record: &AuditRecord) -> io::Result<()> {
        self.records
            .lock()
            .map_err(|_| poisoned())?
            .push(record.clone());
        Ok(())
    }

    fn sync(&self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::tempdir;

    fn pid() -> ProcessId {
        ProcessId::from_u128(0x6f9619ff_8b86_d011_b42d_00cf4fc964ff)
    }

    #[test]
    fn test_line_format() {
        let record = AuditRecord {
            timestamp: Local.with_ymd_and_hms(2024, 5, 1, 13, 45, 12).unwrap(),
            process: pid(),
            round: 1,
            action: AuditAction::Entered,
        };

        assert_eq!(
            record.to_line(),
            "2024.05.01.13:45:12 - 6f9619ff-8b86-d011-b42d-00cf4fc964ff entered critical section"
        );
    }

    #[test]
    fn test_left_line() {
        let record = AuditRecord::now(pid(), 3, AuditAction::Left);
        assert!(record.to_line().ends_with(" - 6f9619ff-8b86-d011-b42d-00cf4fc964ff left critical section"));
    }

    #[test]
    fn test_memory_audit_log() {
        let log = MemoryAuditLog::new();
        assert!(log.is_empty());

        log.append(&AuditRecord::now(pid(), 1, AuditAction::Entered)).unwrap();
        log.append(&AuditRecord::now(pid(), 1, AuditAction::Left)).unwrap();

        let records = log.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].action, AuditAction::Entered);
        assert_eq!(records[1].action, AuditAction::Left);
    }

    #[test]
    fn test_file_audit_log_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("operacoes-criticas.txt");
        fs::write(&path, "existing line\n").unwrap();

        let log = FileAuditLog::open(&path).unwrap();
        log.append(&AuditRecord::now(pid(), 1, AuditAction::Entered)).unwrap();
        log.append(&AuditRecord::now(pid(), 1, AuditAction::Left)).unwrap();
        log.sync().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "existing line");
        assert!(lines[1].ends_with("entered critical section"));
        assert!(lines[2].ends_with("left critical section"));
    }

    #[test]
    fn test_record_json() {
        let record = AuditRecord::now(pid(), 7, AuditAction::Entered);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["action"], "entered");
        assert_eq!(json["round"], 7);
    }
}
