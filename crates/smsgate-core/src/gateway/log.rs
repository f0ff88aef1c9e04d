//! Day-keyed gateway traffic log
//!
//! Every gateway attempt, success or failure, is appended to
//! `outgoing_YYYY-MM-DD.log` under the configured directory. Writes are
//! best effort and sit outside the dispatch control flow: a log failure
//! must never change a send result.

use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::warn;

/// Append-only traffic log rotated by calendar day
#[derive(Debug, Clone)]
pub struct TrafficLog {
    dir: PathBuf,
}

impl TrafficLog {
    /// Create a new traffic log under the given directory
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Append one line to today's log
    pub fn append(&self, line: &str) {
        if let Err(e) = self.try_append(line) {
            warn!("Gateway traffic log write failed: {}", e);
        }
    }

    fn try_append(&self, line: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let now = Utc::now();
        let path = self.dir.join(format!("outgoing_{}.log", now.format("%Y-%m-%d")));

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{} {}", now.format("%Y-%m-%d %H:%M:%S"), line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_creates_day_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = TrafficLog::new(dir.path().to_path_buf());

        log.append("SEND: phone=+79167193249, port=1");
        log.append("RESULT: status=sent");

        let expected = dir
            .path()
            .join(format!("outgoing_{}.log", Utc::now().format("%Y-%m-%d")));
        let content = std::fs::read_to_string(expected).unwrap();
        assert!(content.contains("RESULT: status=sent"));
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_append_to_unwritable_dir_does_not_panic() {
        let log = TrafficLog::new(PathBuf::from("/proc/no-such-dir"));
        log.append("should be swallowed");
    }
}
