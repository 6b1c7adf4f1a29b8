//! Evidence ingestion.
//!
//! Reads the two rolling gateway logs (mandatory) and the anomaly journal
//! (optional), time-bounds every record against one shared window cutoff,
//! redacts every raw string, and classifies the result into the merged
//! [`Event`](crate::event::Event) stream. Redaction here is the
//! synchronization barrier: no aggregator ever sees an unredacted byte.
//!
//! Failure tolerance is line-granular: malformed records are counted and
//! skipped, while a missing or unreadable mandatory log aborts the run.

pub mod error;
mod journal;
mod logs;

pub use error::SourceError;

use crate::event::{Event, EventSource};
use crate::redact::Redactor;
use chrono::{DateTime, Duration, Utc};
use std::path::{Path, PathBuf};

/// The lookback window for one run.
///
/// The cutoff is computed exactly once from `now`; every component reasons
/// about the same boundary.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub now: DateTime<Utc>,
    pub since: DateTime<Utc>,
    pub hours: u32,
}

impl Window {
    /// Build the window ending at `now` and spanning `hours` back.
    pub fn ending_at(now: DateTime<Utc>, hours: u32) -> Self {
        Self {
            now,
            since: now - Duration::hours(i64::from(hours)),
            hours,
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.since && ts <= self.now
    }
}

/// Evidence file locations for one run.
#[derive(Debug, Clone)]
pub struct SourcePaths {
    pub gateway_log: PathBuf,
    pub gateway_err_log: PathBuf,
    pub journal: Option<PathBuf>,
}

/// Line-granular ingestion counters, surfaced in the infrastructure section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub parsed: u64,
    pub deduplicated: u64,
    pub skipped_no_timestamp: u64,
    pub out_of_window: u64,
    pub malformed_journal: u64,
}

/// Read, redact, and classify every evidence source.
///
/// Returns the merged event sequence sorted by `(timestamp, seq)` plus the
/// ingestion counters. A missing journal yields no events and no error; a
/// missing mandatory log is fatal.
pub fn read_events(
    paths: &SourcePaths,
    window: &Window,
    redactor: &Redactor,
) -> Result<(Vec<Event>, IngestStats), SourceError> {
    let mut stats = IngestStats::default();
    let mut seq: u64 = 0;
    let mut events = Vec::new();

    events.extend(logs::read_log(
        &paths.gateway_log,
        EventSource::GatewayLog,
        window,
        redactor,
        &mut seq,
        &mut stats,
    )?);
    events.extend(logs::read_log(
        &paths.gateway_err_log,
        EventSource::GatewayErrLog,
        window,
        redactor,
        &mut seq,
        &mut stats,
    )?);

    if let Some(journal_path) = paths.journal.as_deref() {
        events.extend(journal::read_journal(
            journal_path,
            window,
            redactor,
            &mut seq,
            &mut stats,
        ));
    }

    events.sort_by_key(|e| (e.timestamp, e.seq));

    tracing::debug!(
        parsed = stats.parsed,
        deduplicated = stats.deduplicated,
        no_timestamp = stats.skipped_no_timestamp,
        out_of_window = stats.out_of_window,
        malformed_journal = stats.malformed_journal,
        events = events.len(),
        "ingestion complete"
    );

    Ok((events, stats))
}

/// Require that a mandatory source exists before reading it.
pub(crate) fn require_mandatory(path: &Path) -> Result<(), SourceError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(SourceError::MissingMandatory(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use chrono::TimeZone;
    use std::io::Write;

    fn window() -> Window {
        Window::ending_at(Utc.with_ymd_and_hms(2026, 2, 7, 12, 0, 0).unwrap(), 2)
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_window_bounds() {
        let w = window();
        assert!(w.contains(Utc.with_ymd_and_hms(2026, 2, 7, 11, 0, 0).unwrap()));
        assert!(w.contains(w.since));
        assert!(w.contains(w.now));
        assert!(!w.contains(Utc.with_ymd_and_hms(2026, 2, 7, 9, 59, 59).unwrap()));
        assert!(!w.contains(Utc.with_ymd_and_hms(2026, 2, 7, 12, 0, 1).unwrap()));
    }

    #[test]
    fn test_missing_mandatory_log_is_fatal() {
        let dir = tempfile::TempDir::new().unwrap();
        let err_log = write_file(&dir, "gateway.err.log", "");
        let paths = SourcePaths {
            gateway_log: dir.path().join("gateway.log"),
            gateway_err_log: err_log,
            journal: None,
        };
        let result = read_events(&paths, &window(), &Redactor::default());
        assert!(matches!(result, Err(SourceError::MissingMandatory(_))));
    }

    #[test]
    fn test_missing_journal_is_tolerated() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = write_file(
            &dir,
            "gateway.log",
            "2026-02-07T11:30:00Z [gateway] info listening\n",
        );
        let err_log = write_file(&dir, "gateway.err.log", "");
        let paths = SourcePaths {
            gateway_log: log,
            gateway_err_log: err_log,
            journal: Some(dir.path().join("absent.jsonl")),
        };
        let (events, _) = read_events(&paths, &window(), &Redactor::default()).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_events_merged_and_sorted() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = write_file(
            &dir,
            "gateway.log",
            "2026-02-07T11:45:00Z [gateway] info provider=openai model=gpt-5.2 completed\n",
        );
        let err_log = write_file(
            &dir,
            "gateway.err.log",
            "2026-02-07T11:15:00Z [gateway] Uncaught exception\n",
        );
        let paths = SourcePaths {
            gateway_log: log,
            gateway_err_log: err_log,
            journal: None,
        };
        let (events, _) = read_events(&paths, &window(), &Redactor::default()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::Crash);
        assert_eq!(events[1].kind, EventKind::Success);
        assert!(events[0].timestamp < events[1].timestamp);
    }

    #[test]
    fn test_window_filtering_and_counters() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = write_file(
            &dir,
            "gateway.log",
            "2026-02-07T08:00:00Z [gateway] info too old\n\
             no timestamp on this line\n\
             2026-02-07T11:00:00Z [gateway] info in window\n\
             2026-02-07T11:00:00Z [gateway] info in window\n",
        );
        let err_log = write_file(&dir, "gateway.err.log", "");
        let paths = SourcePaths {
            gateway_log: log,
            gateway_err_log: err_log,
            journal: None,
        };
        let (events, stats) = read_events(&paths, &window(), &Redactor::default()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(stats.out_of_window, 1);
        assert_eq!(stats.skipped_no_timestamp, 1);
        assert_eq!(stats.deduplicated, 1);
    }

    #[test]
    fn test_raw_fields_are_redacted_before_events_exist() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = write_file(
            &dir,
            "gateway.log",
            "2026-02-07T11:00:00Z [gateway] info api_key=sk-abcdef1234567890abcdef accepted\n",
        );
        let err_log = write_file(&dir, "gateway.err.log", "");
        let paths = SourcePaths {
            gateway_log: log,
            gateway_err_log: err_log,
            journal: None,
        };
        let (events, _) = read_events(&paths, &window(), &Redactor::default()).unwrap();
        for event in &events {
            for (key, value) in &event.fields {
                assert!(!key.contains("sk-abcdef"), "key leaked: {key}");
                assert!(!value.contains("sk-abcdef"), "value leaked: {value}");
            }
        }
    }
}
