//! Anomaly-journal reading (JSON lines, one record per line).

use super::{IngestStats, Window};
use crate::event::{classify, CronRunOutcome, Event, EventKind, EventSource, RestartReason, Severity};
use crate::redact::Redactor;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JournalRecord {
    timestamp: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    job: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    provider: Option<String>,
}

fn parse_journal_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Naive local-ish timestamps are treated as UTC; best effort.
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn parse_severity(raw: &str) -> Option<Severity> {
    match raw.to_lowercase().as_str() {
        "error" | "critical" | "fatal" => Some(Severity::Error),
        "warn" | "warning" => Some(Severity::Warn),
        "info" | "debug" | "trace" => Some(Severity::Info),
        _ => None,
    }
}

/// Read the optional journal. Absence yields no events; malformed records
/// are counted and skipped, never fatal.
pub(super) fn read_journal(
    path: &Path,
    window: &Window,
    redactor: &Redactor,
    seq: &mut u64,
    stats: &mut IngestStats,
) -> Vec<Event> {
    let Ok(file) = File::open(path) else {
        tracing::debug!(path = %path.display(), "journal absent, skipping");
        return Vec::new();
    };

    let mut events = Vec::new();
    for line in BufReader::new(file).lines() {
        let Ok(line) = line else {
            stats.malformed_journal += 1;
            continue;
        };
        if line.trim().is_empty() {
            continue;
        }
        let Ok(record) = serde_json::from_str::<JournalRecord>(&line) else {
            stats.malformed_journal += 1;
            continue;
        };
        let Some(ts) = parse_journal_timestamp(record.timestamp.trim()) else {
            stats.malformed_journal += 1;
            continue;
        };
        if !window.contains(ts) {
            stats.out_of_window += 1;
            continue;
        }
        stats.parsed += 1;
        events.extend(record_to_events(record, ts, seq, redactor));
    }
    events
}

fn record_to_events(
    record: JournalRecord,
    ts: DateTime<Utc>,
    seq: &mut u64,
    redactor: &Redactor,
) -> Vec<Event> {
    let mut fields = BTreeMap::new();
    if let Some(job) = &record.job {
        fields.insert("job".to_string(), redactor.redact(job));
    }
    if let Some(status) = &record.status {
        fields.insert("status".to_string(), redactor.redact(status));
    }

    let mut events = match record.kind.as_deref() {
        Some("gateway_restart") => {
            let event = Event {
                timestamp: ts,
                seq: *seq,
                source: EventSource::Journal,
                severity: Severity::Warn,
                kind: EventKind::Restart(RestartReason::Watchdog),
                fields,
                model: None,
                provider: None,
            };
            *seq += 1;
            vec![event]
        }
        Some("cron_run") => {
            let Some(job) = record.job.as_deref() else {
                return Vec::new();
            };
            let job_id = redactor.redact(job.trim());
            let outcome = match record.status.as_deref() {
                Some("ok") | Some("success") | Some("completed") => CronRunOutcome::Completed,
                _ => CronRunOutcome::Failed,
            };
            let severity = match outcome {
                CronRunOutcome::Completed => Severity::Info,
                CronRunOutcome::Failed => Severity::Error,
            };
            let event = Event {
                timestamp: ts,
                seq: *seq,
                source: EventSource::Journal,
                severity,
                kind: EventKind::CronRun { job_id, outcome },
                fields,
                model: None,
                provider: None,
            };
            *seq += 1;
            vec![event]
        }
        _ => {
            // Anomaly-style records run the message through the same closed
            // classifier the logs use.
            let cleaned = redactor.redact(record.message.as_deref().unwrap_or(""));
            let mut inner = classify::classify_line(EventSource::Journal, ts, seq, &cleaned);
            for event in &mut inner {
                event.fields.extend(fields.clone());
            }
            inner
        }
    };

    let model = record.model.as_deref().map(|m| redactor.redact(m));
    let provider = record.provider.as_deref().map(|p| redactor.redact(p));
    let severity = record.severity.as_deref().and_then(parse_severity);
    for event in &mut events {
        if event.model.is_none() {
            event.model = model.clone();
        }
        if event.provider.is_none() {
            event.provider = provider.clone();
        }
        if let Some(severity) = severity {
            event.severity = event.severity.max(severity);
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window() -> Window {
        Window::ending_at(Utc.with_ymd_and_hms(2026, 2, 7, 12, 0, 0).unwrap(), 2)
    }

    fn read_lines(content: &str) -> (Vec<Event>, IngestStats) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("journal.jsonl");
        std::fs::write(&path, content).unwrap();
        let mut stats = IngestStats::default();
        let mut seq = 0;
        let events = read_journal(&path, &window(), &Redactor::default(), &mut seq, &mut stats);
        (events, stats)
    }

    #[test]
    fn test_restart_record() {
        let (events, _) = read_lines(
            r#"{"timestamp":"2026-02-07T11:10:00Z","type":"gateway_restart"}"#,
        );
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].kind,
            EventKind::Restart(RestartReason::Watchdog)
        );
        assert_eq!(events[0].source, EventSource::Journal);
    }

    #[test]
    fn test_cron_run_record() {
        let (events, _) = read_lines(
            r#"{"timestamp":"2026-02-07T11:20:00Z","type":"cron_run","job":"heartbeat","status":"ok"}"#,
        );
        assert_eq!(
            events[0].kind,
            EventKind::CronRun {
                job_id: "heartbeat".to_string(),
                outcome: CronRunOutcome::Completed
            }
        );
    }

    #[test]
    fn test_cron_run_failure_record() {
        let (events, _) = read_lines(
            r#"{"timestamp":"2026-02-07T11:20:00Z","type":"cron_run","job":"heartbeat","status":"error"}"#,
        );
        assert_eq!(
            events[0].kind,
            EventKind::CronRun {
                job_id: "heartbeat".to_string(),
                outcome: CronRunOutcome::Failed
            }
        );
        assert_eq!(events[0].severity, Severity::Error);
    }

    #[test]
    fn test_anomaly_record_goes_through_classifier() {
        let (events, _) = read_lines(
            r#"{"timestamp":"2026-02-07T11:30:00Z","type":"anomaly","severity":"error","message":"429 rate limit exceeded"}"#,
        );
        assert_eq!(
            events[0].kind,
            EventKind::RateLimit {
                reset_after_secs: None
            }
        );
        // Journal severity wins over the classifier's warn.
        assert_eq!(events[0].severity, Severity::Error);
    }

    #[test]
    fn test_malformed_records_counted_not_fatal() {
        let (events, stats) = read_lines(
            "not json at all\n\
             {\"timestamp\":\"garbage\",\"type\":\"anomaly\"}\n\
             {\"timestamp\":\"2026-02-07T11:30:00Z\",\"type\":\"gateway_restart\"}\n",
        );
        assert_eq!(events.len(), 1);
        assert_eq!(stats.malformed_journal, 2);
    }

    #[test]
    fn test_naive_timestamp_treated_as_utc() {
        let (events, _) = read_lines(
            r#"{"timestamp":"2026-02-07T11:10:00.123","type":"gateway_restart"}"#,
        );
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_out_of_window_record_dropped() {
        let (events, stats) = read_lines(
            r#"{"timestamp":"2026-02-07T01:00:00Z","type":"gateway_restart"}"#,
        );
        assert!(events.is_empty());
        assert_eq!(stats.out_of_window, 1);
    }
}
