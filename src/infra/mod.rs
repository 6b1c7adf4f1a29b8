//! Infrastructure summary.
//!
//! Collects process restart and crash evidence for the report's first
//! section: near-duplicate restart markers within 90 seconds collapse into
//! one, and a restart is attributed to the watchdog when a journal restart
//! record lands within two minutes of it.

use crate::event::{Event, EventKind, EventSource, RestartReason};
use crate::ingest::IngestStats;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

const MERGE_WINDOW_SECS: i64 = 90;
const WATCHDOG_ATTRIBUTION_SECS: i64 = 120;

/// One observed gateway restart (or crash-implied restart).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartDetail {
    pub timestamp: DateTime<Utc>,
    pub reason: &'static str,
}

/// Input for the 基础设施状态 section.
#[derive(Debug, Clone, Default)]
pub struct InfraSummary {
    /// Most recent first.
    pub restarts: Vec<RestartDetail>,
    /// Reason label -> occurrences, sorted by count descending then label.
    pub breakdown: Vec<(&'static str, u32)>,
    pub journal_event_count: u64,
    pub journal_present: bool,
    pub stats: IngestStats,
}

const CRASH_LABEL: &str = "异常退出/崩溃";

fn reason_label(event: &Event) -> Option<&'static str> {
    match &event.kind {
        EventKind::Crash => Some(CRASH_LABEL),
        EventKind::Restart(reason) => Some(reason.label()),
        _ => None,
    }
}

/// Summarize restart evidence and ingestion health.
pub fn summarize(events: &[Event], journal_present: bool, stats: IngestStats) -> InfraSummary {
    let mut watchdog_times: Vec<DateTime<Utc>> = events
        .iter()
        .filter(|e| e.kind == EventKind::Restart(RestartReason::Watchdog))
        .map(|e| e.timestamp)
        .collect();
    watchdog_times.sort();

    let mut markers: Vec<(DateTime<Utc>, &'static str)> = events
        .iter()
        .filter_map(|e| reason_label(e).map(|label| (e.timestamp, label)))
        .collect();
    markers.sort_by(|a, b| b.0.cmp(&a.0));

    // Collapse near-duplicates, keeping the more specific (crash) reason.
    let mut merged: Vec<(DateTime<Utc>, &'static str)> = Vec::new();
    for (ts, label) in markers {
        if let Some(last) = merged.last_mut() {
            if (last.0 - ts) <= Duration::seconds(MERGE_WINDOW_SECS) {
                if label == CRASH_LABEL {
                    last.1 = label;
                }
                continue;
            }
        }
        merged.push((ts, label));
    }

    let restarts: Vec<RestartDetail> = merged
        .into_iter()
        .map(|(ts, label)| {
            let attributed = watchdog_times
                .iter()
                .any(|w| (*w - ts).abs() <= Duration::seconds(WATCHDOG_ATTRIBUTION_SECS));
            RestartDetail {
                timestamp: ts,
                reason: if attributed {
                    RestartReason::Watchdog.label()
                } else {
                    label
                },
            }
        })
        .collect();

    let mut counts: BTreeMap<&'static str, u32> = BTreeMap::new();
    for detail in &restarts {
        *counts.entry(detail.reason).or_default() += 1;
    }
    let mut breakdown: Vec<(&'static str, u32)> = counts.into_iter().collect();
    breakdown.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    InfraSummary {
        restarts,
        breakdown,
        journal_event_count: events
            .iter()
            .filter(|e| e.source == EventSource::Journal)
            .count() as u64,
        journal_present,
        stats,
    }
}
