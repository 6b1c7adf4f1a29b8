//! Rolling-log reading.

use super::{IngestStats, SourceError, Window};
use crate::event::{classify, Event, EventSource};
use crate::redact::Redactor;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Read one mandatory gateway log into classified events.
///
/// Lines without a parsable timestamp or outside the window are counted and
/// skipped. Byte-identical duplicate lines are dropped (rolling logs can
/// overlap after rotation).
pub(super) fn read_log(
    path: &Path,
    source: EventSource,
    window: &Window,
    redactor: &Redactor,
    seq: &mut u64,
    stats: &mut IngestStats,
) -> Result<Vec<Event>, SourceError> {
    super::require_mandatory(path)?;
    let file = File::open(path).map_err(|e| SourceError::Unreadable {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut events = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| SourceError::Unreadable {
            path: path.to_path_buf(),
            source: e,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let Some(ts) = classify::parse_timestamp(&line) else {
            stats.skipped_no_timestamp += 1;
            continue;
        };
        if !window.contains(ts) {
            stats.out_of_window += 1;
            continue;
        }
        if !seen.insert(line.clone()) {
            stats.deduplicated += 1;
            continue;
        }
        stats.parsed += 1;
        let cleaned = redactor.redact(&line);
        events.extend(classify::classify_line(source, ts, seq, &cleaned));
    }
    Ok(events)
}
