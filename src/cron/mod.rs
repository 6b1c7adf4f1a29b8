//! Cron-job tracking.
//!
//! Cross-references the gateway's job registry against execution markers in
//! the event stream. Every declared job gets a row: jobs with no evidence
//! are `unknown`, and an enabled job whose schedule implied at least one run
//! inside the window (minus the jitter tolerance) with no marker at all is
//! `missed`, a distinct and louder condition.

use crate::event::{CronRunOutcome, Event, EventKind};
use crate::ingest::Window;
use chrono::{DateTime, Duration, Utc};
use cron::Schedule;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// Parsed cron-job registry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CronRegistry {
    pub jobs: Vec<CronJobSpec>,
}

/// One declared job.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CronJobSpec {
    pub id: Option<String>,
    pub name: String,
    pub schedule: Option<String>,
    pub enabled: bool,
    pub state: CronJobState,
}

impl Default for CronJobSpec {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            schedule: None,
            enabled: true,
            state: CronJobState::default(),
        }
    }
}

/// Scheduler-written job state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CronJobState {
    pub last_run_at_ms: Option<i64>,
    pub next_run_at_ms: Option<i64>,
}

impl CronJobSpec {
    pub fn job_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }
}

/// Classified last-run outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CronOutcome {
    Success,
    Failure,
    Missed,
    Unknown,
}

impl CronOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CronOutcome::Success => "✅ 成功",
            CronOutcome::Failure => "❌ 失败",
            CronOutcome::Missed => "⚠️ 疑似漏跑",
            CronOutcome::Unknown => "⚪ 无记录",
        }
    }
}

/// One row of the 定时任务追踪 section.
#[derive(Debug, Clone)]
pub struct CronJobStatus {
    pub job_id: String,
    pub schedule: Option<String>,
    pub enabled: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_outcome: CronOutcome,
    pub next_due: Option<DateTime<Utc>>,
}

/// Load the optional registry; a missing or unparsable file degrades to an
/// empty registry rather than aborting the run.
///
/// Accepts both shapes the gateway has written over time: a top-level
/// `{"jobs": [...]}` object and a bare array of job descriptors.
pub fn load_registry(path: Option<&Path>) -> CronRegistry {
    let Some(path) = path else {
        return CronRegistry::default();
    };
    let Ok(content) = std::fs::read_to_string(path) else {
        tracing::debug!(path = %path.display(), "cron registry absent, skipping");
        return CronRegistry::default();
    };
    if let Ok(registry) = serde_json::from_str::<CronRegistry>(&content) {
        return registry;
    }
    match serde_json::from_str::<Vec<CronJobSpec>>(&content) {
        Ok(jobs) => CronRegistry { jobs },
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cron registry unparsable, skipping");
            CronRegistry::default()
        }
    }
}

/// Normalize a schedule expression into a parsed [`Schedule`].
///
/// The gateway writes classic 5-field expressions; the `cron` crate wants a
/// leading seconds field, so 5-field input gets one prepended. `@hourly` and
/// friends are expanded first.
pub fn normalize_schedule(expr: &str) -> Option<Schedule> {
    let expr = expr.trim();
    let expanded = match expr {
        "@hourly" => "0 0 * * * *".to_string(),
        "@daily" | "@midnight" => "0 0 0 * * *".to_string(),
        "@weekly" => "0 0 0 * * Sun".to_string(),
        _ => match expr.split_whitespace().count() {
            5 => format!("0 {}", expr),
            _ => expr.to_string(),
        },
    };
    Schedule::from_str(&expanded).ok()
}

fn runs_due(schedule: &Schedule, from: DateTime<Utc>, until: DateTime<Utc>) -> usize {
    schedule
        .after(&from)
        .take_while(|ts| *ts <= until)
        .take(1000)
        .count()
}

fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

/// Classify every registry job against the event stream.
pub fn track(
    registry: &CronRegistry,
    events: &[Event],
    window: &Window,
    tolerance: Duration,
) -> Vec<CronJobStatus> {
    // Latest execution marker per job id.
    let mut evidence: BTreeMap<&str, (&Event, CronRunOutcome)> = BTreeMap::new();
    for event in events {
        if let EventKind::CronRun { job_id, outcome } = &event.kind {
            evidence
                .entry(job_id.as_str())
                .and_modify(|slot| {
                    if (event.timestamp, event.seq) > (slot.0.timestamp, slot.0.seq) {
                        *slot = (event, *outcome);
                    }
                })
                .or_insert((event, *outcome));
        }
    }

    let mut rows: Vec<CronJobStatus> = registry
        .jobs
        .iter()
        .filter(|job| !job.job_id().is_empty())
        .map(|job| {
            let schedule = job.schedule.as_deref().and_then(normalize_schedule);
            let marker = evidence.get(job.job_id());

            let last_outcome = match marker {
                Some((_, CronRunOutcome::Completed)) => CronOutcome::Success,
                Some((_, CronRunOutcome::Failed)) => CronOutcome::Failure,
                None => {
                    let due = schedule
                        .as_ref()
                        .map(|s| runs_due(s, window.since, window.now - tolerance))
                        .unwrap_or(0);
                    if job.enabled && due >= 1 {
                        CronOutcome::Missed
                    } else {
                        CronOutcome::Unknown
                    }
                }
            };

            let last_run_at = marker
                .map(|(event, _)| event.timestamp)
                .or_else(|| job.state.last_run_at_ms.and_then(from_millis));

            let next_due = schedule
                .as_ref()
                .and_then(|s| s.after(&window.now).next())
                .or_else(|| job.state.next_run_at_ms.and_then(from_millis));

            CronJobStatus {
                job_id: job.job_id().to_string(),
                schedule: job.schedule.clone(),
                enabled: job.enabled,
                last_run_at,
                last_outcome,
                next_due,
            }
        })
        .collect();

    rows.sort_by(|a, b| a.job_id.cmp(&b.job_id));
    rows
}
