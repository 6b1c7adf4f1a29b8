//! Anomaly timeline construction.
//!
//! Qualifying warn/error events become short template-derived entries in
//! chronological order. Descriptions are substitution into fixed templates,
//! never free text generated from event content, and pass through the
//! redactor once more before leaving this module.

use crate::event::{CronRunOutcome, Event, EventKind, EventSource, Severity};
use crate::redact::Redactor;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;

/// One timeline entry.
#[derive(Debug, Clone)]
pub struct AnomalyEntry {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub description: String,
    pub source: EventSource,
    seq: u64,
}

/// The bounded, ordered timeline.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    /// Ascending by `(timestamp, seq)`.
    pub entries: Vec<AnomalyEntry>,
    /// Candidates dropped by the cap; stated explicitly in the report.
    pub suppressed: usize,
}

fn format_reset(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if seconds > 0 || out.is_empty() {
        out.push_str(&format!("{}s", seconds));
    }
    out
}

fn subject(event: &Event) -> String {
    if let Some(id) = event.model_id() {
        id
    } else if let Some(provider) = &event.provider {
        format!("provider={}", provider)
    } else {
        "gateway".to_string()
    }
}

/// Fixed per-kind description template. Returns `None` for kinds that never
/// enter the timeline.
fn describe(event: &Event) -> Option<String> {
    let text = match &event.kind {
        EventKind::RateLimit { reset_after_secs } => match reset_after_secs {
            Some(secs) => format!(
                "{}: 429/限流命中（预计 {} 后重置）",
                subject(event),
                format_reset(*secs)
            ),
            None => format!("{}: 429/限流命中", subject(event)),
        },
        EventKind::AuthFailure => format!("{}: API key 缺失/认证失败", subject(event)),
        EventKind::Cooldown => format!("{}: provider cooldown（瞬时限流）", subject(event)),
        EventKind::Timeout => format!("{}: 连接超时 (timeout/ETIMEDOUT)", subject(event)),
        EventKind::ContextLimit => format!("{}: Token/上下文上限触发", subject(event)),
        EventKind::UnknownModel => format!("{}: Unknown model / not allowed", subject(event)),
        EventKind::Failure => format!("{}: 模型调用失败", subject(event)),
        EventKind::Crash => "网关异常退出/崩溃".to_string(),
        EventKind::Restart(reason) => format!("网关重启：{}", reason.label()),
        EventKind::CronRun { job_id, outcome } => match outcome {
            CronRunOutcome::Failed => format!("定时任务 {} 执行失败", job_id),
            CronRunOutcome::Completed => return None,
        },
        EventKind::Success | EventKind::Other => return None,
    };
    Some(text)
}

/// Build the timeline from the ordered event stream.
///
/// When candidates exceed `cap`, the most severe (then most recent) entries
/// survive and the rest are counted as suppressed; the survivors still
/// render chronologically.
pub fn build(events: &[Event], redactor: &Redactor, cap: usize) -> Timeline {
    let mut candidates: Vec<AnomalyEntry> = events
        .iter()
        .filter(|e| e.severity >= Severity::Warn)
        .filter_map(|e| {
            describe(e).map(|description| AnomalyEntry {
                timestamp: e.timestamp,
                severity: e.severity,
                description: redactor.redact(&description),
                source: e.source,
                seq: e.seq,
            })
        })
        .collect();

    let suppressed = candidates.len().saturating_sub(cap);
    if suppressed > 0 {
        candidates.sort_by_key(|e| (Reverse(e.severity), Reverse(e.timestamp), e.seq));
        candidates.truncate(cap);
    }
    candidates.sort_by_key(|e| (e.timestamp, e.seq));

    Timeline {
        entries: candidates,
        suppressed,
    }
}
