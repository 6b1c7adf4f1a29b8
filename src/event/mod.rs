//! The normalized event stream.
//!
//! Every evidence source is reduced to one immutable [`Event`] shape before
//! aggregation. Events are constructed only by the ingest phase, from
//! already-redacted text, and are treated as read-only by every aggregator.

pub mod classify;

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Which evidence file an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    GatewayLog,
    GatewayErrLog,
    Journal,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::GatewayLog => "gateway-log",
            EventSource::GatewayErrLog => "gateway-err-log",
            EventSource::Journal => "journal",
        }
    }
}

/// Event severity, ordered `Info < Warn < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }
}

/// Why the gateway process went down or came back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartReason {
    /// SIGUSR1, config reload requested by the user
    ConfigReload,
    /// SIGTERM, service-level restart
    Shutdown,
    /// Restart attributed to the watchdog via the journal
    Watchdog,
}

impl RestartReason {
    pub fn label(&self) -> &'static str {
        match self {
            RestartReason::ConfigReload => "用户配置变更 (SIGUSR1)",
            RestartReason::Shutdown => "系统/服务重启 (SIGTERM)",
            RestartReason::Watchdog => "Watchdog 自愈触发",
        }
    }
}

/// Outcome carried by a cron execution marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CronRunOutcome {
    Completed,
    Failed,
}

/// Closed classification of an event. Each record maps to exactly one kind;
/// there is no free-form category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Provider/model-tagged completion marker
    Success,
    /// 429 / rate-limit / capacity-exhausted signature
    RateLimit { reset_after_secs: Option<u64> },
    /// Provider authentication failure (missing or rejected key)
    AuthFailure,
    /// Provider cooldown marker
    Cooldown,
    /// Timeout / ETIMEDOUT
    Timeout,
    /// Context-length or token-limit signature
    ContextLimit,
    /// Unknown or disallowed model id
    UnknownModel,
    /// Model-tagged error with no more specific signature
    Failure,
    /// Uncaught exception or reconnect exhaustion
    Crash,
    /// Process restart marker
    Restart(RestartReason),
    /// Cron execution marker
    CronRun {
        job_id: String,
        outcome: CronRunOutcome,
    },
    /// Anything else; kept for counting, never surfaced in the timeline
    Other,
}

/// One normalized, redacted evidence record.
#[derive(Debug, Clone)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    /// Source-file read order; the deterministic tiebreaker everywhere.
    pub seq: u64,
    pub source: EventSource,
    pub severity: Severity,
    pub kind: EventKind,
    /// Parsed `key=value` pairs from the redacted record.
    pub fields: BTreeMap<String, String>,
    pub model: Option<String>,
    pub provider: Option<String>,
}

impl Event {
    /// `provider/model` display id when both halves are known.
    pub fn model_id(&self) -> Option<String> {
        match (&self.provider, &self.model) {
            (Some(p), Some(m)) => Some(format!("{}/{}", p, m)),
            (None, Some(m)) => Some(m.clone()),
            _ => None,
        }
    }

    /// Whether this event counts against a model's failure tally.
    pub fn is_failure_class(&self) -> bool {
        matches!(
            self.kind,
            EventKind::RateLimit { .. }
                | EventKind::AuthFailure
                | EventKind::Cooldown
                | EventKind::Timeout
                | EventKind::ContextLimit
                | EventKind::UnknownModel
                | EventKind::Failure
        )
    }
}
