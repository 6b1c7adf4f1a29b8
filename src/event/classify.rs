//! Fixed-rule event classification.
//!
//! A closed set of compiled signatures maps each cleaned log line to exactly
//! one [`EventKind`] (the aggregate `All models failed (N): …` line fans out
//! into one failure event per embedded model id). Classification is pure
//! substitution and pattern matching; no content is ever synthesized from
//! the line beyond what the templates carry.

use super::{CronRunOutcome, Event, EventKind, EventSource, RestartReason, Severity};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

macro_rules! log_pattern {
    ($name:ident, $regex_str:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($regex_str).expect("log pattern compiles"));
    };
}

log_pattern!(
    RE_TIMESTAMP,
    r"(?P<ts>\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?Z)"
);
log_pattern!(
    RE_PROVIDER_MODEL,
    r"\bprovider=(?P<provider>[\w-]+)\b.*\bmodel=(?P<model>[\w.\-]+)\b"
);
log_pattern!(RE_MODEL_QUOTED, r#"[Mm]odel\s+"(?P<model>[\w\-./]+)""#);
log_pattern!(
    RE_NO_API_KEY,
    r#"No API key found for provider\s+"(?P<provider>[\w-]+)""#
);
log_pattern!(
    RE_COOLDOWN,
    r"(?i)\bprovider\s+(?P<provider>[\w-]+)\s+is\s+in\s+cooldown\b"
);
log_pattern!(RE_COOLDOWN_HINT, r"(?i)\bcooldown\b");
log_pattern!(
    RE_RATE_LIMIT,
    r"(?i)(?:\b429\b|rate.?limit|too many requests|requests per minute|exhausted your capacity)"
);
log_pattern!(
    RE_RESET_AFTER,
    r"(?i)reset after\s+(?P<after>(?:\d+h)?(?:\d+m)?(?:\d+s)?)"
);
log_pattern!(RE_TIMEOUT, r"(?i)(?:\btimeout\b|\betimedout\b)");
log_pattern!(
    RE_CONTEXT_LIMIT,
    r"(?i)(?:context length|max(?:imum)? tokens|token limit|too many tokens)"
);
log_pattern!(RE_UNKNOWN_MODEL, r"Unknown model:\s*(?P<model>[\w\-./]+)");
log_pattern!(
    RE_MODEL_NOT_ALLOWED,
    r#"[Mm]odel\s+"(?P<model>[\w\-./]+)"\s+is not allowed"#
);
log_pattern!(
    RE_CRASH,
    r"(?i)(?:uncaught exception|max reconnect attempts)"
);
log_pattern!(RE_SIGUSR1, r"(?i)received sigusr1; restarting");
log_pattern!(RE_SIGTERM, r"(?i)received sigterm; shutting down");
log_pattern!(
    RE_ALL_MODELS_FAILED,
    r"(?i)all models failed\s*\(\d+\)\s*:\s*(?P<body>.*)$"
);
log_pattern!(
    RE_CRON_MARKER,
    r"(?i)\bcron job\s+(?P<job>[\w.:-]+)\s+(?P<outcome>completed|failed)\b"
);
log_pattern!(
    RE_KV_FIELD,
    r"\b(?P<key>[A-Za-z_][A-Za-z0-9_]*)=(?P<value>[^\s,;|]+)"
);
log_pattern!(RE_HMS, r"^(?:(?P<h>\d+)h)?(?:(?P<m>\d+)m)?(?:(?P<s>\d+)s)?$");

/// Extract the leading ISO-8601 UTC timestamp from a log line.
pub fn parse_timestamp(line: &str) -> Option<DateTime<Utc>> {
    let caps = RE_TIMESTAMP.captures(line)?;
    DateTime::parse_from_rfc3339(&caps["ts"])
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a `14h19m18s` / `17m16s` / `3h` style duration into seconds.
pub fn parse_hms_duration(raw: &str) -> Option<u64> {
    let caps = RE_HMS.captures(raw.trim())?;
    let get = |name: &str| -> u64 {
        caps.name(name)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    let secs = get("h") * 3600 + get("m") * 60 + get("s");
    (secs > 0).then_some(secs)
}

fn reset_after_secs(text: &str) -> Option<u64> {
    RE_RESET_AFTER
        .captures(text)
        .and_then(|caps| parse_hms_duration(&caps["after"]))
}

/// Parsed `key=value` pairs from a redacted record.
fn kv_fields(line: &str) -> BTreeMap<String, String> {
    RE_KV_FIELD
        .captures_iter(line)
        .map(|caps| (caps["key"].to_string(), caps["value"].to_string()))
        .collect()
}

fn split_model_id(id: &str) -> (Option<String>, String) {
    match id.split_once('/') {
        Some((provider, model)) => (Some(provider.to_string()), model.to_string()),
        None => (None, id.to_string()),
    }
}

/// Best-effort provider/model extraction from a single line.
fn extract_provider_model(line: &str) -> (Option<String>, Option<String>) {
    if let Some(caps) = RE_PROVIDER_MODEL.captures(line) {
        return (
            Some(caps["provider"].to_string()),
            Some(caps["model"].to_string()),
        );
    }
    if let Some(caps) = RE_MODEL_QUOTED.captures(line) {
        let (provider, model) = split_model_id(&caps["model"]);
        return (provider, Some(model));
    }
    (None, None)
}

/// Classify the failure text of one `All models failed` segment.
fn classify_failure_text(text: &str) -> EventKind {
    if RE_COOLDOWN_HINT.is_match(text) {
        EventKind::Cooldown
    } else if RE_RATE_LIMIT.is_match(text) {
        EventKind::RateLimit {
            reset_after_secs: reset_after_secs(text),
        }
    } else if RE_TIMEOUT.is_match(text) {
        EventKind::Timeout
    } else if RE_CONTEXT_LIMIT.is_match(text) {
        EventKind::ContextLimit
    } else {
        EventKind::Failure
    }
}

fn base_severity(kind: &EventKind) -> Severity {
    match kind {
        EventKind::Success | EventKind::Other => Severity::Info,
        EventKind::CronRun { outcome, .. } => match outcome {
            CronRunOutcome::Completed => Severity::Info,
            CronRunOutcome::Failed => Severity::Error,
        },
        EventKind::RateLimit { .. }
        | EventKind::Cooldown
        | EventKind::Timeout
        | EventKind::ContextLimit
        | EventKind::Restart(_) => Severity::Warn,
        EventKind::AuthFailure
        | EventKind::UnknownModel
        | EventKind::Failure
        | EventKind::Crash => Severity::Error,
    }
}

fn build_event(
    timestamp: DateTime<Utc>,
    seq: &mut u64,
    source: EventSource,
    kind: EventKind,
    fields: BTreeMap<String, String>,
    provider: Option<String>,
    model: Option<String>,
) -> Event {
    let mut severity = base_severity(&kind);
    // Anything the gateway routed to its error log is at least a warning.
    if source == EventSource::GatewayErrLog && severity == Severity::Info {
        severity = Severity::Warn;
    }
    let event = Event {
        timestamp,
        seq: *seq,
        source,
        severity,
        kind,
        fields,
        model,
        provider,
    };
    *seq += 1;
    event
}

/// Classify one redacted log line into zero or more events.
///
/// The aggregate `All models failed (N): id: msg | id: msg` line produces one
/// failure event per embedded model id; every other line produces exactly one
/// event.
pub fn classify_line(
    source: EventSource,
    timestamp: DateTime<Utc>,
    seq: &mut u64,
    line: &str,
) -> Vec<Event> {
    let fields = kv_fields(line);

    if let Some(caps) = RE_ALL_MODELS_FAILED.captures(line) {
        let mut events = Vec::new();
        for segment in caps["body"].split('|') {
            let Some((id, message)) = segment.trim().split_once(':') else {
                continue;
            };
            let id = id.trim();
            // Only accept real provider/model ids; free text stays out.
            if !id.contains('/') {
                continue;
            }
            let (provider, model) = split_model_id(id);
            events.push(build_event(
                timestamp,
                seq,
                source,
                classify_failure_text(message),
                fields.clone(),
                provider,
                Some(model),
            ));
        }
        if !events.is_empty() {
            return events;
        }
    }

    if let Some(caps) = RE_NO_API_KEY.captures(line) {
        let provider = caps["provider"].to_string();
        return vec![build_event(
            timestamp,
            seq,
            source,
            EventKind::AuthFailure,
            fields,
            Some(provider),
            None,
        )];
    }

    if let Some(caps) = RE_UNKNOWN_MODEL
        .captures(line)
        .or_else(|| RE_MODEL_NOT_ALLOWED.captures(line))
    {
        let (provider, model) = split_model_id(&caps["model"]);
        return vec![build_event(
            timestamp,
            seq,
            source,
            EventKind::UnknownModel,
            fields,
            provider,
            Some(model),
        )];
    }

    if RE_SIGUSR1.is_match(line) {
        return vec![build_event(
            timestamp,
            seq,
            source,
            EventKind::Restart(RestartReason::ConfigReload),
            fields,
            None,
            None,
        )];
    }
    if RE_SIGTERM.is_match(line) {
        return vec![build_event(
            timestamp,
            seq,
            source,
            EventKind::Restart(RestartReason::Shutdown),
            fields,
            None,
            None,
        )];
    }
    if RE_CRASH.is_match(line) {
        return vec![build_event(
            timestamp,
            seq,
            source,
            EventKind::Crash,
            fields,
            None,
            None,
        )];
    }

    if let Some(caps) = RE_CRON_MARKER.captures(line) {
        let outcome = if caps["outcome"].eq_ignore_ascii_case("completed") {
            CronRunOutcome::Completed
        } else {
            CronRunOutcome::Failed
        };
        let job_id = caps["job"].to_string();
        return vec![build_event(
            timestamp,
            seq,
            source,
            EventKind::CronRun { job_id, outcome },
            fields,
            None,
            None,
        )];
    }

    let (provider, model) = {
        let (p, m) = extract_provider_model(line);
        // Cooldown lines name only a provider.
        match (p, RE_COOLDOWN.captures(line)) {
            (None, Some(caps)) => (Some(caps["provider"].to_string()), m),
            (p, _) => (p, m),
        }
    };

    let kind = if RE_COOLDOWN_HINT.is_match(line) && (provider.is_some() || model.is_some()) {
        EventKind::Cooldown
    } else if RE_RATE_LIMIT.is_match(line) {
        EventKind::RateLimit {
            reset_after_secs: reset_after_secs(line),
        }
    } else if RE_TIMEOUT.is_match(line) {
        EventKind::Timeout
    } else if RE_CONTEXT_LIMIT.is_match(line) {
        EventKind::ContextLimit
    } else if model.is_some() {
        if source == EventSource::GatewayErrLog {
            EventKind::Failure
        } else {
            EventKind::Success
        }
    } else {
        EventKind::Other
    };

    vec![build_event(
        timestamp, seq, source, kind, fields, provider, model,
    )]
}
