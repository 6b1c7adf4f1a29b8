//! Per-model health aggregation.
//!
//! Replays the ordered event stream into one status row per distinct
//! `(model, provider)` pair. Status derivation is deterministic and the
//! output ordering is fixed, so re-running against identical input yields a
//! byte-identical matrix.

use crate::config::ModelRef;
use crate::event::{Event, EventKind};
use crate::redact::Redactor;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Derived health of one model/provider pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    Healthy,
    Degraded,
    Down,
    Unknown,
}

impl ModelStatus {
    /// Display label in the gateway's emoji convention.
    pub fn label(&self) -> &'static str {
        match self {
            ModelStatus::Healthy => "🟢 健康",
            ModelStatus::Degraded => "🟡 降级",
            ModelStatus::Down => "🔴 宕机",
            ModelStatus::Unknown => "⚪ 未知",
        }
    }
}

/// One row of the LLM status matrix.
#[derive(Debug, Clone)]
pub struct ModelStatusRow {
    pub model: String,
    pub provider: String,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub failure_count: u32,
    pub avg_latency_ms: Option<u64>,
    pub status: ModelStatus,
}

#[derive(Debug, Default)]
struct PairState {
    last_success_at: Option<DateTime<Utc>>,
    last_failure_at: Option<DateTime<Utc>>,
    failure_count: u32,
    consecutive_failures: u32,
    latency_sum_ms: u64,
    latency_samples: u64,
    last_event_was_success: bool,
    seen_events: bool,
}

impl PairState {
    fn record_success(&mut self, ts: DateTime<Utc>) {
        self.seen_events = true;
        self.last_event_was_success = true;
        self.consecutive_failures = 0;
        if self.last_success_at.map_or(true, |prev| ts > prev) {
            self.last_success_at = Some(ts);
        }
    }

    fn record_failure(&mut self, ts: DateTime<Utc>) {
        self.seen_events = true;
        self.last_event_was_success = false;
        self.failure_count += 1;
        self.consecutive_failures += 1;
        if self.last_failure_at.map_or(true, |prev| ts > prev) {
            self.last_failure_at = Some(ts);
        }
    }

    fn record_latency(&mut self, ms: u64) {
        self.latency_sum_ms += ms;
        self.latency_samples += 1;
    }

    /// Status derivation; the order of checks matters. The threshold applies
    /// to the failure run since the last success, so a genuine recovery
    /// reports healthy while the in-window total stays visible in the row.
    fn derive(&self, degraded_threshold: u32) -> ModelStatus {
        if !self.seen_events {
            return ModelStatus::Unknown;
        }
        if self.last_success_at.is_none() && self.failure_count >= 1 {
            return ModelStatus::Down;
        }
        if self.consecutive_failures >= degraded_threshold {
            return ModelStatus::Degraded;
        }
        if self.last_event_was_success {
            return ModelStatus::Healthy;
        }
        // A failure after an in-window success, run still below the
        // threshold: impaired but serving.
        ModelStatus::Degraded
    }
}

fn latency_of(event: &Event) -> Option<u64> {
    event
        .fields
        .get("latency_ms")
        .or_else(|| event.fields.get("duration_ms"))
        .and_then(|raw| raw.parse().ok())
}

/// Build the status matrix from the ordered event stream.
///
/// Configured pairs with zero in-window events stay in the matrix as
/// `unknown` rather than disappearing. Provider strings pass through the
/// redactor's allow-list check before they become display data.
pub fn aggregate(
    events: &[Event],
    configured: &[ModelRef],
    redactor: &Redactor,
    degraded_threshold: u32,
) -> Vec<ModelStatusRow> {
    let mut pairs: BTreeMap<(String, String), PairState> = BTreeMap::new();

    for model_ref in configured {
        pairs
            .entry((model_ref.model.clone(), model_ref.provider.clone()))
            .or_default();
    }

    for event in events {
        match (&event.kind, &event.model) {
            (EventKind::AuthFailure, None) => {
                // A provider-level auth failure grounds every configured
                // model under that provider.
                let Some(provider) = &event.provider else {
                    continue;
                };
                for model_ref in configured.iter().filter(|m| &m.provider == provider) {
                    let state = pairs
                        .entry((model_ref.model.clone(), model_ref.provider.clone()))
                        .or_default();
                    state.record_failure(event.timestamp);
                }
            }
            (_, Some(model)) => {
                let provider = event
                    .provider
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string());
                let state = pairs.entry((model.clone(), provider)).or_default();
                if event.kind == EventKind::Success {
                    state.record_success(event.timestamp);
                    if let Some(ms) = latency_of(event) {
                        state.record_latency(ms);
                    }
                } else if event.is_failure_class() {
                    state.record_failure(event.timestamp);
                }
            }
            _ => {}
        }
    }

    // BTreeMap keyed (model, provider) already gives the fixed row order.
    pairs
        .into_iter()
        .map(|((model, provider), state)| ModelStatusRow {
            status: state.derive(degraded_threshold),
            avg_latency_ms: (state.latency_samples > 0)
                .then(|| state.latency_sum_ms / state.latency_samples),
            model,
            provider: redactor.sanitize_provider(&provider),
            last_success_at: state.last_success_at,
            last_failure_at: state.last_failure_at,
            failure_count: state.failure_count,
        })
        .collect()
}
