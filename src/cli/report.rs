//! Report command implementation.
//!
//! The single run-to-completion pipeline: load config, resolve the zone,
//! compute the window once, ingest + redact, aggregate, render. The
//! wall-clock budget is checked at phase boundaries; overrunning it fails
//! closed with no output rather than emitting a partially-aggregated report.

use crate::cli::ReportArgs;
use crate::config::{AuditSettings, GatewayConfig};
use crate::cron;
use crate::error::AuditError;
use crate::health;
use crate::infra;
use crate::ingest::{self, SourcePaths, Window};
use crate::redact::Redactor;
use crate::report::{self, ReportInputs};
use crate::timeline;
use crate::timezone::TimeNormalizer;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// Wall-clock budget enforcement for one run.
struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    fn new(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    fn check(&self) -> Result<(), AuditError> {
        if self.started.elapsed() > self.budget {
            Err(AuditError::BudgetExceeded(self.budget))
        } else {
            Ok(())
        }
    }
}

fn resolve_now(raw: Option<&str>) -> Result<DateTime<Utc>, AuditError> {
    match raw {
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| AuditError::InvalidNow(value.to_string())),
        None => Ok(Utc::now()),
    }
}

fn settings_from(args: &ReportArgs) -> AuditSettings {
    AuditSettings {
        degraded_threshold: args.degraded_threshold,
        max_anomalies: args.max_anomalies,
        cron_tolerance: chrono::Duration::minutes(i64::from(args.cron_tolerance_minutes)),
        budget: Duration::from_secs(args.budget_seconds),
    }
}

/// Handle `vigil report` command. Returns the rendered Markdown document.
pub fn handle_report(args: &ReportArgs) -> Result<String, AuditError> {
    let settings = settings_from(args);
    let deadline = Deadline::new(settings.budget);
    let now = resolve_now(args.now.as_deref())?;
    let window = Window::ending_at(now, args.hours);

    // The config is an optional source: absence or a parse failure degrades
    // to defaults (empty model list, fallback timezone caveat).
    let config = match GatewayConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "gateway config unusable, continuing with defaults");
            GatewayConfig::default()
        }
    };

    let tz = TimeNormalizer::resolve(args.tz.as_deref().or(config.user_timezone()));
    let redactor = Redactor::new(config.known_providers());
    let configured = config.configured_models();

    let paths = SourcePaths {
        gateway_log: args.log.clone(),
        gateway_err_log: args.err_log.clone(),
        journal: args.journal.clone(),
    };
    let (events, stats) = ingest::read_events(&paths, &window, &redactor)?;
    deadline.check()?;

    let matrix = health::aggregate(&events, &configured, &redactor, settings.degraded_threshold);
    let infra = infra::summarize(
        &events,
        args.journal.as_deref().is_some_and(|p| p.is_file()),
        stats,
    );
    let anomalies = timeline::build(&events, &redactor, settings.max_anomalies);
    let registry = cron::load_registry(args.cron_registry.as_deref());
    let jobs = cron::track(&registry, &events, &window, settings.cron_tolerance);
    deadline.check()?;

    let inputs = ReportInputs {
        window: &window,
        tz: &tz,
        infra: &infra,
        matrix: &matrix,
        timeline: &anomalies,
        cron: &jobs,
    };
    let document = report::render(&inputs, &redactor);
    deadline.check()?;
    Ok(document)
}
