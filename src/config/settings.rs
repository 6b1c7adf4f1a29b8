//! Tuning parameters for a report run.

use std::time::Duration;

/// Operational tuning for aggregation and rendering.
///
/// The thresholds are deliberate configuration, not hard-coded guesses: the
/// degraded/down boundary, the timeline cap, and the cron jitter tolerance
/// all vary by deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditSettings {
    /// Failures-in-window at or above which a pair is `degraded`
    pub degraded_threshold: u32,
    /// Maximum anomaly-timeline entries before truncation
    pub max_anomalies: usize,
    /// Schedule jitter tolerated before a cron run counts as missed
    pub cron_tolerance: chrono::Duration,
    /// Hard wall-clock budget for the whole run
    pub budget: Duration,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            degraded_threshold: 3,
            max_anomalies: 50,
            cron_tolerance: chrono::Duration::minutes(10),
            budget: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = AuditSettings::default();
        assert_eq!(settings.degraded_threshold, 3);
        assert_eq!(settings.max_anomalies, 50);
        assert_eq!(settings.cron_tolerance, chrono::Duration::minutes(10));
        assert_eq!(settings.budget, Duration::from_secs(30));
    }
}
