//! Timezone resolution and timestamp display.
//!
//! Every section of the report renders instants in one resolved zone so that
//! all components reason about the same local clock. Resolution happens once
//! per run; the resolved normalizer is threaded through as an immutable value
//! rather than held as process-wide state.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Fixed fallback zone used when no usable zone name is available.
pub const FALLBACK_ZONE: &str = "Asia/Shanghai";

/// Resolved display timezone for a single report run.
///
/// # Example
///
/// ```rust
/// use vigil::timezone::TimeNormalizer;
///
/// let tz = TimeNormalizer::resolve(Some("UTC"));
/// assert_eq!(tz.zone_name(), "UTC");
/// assert!(!tz.fallback_used());
/// ```
#[derive(Debug, Clone)]
pub struct TimeNormalizer {
    tz: Tz,
    name: String,
    fallback_used: bool,
}

impl TimeNormalizer {
    /// Resolve an IANA zone name, falling back to [`FALLBACK_ZONE`].
    ///
    /// `None` and unparsable names both resolve to the fallback and set the
    /// `fallback_used` flag so the report can surface the caveat instead of
    /// being silently wrong.
    pub fn resolve(name: Option<&str>) -> Self {
        match name {
            Some(raw) => match raw.parse::<Tz>() {
                Ok(tz) => Self {
                    tz,
                    name: raw.to_string(),
                    fallback_used: false,
                },
                Err(_) => {
                    tracing::warn!(zone = raw, "unresolvable timezone, using fallback");
                    Self::fallback()
                }
            },
            None => Self::fallback(),
        }
    }

    fn fallback() -> Self {
        let tz: Tz = FALLBACK_ZONE
            .parse()
            .expect("fallback zone is a valid IANA name");
        Self {
            tz,
            name: FALLBACK_ZONE.to_string(),
            fallback_used: true,
        }
    }

    /// Name of the resolved zone as it appears in the report preamble.
    pub fn zone_name(&self) -> &str {
        &self.name
    }

    /// Whether resolution fell back to [`FALLBACK_ZONE`].
    pub fn fallback_used(&self) -> bool {
        self.fallback_used
    }

    /// Format an instant as `YYYY-MM-DD HH:MM` in the resolved zone.
    pub fn format(&self, ts: DateTime<Utc>) -> String {
        ts.with_timezone(&self.tz)
            .format("%Y-%m-%d %H:%M")
            .to_string()
    }

    /// Format an instant as `HH:MM` in the resolved zone.
    pub fn format_time(&self, ts: DateTime<Utc>) -> String {
        ts.with_timezone(&self.tz).format("%H:%M").to_string()
    }
}
