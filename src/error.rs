//! Top-level error taxonomy.
//!
//! Fatal conditions never produce a Markdown report; everything that only
//! reduces completeness (a missing optional file, a malformed record, an
//! unknown job) degrades inside the pipeline and surfaces as explicit
//! no-data markers in the rendered output instead of landing here.

use crate::ingest::SourceError;
use std::time::Duration;
use thiserror::Error;

/// Fatal pipeline errors.
#[derive(Error, Debug)]
pub enum AuditError {
    /// Missing or unreadable mandatory evidence
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The run overran its wall-clock budget; failing closed beats emitting
    /// a partially-aggregated report
    #[error("wall-clock budget of {0:?} exceeded; no report emitted")]
    BudgetExceeded(Duration),

    /// Unparsable `--now` reference instant
    #[error("invalid --now value '{0}': expected an RFC 3339 timestamp")]
    InvalidNow(String),
}

impl AuditError {
    /// Distinguishable process exit code for the binary.
    pub fn exit_code(&self) -> i32 {
        match self {
            AuditError::Source(_) => 2,
            AuditError::BudgetExceeded(_) => 3,
            AuditError::InvalidNow(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_codes_distinguishable() {
        let source = AuditError::Source(SourceError::MissingMandatory(PathBuf::from("x")));
        let budget = AuditError::BudgetExceeded(Duration::from_secs(30));
        let now = AuditError::InvalidNow("yesterday".to_string());
        assert_eq!(source.exit_code(), 2);
        assert_eq!(budget.exit_code(), 3);
        assert_eq!(now.exit_code(), 1);
    }
}
