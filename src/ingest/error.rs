//! Source ingestion error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading evidence files.
///
/// Only mandatory-source conditions live here; malformed individual records
/// are counted in [`super::IngestStats`] and never abort a run.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("mandatory source missing: {0}")]
    MissingMandatory(PathBuf),

    #[error("failed to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
