//! Shared test utilities for Vigil integration tests.
//!
//! Provides reusable fixture builders for the gateway state directory:
//! logs, journal, cron registry, and configuration.

#![allow(dead_code)]

use std::path::PathBuf;
use tempfile::TempDir;

/// Pinned reference instant used by every integration fixture.
pub const NOW: &str = "2026-02-07T12:00:00Z";

/// A throwaway gateway state directory.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, content).expect("write fixture file");
        path
    }

    /// Both mandatory logs, empty.
    pub fn empty_logs(&self) -> (PathBuf, PathBuf) {
        (
            self.write("gateway.log", ""),
            self.write("gateway.err.log", ""),
        )
    }

    /// A config declaring two models and a UTC timezone.
    pub fn config(&self) -> PathBuf {
        self.write(
            "gateway.json",
            r#"{
                "agents": {
                    "defaults": {
                        "userTimezone": "UTC",
                        "model": {
                            "primary": "google-gemini-cli/gemini-3-pro",
                            "fallbacks": ["openai/gpt-5.2"]
                        }
                    }
                }
            }"#,
        )
    }

    /// A registry with one enabled hourly job.
    pub fn cron_registry(&self) -> PathBuf {
        self.write(
            "jobs.json",
            r#"{"jobs":[{"id":"heartbeat","name":"heartbeat","schedule":"0 * * * *","enabled":true,"state":{}}]}"#,
        )
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}
