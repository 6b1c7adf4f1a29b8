//! Gateway configuration loading.
//!
//! The gateway writes one JSON configuration object; the auditor only reads
//! the parts that matter for reporting: the declared model list (primary,
//! fallbacks, allow-listed model map, per-agent overrides) and the user
//! timezone. Unknown fields are ignored so config schema growth on the
//! gateway side never breaks an audit run.
//!
//! # Example
//!
//! ```rust
//! use vigil::config::GatewayConfig;
//!
//! let json = r#"{
//!     "agents": {
//!         "defaults": {
//!             "userTimezone": "Asia/Shanghai",
//!             "model": {
//!                 "primary": "google-gemini-cli/gemini-3-pro",
//!                 "fallbacks": ["openai/gpt-5.2"]
//!             }
//!         }
//!     }
//! }"#;
//! let config: GatewayConfig = serde_json::from_str(json).unwrap();
//! assert_eq!(config.user_timezone(), Some("Asia/Shanghai"));
//! assert_eq!(config.configured_models().len(), 2);
//! ```

pub mod error;
pub mod settings;

pub use error::ConfigError;
pub use settings::AuditSettings;

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

/// Parsed gateway configuration object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub agents: AgentsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    pub defaults: AgentDefaults,
    pub list: Vec<AgentOverride>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgentDefaults {
    pub user_timezone: Option<String>,
    pub model: ModelSelection,
    /// Allow-listed model map; only the keys (model ids) matter here.
    pub models: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModelSelection {
    pub primary: Option<String>,
    pub fallbacks: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AgentOverride {
    pub id: Option<String>,
    pub model: Option<String>,
}

/// A configured `provider/model` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRef {
    pub provider: String,
    pub model: String,
}

impl ModelRef {
    /// Split a `provider/model` id; ids without a provider half get the
    /// `unknown` provider so the matrix stays truthful.
    pub fn parse(id: &str) -> Self {
        match id.split_once('/') {
            Some((provider, model)) => Self {
                provider: provider.to_string(),
                model: model.to_string(),
            },
            None => Self {
                provider: "unknown".to_string(),
                model: id.to_string(),
            },
        }
    }

    pub fn model_id(&self) -> String {
        format!("{}/{}", self.provider, self.model)
    }
}

impl GatewayConfig {
    /// Load configuration from a JSON file.
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// The configured user timezone, if declared.
    pub fn user_timezone(&self) -> Option<&str> {
        self.agents.defaults.user_timezone.as_deref()
    }

    /// Every model the configuration declares, deduplicated preserving the
    /// declaration order: primary, fallbacks, allow-listed map, per-agent
    /// overrides.
    pub fn configured_models(&self) -> Vec<ModelRef> {
        let defaults = &self.agents.defaults;
        let mut ids: Vec<&str> = Vec::new();

        if let Some(primary) = defaults.model.primary.as_deref() {
            if !primary.trim().is_empty() {
                ids.push(primary.trim());
            }
        }
        for fallback in &defaults.model.fallbacks {
            if !fallback.trim().is_empty() {
                ids.push(fallback.trim());
            }
        }
        for key in defaults.models.keys() {
            if !key.trim().is_empty() {
                ids.push(key.trim());
            }
        }
        for agent in &self.agents.list {
            if let Some(model) = agent.model.as_deref() {
                if !model.trim().is_empty() {
                    ids.push(model.trim());
                }
            }
        }

        let mut seen = BTreeSet::new();
        ids.into_iter()
            .filter(|id| seen.insert(id.to_string()))
            .map(ModelRef::parse)
            .collect()
    }

    /// Provider names considered display-safe by the redactor.
    pub fn known_providers(&self) -> BTreeSet<String> {
        self.configured_models()
            .into_iter()
            .map(|m| m.provider)
            .collect()
    }
}
