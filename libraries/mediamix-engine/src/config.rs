//! Engine configuration

use serde::{Deserialize, Serialize};

/// What the endpoint does with a request name it does not know
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownRequestPolicy {
    /// Drop the message without answering
    #[default]
    Ignore,
    /// Answer with an "unsupported request" error
    Reject,
}

/// Engine configuration
///
/// Every field has a default so partial sources (a config file, a JS object)
/// deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Also drive media inside same-origin embedded frames
    #[serde(default = "default_include_subdocuments")]
    pub include_subdocuments: bool,

    #[serde(default)]
    pub unknown_requests: UnknownRequestPolicy,

    /// Literal answered to `PING`
    #[serde(default = "default_ping_reply")]
    pub ping_reply: String,

    /// Volume change per unit of adapter adjustment (e.g. one wheel notch)
    #[serde(default = "default_adjust_step")]
    pub adjust_step: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            include_subdocuments: default_include_subdocuments(),
            unknown_requests: UnknownRequestPolicy::default(),
            ping_reply: default_ping_reply(),
            adjust_step: default_adjust_step(),
        }
    }
}

// Default values
fn default_include_subdocuments() -> bool {
    true
}

fn default_ping_reply() -> String {
    "pong".to_string()
}

fn default_adjust_step() -> f64 {
    0.05
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_object_yields_defaults() {
        let config: EngineConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.ping_reply, "pong");
        assert_eq!(config.unknown_requests, UnknownRequestPolicy::Ignore);
    }

    #[test]
    fn partial_overrides() {
        let config: EngineConfig = serde_json::from_value(json!({
            "unknown_requests": "reject",
            "include_subdocuments": false
        }))
        .unwrap();

        assert_eq!(config.unknown_requests, UnknownRequestPolicy::Reject);
        assert!(!config.include_subdocuments);
        assert_eq!(config.adjust_step, 0.05);
    }
}
