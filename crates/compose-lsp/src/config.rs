//! Server configuration.

use serde::{Deserialize, Serialize};

/// How the server follows `include` directives.
///
/// Built from command-line flags; clients may override fields through
/// `initializationOptions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Load included documents from disk.
    pub follow_includes: bool,
    /// Maximum depth of nested includes to load.
    pub max_include_depth: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            follow_includes: true,
            max_include_depth: 8,
        }
    }
}

impl ServerConfig {
    /// Apply client `initializationOptions` on top of this configuration.
    ///
    /// Options that do not deserialize are ignored.
    pub fn with_options(&self, options: Option<&serde_json::Value>) -> Self {
        let Some(serde_json::Value::Object(options)) = options else {
            return self.clone();
        };
        let mut merged = serde_json::to_value(self)
            .ok()
            .and_then(|value| match value {
                serde_json::Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default();
        merged.extend(options.clone());

        match serde_json::from_value(serde_json::Value::Object(merged)) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(error = %err, "Ignoring invalid initialization options");
                self.clone()
            }
        }
    }
}
