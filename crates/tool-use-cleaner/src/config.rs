//! Plugin configuration.
//!
//! Two keys are recognised; anything else in the host's config object is
//! ignored:
//!
//! ```json
//! {
//!   "enable_function_call_cleaner": true,
//!   "tool_context_keep_rounds": 2
//! }
//! ```
//!
//! `tool_context_keep_rounds` is the primary switch. `0` (the default) or any
//! negative value strips tool content from the whole history; a positive `k`
//! keeps the most recent `k` rounds untouched.
//!
//! `enable_function_call_cleaner` is the older toggle. When `false`, `tool`
//! result messages are still removed from the affected range but assistant
//! messages are left as they are.

use crate::context::{CleanMode, StripRule, ToolContextCleaner};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

fn default_true() -> bool {
    true
}

/// Configuration read once when the plugin is constructed.
#[derive(Deserialize, Serialize, JsonSchema, Clone, Debug, PartialEq, Eq)]
pub struct CleanerConfig {
    /// Strip `tool_calls` from assistant messages and drop assistant messages
    /// without content. Legacy switch; defaults to `true`.
    #[serde(default = "default_true")]
    pub enable_function_call_cleaner: bool,
    /// Number of most recent rounds whose tool calls and results are kept.
    /// `0` strips them everywhere.
    #[serde(default)]
    pub tool_context_keep_rounds: i64,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            enable_function_call_cleaner: true,
            tool_context_keep_rounds: 0,
        }
    }
}

impl CleanerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("failed to parse cleaner config: {e}"))
    }

    /// Parse a config from an already-decoded JSON value (the host's config
    /// object).
    pub fn from_value(value: serde_json::Value) -> Result<Self, String> {
        serde_json::from_value(value).map_err(|e| format!("failed to parse cleaner config: {e}"))
    }

    /// Load a config from a JSON file. Returns defaults if the file doesn't
    /// exist or can't be parsed.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json_str(&contents).unwrap_or_else(|e| {
                warn!("{e} ({}), using defaults", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// JSON Schema describing the recognised keys, for host config forms.
    pub fn schema() -> serde_json::Value {
        crate::json_schema_for::<Self>()
    }

    /// Set the retention window.
    pub fn with_keep_rounds(mut self, rounds: i64) -> Self {
        self.tool_context_keep_rounds = rounds;
        self
    }

    /// Set the legacy assistant-stripping switch.
    pub fn with_function_call_cleaner(mut self, enabled: bool) -> Self {
        self.enable_function_call_cleaner = enabled;
        self
    }

    /// Retention window with non-positive values coerced to `0`.
    pub fn keep_rounds(&self) -> usize {
        self.mode().keep_rounds()
    }

    pub fn mode(&self) -> CleanMode {
        CleanMode::from_keep_rounds(self.tool_context_keep_rounds)
    }

    pub fn strip_rule(&self) -> StripRule {
        StripRule {
            strip_assistant_tool_calls: self.enable_function_call_cleaner,
        }
    }

    /// Build the cleaner this config describes.
    pub fn build_cleaner(&self) -> ToolContextCleaner {
        ToolContextCleaner::new(self.mode()).with_rule(self.strip_rule())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_strip_everything() {
        let config = CleanerConfig::default();
        assert!(config.enable_function_call_cleaner);
        assert_eq!(config.keep_rounds(), 0);
        assert_eq!(config.mode(), CleanMode::StripAll);
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let config = CleanerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CleanerConfig::default());
    }

    #[test]
    fn deserialize_ignores_unknown_keys() {
        let config = CleanerConfig::from_json_str(
            r#"{"tool_context_keep_rounds": 3, "unrelated": [1, 2]}"#,
        )
        .unwrap();
        assert_eq!(config.keep_rounds(), 3);
    }

    #[test]
    fn negative_keep_rounds_is_strip_all() {
        let config = CleanerConfig::new().with_keep_rounds(-2);
        assert_eq!(config.keep_rounds(), 0);
        assert_eq!(config.mode(), CleanMode::StripAll);
    }

    #[test]
    fn wrong_type_is_an_error() {
        let err = CleanerConfig::from_json_str(r#"{"tool_context_keep_rounds": "two"}"#)
            .unwrap_err();
        assert!(err.contains("failed to parse cleaner config"));
    }

    #[test]
    fn from_value_reads_host_object() {
        let config = CleanerConfig::from_value(serde_json::json!({
            "enable_function_call_cleaner": false,
            "tool_context_keep_rounds": 1
        }))
        .unwrap();
        assert!(!config.strip_rule().strip_assistant_tool_calls);
        assert_eq!(config.build_cleaner().mode().keep_rounds(), 1);
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let config = CleanerConfig::load("/nonexistent/tool_use_cleaner.json");
        assert_eq!(config, CleanerConfig::default());
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tool_context_keep_rounds": 4}}"#).unwrap();
        let config = CleanerConfig::load(file.path());
        assert_eq!(config.keep_rounds(), 4);
    }

    #[test]
    fn load_unparseable_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert_eq!(CleanerConfig::load(file.path()), CleanerConfig::default());
    }

    #[test]
    fn schema_lists_both_keys() {
        let schema = CleanerConfig::schema();
        let props = schema["properties"].as_object().unwrap();
        assert!(props.contains_key("enable_function_call_cleaner"));
        assert!(props.contains_key("tool_context_keep_rounds"));
    }
}
