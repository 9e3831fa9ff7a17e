//! Configuration types for modelpin conversions.
//!
//! All types implement [`serde::Deserialize`] for loading from external
//! sources such as a TOML file.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration: source framework, graph-name
//!   prefix and default directives.
//!
//! # Example
//!
//! ```
//! # use modelpin::config::AppConfig;
//! # use modelpin_core::framework::Framework;
//! let config = AppConfig::default();
//! assert_eq!(config.framework(), Framework::Tensorflow);
//! assert!(config.directives().is_empty());
//! ```

use indexmap::IndexMap;
use serde::Deserialize;

use modelpin_core::framework::Framework;

const DEFAULT_GRAPH_NAME_PREFIX: &str = "modelpin_graph";

/// Top-level modelpin configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Framework the model was exported from.
    #[serde(default)]
    framework: Framework,

    /// Prefix of the generated graph name when no `output` directive is set.
    #[serde(default = "default_graph_name_prefix")]
    graph_name_prefix: String,

    /// Default directives, keyed by directive name.
    #[serde(default)]
    directives: IndexMap<String, String>,
}

fn default_graph_name_prefix() -> String {
    DEFAULT_GRAPH_NAME_PREFIX.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            framework: Framework::default(),
            graph_name_prefix: default_graph_name_prefix(),
            directives: IndexMap::new(),
        }
    }
}

impl AppConfig {
    /// Creates a new [`AppConfig`].
    ///
    /// # Arguments
    ///
    /// * `framework` - Framework the model was exported from.
    /// * `graph_name_prefix` - Prefix for generated graph names.
    /// * `directives` - Default directive values.
    pub fn new(
        framework: Framework,
        graph_name_prefix: impl Into<String>,
        directives: IndexMap<String, String>,
    ) -> Self {
        Self {
            framework,
            graph_name_prefix: graph_name_prefix.into(),
            directives,
        }
    }

    pub fn framework(&self) -> Framework {
        self.framework
    }

    pub fn set_framework(&mut self, framework: Framework) {
        self.framework = framework;
    }

    pub fn graph_name_prefix(&self) -> &str {
        &self.graph_name_prefix
    }

    /// Returns the configured default directives.
    pub fn directives(&self) -> &IndexMap<String, String> {
        &self.directives
    }

    /// Returns the configured directives overlaid with `overrides`.
    ///
    /// Keys present in both keep the configured position and take the
    /// override value; new keys are appended in override order.
    pub fn merged_directives<'a>(
        &self,
        overrides: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> IndexMap<String, String> {
        let mut merged = self.directives.clone();
        for (key, value) in overrides {
            merged.insert(key.to_string(), value.to_string());
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prefix() {
        let config = AppConfig::default();
        assert_eq!(config.graph_name_prefix(), "modelpin_graph");
        assert_eq!(config.framework(), Framework::Tensorflow);
    }

    #[test]
    fn test_merged_directives_override_in_place() {
        let mut directives = IndexMap::new();
        directives.insert("input_format".to_string(), "NCHW".to_string());
        directives.insert("out_nodes".to_string(), "a:0".to_string());
        let config = AppConfig::new(Framework::Onnx, "net", directives);

        let merged = config.merged_directives([("out_nodes", "b:1"), ("log", "info")]);

        let keys: Vec<&str> = merged.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["input_format", "out_nodes", "log"]);
        assert_eq!(merged["out_nodes"], "b:1");
    }
}
