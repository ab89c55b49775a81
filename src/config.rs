//! Runtime configuration for the CLI and controllers.
//!
//! Config files are JSON, validated against [`validation_schema`] before
//! deserialization so users get a named-property error instead of a
//! serde type error. The schemars derives expose the same shape as a
//! machine-readable schema.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Which lexer drives the highlight pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum HighlightMode {
    #[default]
    Css,
    Simple,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct HighlightConfig {
    /// Comment link rules, each written as `"pattern -> template"`.
    #[serde(default)]
    pub match_links: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PagerConfig {
    /// Rows per page. Zero is treated as one when paging.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for PagerConfig {
    fn default() -> Self {
        PagerConfig {
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LazyConfig {
    /// Most-recently-used results kept in memory.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Keys fetched speculatively at startup.
    #[serde(default)]
    pub preload: Vec<String>,
}

impl Default for LazyConfig {
    fn default() -> Self {
        LazyConfig {
            cache_capacity: default_cache_capacity(),
            preload: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GlintConfig {
    #[serde(default)]
    pub mode: HighlightMode,

    #[serde(default)]
    pub highlight: HighlightConfig,

    #[serde(default)]
    pub pager: PagerConfig,

    #[serde(default)]
    pub lazy: LazyConfig,
}

fn default_page_size() -> usize {
    25
}

fn default_cache_capacity() -> usize {
    64
}

impl GlintConfig {
    /// Full derived JSON schema for tooling.
    pub fn json_schema() -> Value {
        schemars::schema_for!(GlintConfig).to_value()
    }
}

/// The schema config files are validated against. Hand-written in the
/// subset [`crate::schema::SchemaValidator`] supports; kept in sync with
/// the struct fields above.
pub fn validation_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "mode": { "type": "string", "pattern": "^(css|simple)$" },
            "highlight": {
                "type": "object",
                "properties": {
                    "match_links": {
                        "type": "array",
                        "items": { "type": "string", "pattern": ".+ -> .+" }
                    }
                }
            },
            "pager": {
                "type": "object",
                "properties": {
                    "page_size": { "type": "number" }
                }
            },
            "lazy": {
                "type": "object",
                "properties": {
                    "cache_capacity": { "type": "number" },
                    "preload": {
                        "type": "array",
                        "items": { "type": "string" }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaValidator;

    #[test]
    fn defaults_are_usable() {
        let config = GlintConfig::default();
        assert_eq!(config.mode, HighlightMode::Css);
        assert_eq!(config.pager.page_size, 25);
        assert_eq!(config.lazy.cache_capacity, 64);
        assert!(config.highlight.match_links.is_empty());
    }

    #[test]
    fn validation_schema_is_well_formed() {
        SchemaValidator::new(validation_schema()).unwrap();
    }

    #[test]
    fn validated_config_deserializes() {
        let raw = json!({
            "mode": "simple",
            "pager": { "page_size": 10 },
            "highlight": { "match_links": ["#(\\d+) -> https://bugs.example/%s"] }
        });
        SchemaValidator::new(validation_schema())
            .unwrap()
            .validate(&raw)
            .unwrap();
        let config: GlintConfig = serde_json::from_value(raw).unwrap();
        assert_eq!(config.mode, HighlightMode::Simple);
        assert_eq!(config.pager.page_size, 10);
        assert_eq!(config.highlight.match_links.len(), 1);
    }

    #[test]
    fn bad_mode_is_caught_by_validation() {
        let raw = json!({ "mode": "neon" });
        let err = SchemaValidator::new(validation_schema())
            .unwrap()
            .validate(&raw)
            .unwrap_err();
        assert!(err.to_string().contains("doesn't match pattern"));
    }
}
