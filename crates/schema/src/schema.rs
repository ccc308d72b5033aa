use std::collections::HashMap;

use praxis_core::Value;
use regex::Regex;

use crate::error::{SchemaError, ValidationError};
use crate::validate::Walker;

/// Compiled `pattern` keywords, keyed by source text. Patterns that fail to
/// compile keep their error message and are reported on use.
pub(crate) type PatternCache = HashMap<String, Result<Regex, String>>;

/// A loaded schema document.
///
/// The schema is kept as a [`Value`] tree and interpreted during
/// validation; only regular expressions are compiled up front.
#[derive(Debug, Clone)]
pub struct Schema {
    root: Value,
    patterns: PatternCache,
}

impl Schema {
    pub fn from_value(root: Value) -> Result<Schema, SchemaError> {
        if !matches!(root, Value::Object(_) | Value::Bool(_)) {
            return Err(SchemaError::InvalidRoot {
                found: root.type_name(),
            });
        }
        let mut patterns = PatternCache::new();
        collect_patterns(&root, &mut patterns);
        Ok(Schema { root, patterns })
    }

    pub fn from_json_str(src: &str) -> Result<Schema, SchemaError> {
        let root: Value = serde_json::from_str(src)?;
        Schema::from_value(root)
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Validate `doc`, returning every violation found (empty when valid).
    pub fn validate(&self, doc: &Value) -> Vec<ValidationError> {
        let mut walker = Walker::new(&self.patterns);
        walker.node(doc, &self.root, "");
        walker.into_errors()
    }

    pub fn is_valid(&self, doc: &Value) -> bool {
        self.validate(doc).is_empty()
    }
}

fn collect_patterns(node: &Value, cache: &mut PatternCache) {
    match node {
        Value::Object(map) => {
            if let Some(Value::String(p)) = map.get("pattern") {
                cache
                    .entry(p.clone())
                    .or_insert_with(|| Regex::new(p).map_err(|e| e.to_string()));
            }
            for child in map.values() {
                collect_patterns(child, cache);
            }
        }
        Value::Array(items) => {
            for child in items {
                collect_patterns(child, cache);
            }
        }
        _ => {}
    }
}
