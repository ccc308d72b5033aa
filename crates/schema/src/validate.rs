//! Recursive schema walk.
//!
//! Every keyword is checked independently and every violation is recorded;
//! nothing short-circuits except a boolean `false` schema, which rejects
//! the value outright. Object keywords (`required`, `properties`,
//! `additionalProperties`) apply when the value is a mapping and `type` is
//! absent or admits `object`. Array keywords apply likewise for sequences.
//! A value of the wrong kind is reported once, by `type`.

use praxis_core::{Map, Value};

use crate::error::ValidationError;
use crate::keywords::type_matches;
use crate::schema::PatternCache;

pub(crate) struct Walker<'s> {
    pub(crate) patterns: &'s PatternCache,
    errors: Vec<ValidationError>,
}

/// Path of a child location under `parent`.
fn join(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", parent, segment)
    }
}

/// Whether the `type` keyword (if any) allows values of `kind`.
fn admits(keywords: &Map, kind: &str) -> bool {
    match keywords.get("type") {
        None => true,
        Some(Value::String(t)) => t == kind,
        Some(Value::Array(alts)) => alts.iter().any(|t| t.as_str() == Some(kind)),
        Some(_) => false,
    }
}

impl<'s> Walker<'s> {
    pub(crate) fn new(patterns: &'s PatternCache) -> Self {
        Walker {
            patterns,
            errors: Vec::new(),
        }
    }

    pub(crate) fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    pub(crate) fn fail(&mut self, path: &str, message: impl Into<String>) {
        self.errors.push(ValidationError::new(path, message));
    }

    pub(crate) fn node(&mut self, value: &Value, schema: &Value, path: &str) {
        let keywords = match schema {
            Value::Bool(true) => return,
            Value::Bool(false) => {
                self.fail(path, "value not allowed (schema is false)");
                return;
            }
            Value::Object(map) => map,
            other => {
                self.fail(
                    path,
                    format!(
                        "invalid schema: expected object or boolean, found {}",
                        other.type_name()
                    ),
                );
                return;
            }
        };

        if let Some(ty) = keywords.get("type") {
            self.check_type(value, ty, path);
        }
        match value {
            Value::Object(obj) if admits(keywords, "object") => self.object(obj, keywords, path),
            Value::Array(items) if admits(keywords, "array") => self.array(items, keywords, path),
            _ => {}
        }

        if let Some(allowed) = keywords.get("enum") {
            self.enumeration(value, allowed, path);
        }
        if let Some(bound) = keywords.get("minimum") {
            self.bound(value, bound, "minimum", path);
        }
        if let Some(bound) = keywords.get("maximum") {
            self.bound(value, bound, "maximum", path);
        }
        if let Some(pattern) = keywords.get("pattern") {
            self.pattern(value, pattern, path);
        }
        if let Some(format) = keywords.get("format") {
            self.format(value, format, path);
        }
    }

    // ──────────────────────────────────────────────
    // type
    // ──────────────────────────────────────────────

    fn check_type(&mut self, value: &Value, ty: &Value, path: &str) {
        match ty {
            Value::String(t) => {
                if let Err(message) = type_matches(value, t) {
                    self.fail(path, message);
                }
            }
            Value::Array(alts) => {
                let names: Vec<&str> = alts.iter().filter_map(Value::as_str).collect();
                if names.len() != alts.len() {
                    self.fail(path, format!("invalid 'type' in schema: {}", ty));
                    return;
                }
                if !names.iter().any(|t| type_matches(value, t).is_ok()) {
                    self.fail(
                        path,
                        format!(
                            "expected one of [{}], found {}",
                            names.join(", "),
                            value.type_name()
                        ),
                    );
                }
            }
            other => self.fail(path, format!("invalid 'type' in schema: {}", other)),
        }
    }

    // ──────────────────────────────────────────────
    // Objects
    // ──────────────────────────────────────────────

    fn object(&mut self, obj: &Map, keywords: &Map, path: &str) {
        match keywords.get("required") {
            None => {}
            Some(Value::Array(names)) => {
                for name in names {
                    match name.as_str() {
                        Some(key) if !obj.contains_key(key) => {
                            self.fail(path, format!("required property '{}' is missing", key))
                        }
                        Some(_) => {}
                        None => self.fail(
                            path,
                            format!("invalid entry {} in 'required'", name),
                        ),
                    }
                }
            }
            Some(other) => self.fail(path, format!("invalid 'required' in schema: {}", other)),
        }

        let properties = match keywords.get("properties") {
            None => None,
            Some(Value::Object(props)) => Some(props),
            Some(other) => {
                self.fail(path, format!("invalid 'properties' in schema: {}", other));
                None
            }
        };
        let additional = keywords.get("additionalProperties");

        for (key, child) in obj {
            if let Some(sub) = properties.and_then(|p| p.get(key)) {
                self.node(child, sub, &join(path, key));
                continue;
            }
            match additional {
                Some(Value::Bool(false)) => {
                    self.fail(path, format!("additional property '{}' is not allowed", key))
                }
                Some(sub @ Value::Object(_)) => self.node(child, sub, &join(path, key)),
                // Absent, `true` or anything else permits the key.
                _ => {}
            }
        }
    }

    // ──────────────────────────────────────────────
    // Arrays
    // ──────────────────────────────────────────────

    fn array(&mut self, items: &[Value], keywords: &Map, path: &str) {
        match keywords.get("items") {
            None => {}
            Some(Value::Array(tuple)) => {
                let additional = keywords.get("additionalItems");
                for (i, item) in items.iter().enumerate() {
                    if let Some(sub) = tuple.get(i) {
                        self.node(item, sub, &join(path, &format!("items[{}]", i)));
                        continue;
                    }
                    match additional {
                        Some(Value::Bool(false)) => self.fail(
                            path,
                            format!("additional item at index {} is not allowed", i),
                        ),
                        Some(sub @ Value::Object(_)) => {
                            self.node(item, sub, &join(path, &format!("additionalItems[{}]", i)))
                        }
                        _ => {}
                    }
                }
            }
            Some(sub @ (Value::Object(_) | Value::Bool(_))) => {
                for (i, item) in items.iter().enumerate() {
                    self.node(item, sub, &join(path, &format!("items[{}]", i)));
                }
            }
            Some(other) => self.fail(path, format!("invalid 'items' in schema: {}", other)),
        }

        if let Some(min) = keywords.get("minItems") {
            match self.item_count(min, "minItems", path) {
                Some(min) if items.len() < min => self.fail(
                    path,
                    format!("array has {} items, fewer than minItems ({})", items.len(), min),
                ),
                _ => {}
            }
        }
        if let Some(max) = keywords.get("maxItems") {
            match self.item_count(max, "maxItems", path) {
                Some(max) if items.len() > max => self.fail(
                    path,
                    format!("array has {} items, more than maxItems ({})", items.len(), max),
                ),
                _ => {}
            }
        }
    }
}
