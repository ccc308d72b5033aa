use praxis_core::Value;
use regex::Regex;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::validate::Walker;

/// Check one `type` name. `Err` carries the violation message.
pub(crate) fn type_matches(value: &Value, ty: &str) -> Result<(), String> {
    let ok = match ty {
        "string" => matches!(value, Value::String(_)),
        "number" => matches!(value, Value::Number(_)),
        "integer" => matches!(value, Value::Number(n) if n.is_finite() && n.fract() == 0.0),
        "boolean" => matches!(value, Value::Bool(_)),
        "object" => matches!(value, Value::Object(_)),
        "array" => matches!(value, Value::Array(_)),
        "null" => value.is_null(),
        other => return Err(format!("unknown type '{}' in schema", other)),
    };
    if ok {
        Ok(())
    } else {
        Err(format!("expected {}, found {}", ty, value.type_name()))
    }
}

impl Walker<'_> {
    pub(crate) fn enumeration(&mut self, value: &Value, allowed: &Value, path: &str) {
        let Value::Array(options) = allowed else {
            self.fail(path, format!("invalid 'enum' in schema: {}", allowed));
            return;
        };
        if !options.contains(value) {
            self.fail(
                path,
                format!("value '{}' is not one of the allowed values {}", value, allowed),
            );
        }
    }

    /// `minimum` / `maximum`. Both the bound and the value must be numbers.
    pub(crate) fn bound(&mut self, value: &Value, bound: &Value, keyword: &str, path: &str) {
        let Some(limit) = bound.as_f64() else {
            self.fail(path, format!("invalid '{}' in schema: {}", keyword, bound));
            return;
        };
        let Some(n) = value.as_f64() else {
            self.fail(
                path,
                format!("value '{}' is not numeric ({})", value, keyword),
            );
            return;
        };
        let violated = if keyword == "minimum" {
            n < limit
        } else {
            n > limit
        };
        if violated {
            let relation = if keyword == "minimum" {
                "less than"
            } else {
                "greater than"
            };
            self.fail(path, format!("value {} is {} {} {}", n, relation, keyword, limit));
        }
    }

    /// `pattern` only constrains strings.
    pub(crate) fn pattern(&mut self, value: &Value, pattern: &Value, path: &str) {
        let Value::String(source) = pattern else {
            self.fail(path, format!("invalid 'pattern' in schema: {}", pattern));
            return;
        };
        let Value::String(s) = value else {
            return;
        };
        let patterns = self.patterns;
        let compiled;
        let re = match patterns.get(source) {
            Some(Ok(re)) => re,
            Some(Err(e)) => {
                self.fail(path, format!("invalid pattern '{}' in schema: {}", source, e));
                return;
            }
            None => match Regex::new(source) {
                Ok(re) => {
                    compiled = re;
                    &compiled
                }
                Err(e) => {
                    self.fail(path, format!("invalid pattern '{}' in schema: {}", source, e));
                    return;
                }
            },
        };
        if !re.is_match(s) {
            self.fail(
                path,
                format!("string '{}' does not match pattern '{}'", s, source),
            );
        }
    }

    /// Only `date-time` is enforced; other formats are accepted unchecked.
    pub(crate) fn format(&mut self, value: &Value, format: &Value, path: &str) {
        let Value::String(name) = format else {
            self.fail(path, format!("invalid 'format' in schema: {}", format));
            return;
        };
        let Value::String(s) = value else {
            return;
        };
        if name == "date-time" {
            if let Err(e) = OffsetDateTime::parse(s, &Rfc3339) {
                self.fail(path, format!("invalid date-time '{}': {}", s, e));
            }
        }
    }

    /// `minItems` / `maxItems` accept a non-negative number or numeric string.
    pub(crate) fn item_count(&mut self, raw: &Value, keyword: &str, path: &str) -> Option<usize> {
        let count = match raw {
            Value::Number(n) if *n >= 0.0 && n.is_finite() => Some(n.trunc() as usize),
            Value::String(s) => s.trim().parse::<usize>().ok(),
            _ => None,
        };
        if count.is_none() {
            self.fail(path, format!("invalid '{}' in schema: {}", keyword, raw));
        }
        count
    }
}
