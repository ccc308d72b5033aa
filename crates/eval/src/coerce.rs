//! Value coercion for comparisons and arithmetic.
//!
//! Equality only crosses kinds when both sides are numbers: `1 == 1.0`
//! holds, `1 == "1"` does not. Ordering and arithmetic accept numbers and
//! numeric strings and reject everything else.

use praxis_core::value::parse_number;
use praxis_core::{CompareOp, Value};

use crate::error::RuleError;

/// Numeric view of a value: numbers, and strings that parse as a finite
/// number (surrounding whitespace ignored).
pub fn to_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => Some(*n),
        Value::String(s) => parse_number(s.trim()),
        _ => None,
    }
}

/// `==` semantics.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y,
        _ => a == b,
    }
}

/// Ordering comparison (`>`, `>=`, `<`, `<=`).
pub fn compare_ordered(a: &Value, op: CompareOp, b: &Value) -> Result<bool, RuleError> {
    let (Some(x), Some(y)) = (to_number(a), to_number(b)) else {
        return Err(RuleError::Coercion {
            message: format!(
                "non-numeric operands: left {} ({}), right {} ({})",
                a,
                a.type_name(),
                b,
                b.type_name()
            ),
        });
    };
    Ok(match op {
        CompareOp::Gt => x > y,
        CompareOp::Gte => x >= y,
        CompareOp::Lt => x < y,
        CompareOp::Lte => x <= y,
        other => {
            return Err(RuleError::Coercion {
                message: format!("'{}' is not an ordering operator", other),
            })
        }
    })
}

/// `IN` membership. Only string values can be members.
pub fn is_member(v: &Value, list: &[String]) -> bool {
    match v {
        Value::String(s) => list.iter().any(|item| item == s),
        _ => false,
    }
}

/// Coerce an arithmetic operand, naming it in the error.
pub fn require_number(v: &Value, what: &str) -> Result<f64, RuleError> {
    to_number(v).ok_or_else(|| RuleError::Coercion {
        message: format!("{} (value: {}, type: {}) is not a number", what, v, v.type_name()),
    })
}
