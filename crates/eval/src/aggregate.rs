//! `SUM`, `COUNT`, `MAX`, `MIN` and `AVERAGE` over a sequence.

use praxis_core::path::{self, Path};
use praxis_core::{AggregateFn, Value};

use crate::coerce::to_number;
use crate::error::RuleError;

/// Resolve `target` in `doc` and fold it with `func`.
pub fn aggregate_path(func: AggregateFn, doc: &Value, target: &Path) -> Result<f64, RuleError> {
    match path::get(doc, target)? {
        Some(Value::Array(items)) => aggregate(func, items, target),
        _ => Err(RuleError::NotASequence {
            path: target.to_string(),
        }),
    }
}

/// Every function yields `0` on an empty sequence, `MAX` and `MIN`
/// included. `COUNT` accepts elements of any kind; the others need
/// elements that coerce to numbers.
pub fn aggregate(func: AggregateFn, items: &[Value], target: &Path) -> Result<f64, RuleError> {
    if items.is_empty() {
        return Ok(0.0);
    }
    if func == AggregateFn::Count {
        return Ok(items.len() as f64);
    }

    let mut numbers = Vec::with_capacity(items.len());
    for item in items {
        let n = to_number(item).ok_or_else(|| RuleError::Coercion {
            message: format!("invalid number in array '{}': {}", target, item),
        })?;
        numbers.push(n);
    }

    let sum: f64 = numbers.iter().sum();
    let result = match func {
        AggregateFn::Sum => sum,
        AggregateFn::Average => sum / numbers.len() as f64,
        AggregateFn::Max => numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        AggregateFn::Min => numbers.iter().copied().fold(f64::INFINITY, f64::min),
        AggregateFn::Count => numbers.len() as f64,
    };
    Ok(result)
}
