//! Rule evaluator.
//!
//! Executes one parsed [`Rule`] against one document. The document is
//! borrowed mutably because `SET` (directly or as an `IF` action) writes
//! into it. Evaluation never panics and never aborts: failures come back as
//! a [`RuleOutcome`] with `passed == false` and the error attached.
//!
//! `details` is a human-readable trace of how the result was reached, for
//! example `path $.valor = 150 > literal 100.000000 -> true`.

use praxis_core::path;
use praxis_core::{parse_rule, ArithExpr, ArithOp, CompareOp, Operand, Path, Rule, Value};

use crate::aggregate::aggregate_path;
use crate::coerce::{compare_ordered, is_member, require_number, values_equal};
use crate::error::RuleError;

/// Result of evaluating one rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub passed: bool,
    pub details: String,
    pub error: Option<RuleError>,
}

impl RuleOutcome {
    fn done(passed: bool, details: String) -> Self {
        RuleOutcome {
            passed,
            details,
            error: None,
        }
    }

    pub(crate) fn failed(error: RuleError, details: String) -> Self {
        RuleOutcome {
            passed: false,
            details,
            error: Some(error),
        }
    }
}

/// A resolved operand and how it was obtained.
struct Evaluated {
    value: Value,
    details: String,
}

/// An operand that could not be resolved.
struct Failure {
    error: RuleError,
    details: String,
}

impl From<RuleError> for Failure {
    fn from(error: RuleError) -> Self {
        Failure {
            details: error.to_string(),
            error,
        }
    }
}

/// Parse and evaluate rule text in one step.
pub fn evaluate_str(text: &str, doc: &mut Value) -> RuleOutcome {
    match parse_rule(text.trim()) {
        Ok(rule) => evaluate(&rule, doc),
        Err(e) => {
            let details = format!("invalid rule: {}", e);
            RuleOutcome::failed(RuleError::Parse(e), details)
        }
    }
}

pub fn evaluate(rule: &Rule, doc: &mut Value) -> RuleOutcome {
    match rule {
        Rule::Or(left, right) => eval_or(left, right, doc),
        Rule::Set { target, value } => eval_set(target, value, doc),
        Rule::If { condition, action } => eval_if(condition, action, doc),
        Rule::NullCheck { path, negated } => eval_null_check(path, *negated, doc),
        Rule::Compare { left, op, right } => eval_compare(left, *op, right, doc),
    }
}

// ──────────────────────────────────────────────
// Rule forms
// ──────────────────────────────────────────────

fn eval_or(left: &Rule, right: &Rule, doc: &mut Value) -> RuleOutcome {
    let l = evaluate(left, doc);
    if let Some(e) = l.error {
        return RuleOutcome::failed(e, format!("OR left side error ('{}'): {}", left, l.details));
    }
    if l.passed {
        return RuleOutcome::done(
            true,
            format!("({}) OR ('{}' not evaluated) -> true", l.details, right),
        );
    }
    let r = evaluate(right, doc);
    if let Some(e) = r.error {
        return RuleOutcome::failed(e, format!("OR right side error ('{}'): {}", right, r.details));
    }
    RuleOutcome::done(
        r.passed,
        format!("({}) OR ({}) -> {}", l.details, r.details, r.passed),
    )
}

fn eval_set(target: &Path, value: &Operand, doc: &mut Value) -> RuleOutcome {
    let (new_value, eval_details) = match value {
        Operand::Literal(v) => (v.clone(), format!("literal = {}", v)),
        other => match operand(other, doc) {
            Ok(ev) => (ev.value, ev.details),
            Err(f) => {
                return RuleOutcome::failed(
                    f.error,
                    format!("error evaluating value for SET {}: {}", target, f.details),
                )
            }
        },
    };
    let shown = new_value.to_string();
    match path::set(doc, target, new_value) {
        Ok(()) => RuleOutcome::done(
            true,
            format!("SET {} = {} (details: {})", target, shown, eval_details),
        ),
        Err(e) => {
            let details = format!(
                "failed to SET {}: {}. Evaluation details: {}",
                target, e, eval_details
            );
            RuleOutcome::failed(e.into(), details)
        }
    }
}

fn eval_if(condition: &Rule, action: &Rule, doc: &mut Value) -> RuleOutcome {
    let cond = evaluate(condition, doc);
    if let Some(e) = cond.error {
        return RuleOutcome::failed(
            e,
            format!("IF condition error ('{}'): {}", condition, cond.details),
        );
    }
    if !cond.passed {
        return RuleOutcome::done(
            true,
            format!("IF ({}) -> false, action skipped: {}", cond.details, action),
        );
    }
    let act = evaluate(action, doc);
    if let Some(e) = act.error {
        return RuleOutcome::failed(
            e,
            format!(
                "IF ({}) -> true, THEN action error ('{}'): {}",
                cond.details, action, act.details
            ),
        );
    }
    RuleOutcome::done(
        act.passed,
        format!(
            "IF ({}) -> true, THEN ({}) -> {}",
            cond.details, act.details, act.passed
        ),
    )
}

fn eval_null_check(target: &Path, negated: bool, doc: &Value) -> RuleOutcome {
    let found = match path::get(doc, target) {
        Ok(found) => found,
        Err(e) => {
            let details = format!("error resolving '{}' in null check: {}", target, e);
            return RuleOutcome::failed(e.into(), details);
        }
    };
    // Absent and explicit null are the same for this check.
    let is_null = found.map_or(true, Value::is_null);
    let result = if negated { !is_null } else { is_null };
    let shown = found.map_or_else(|| "null".to_string(), ToString::to_string);
    RuleOutcome::done(
        result,
        format!(
            "{} ({}) {} null -> {}",
            target,
            shown,
            if negated { "!=" } else { "==" },
            result
        ),
    )
}

fn eval_compare(left: &Operand, op: CompareOp, right: &Operand, doc: &Value) -> RuleOutcome {
    let l = match operand(left, doc) {
        Ok(v) => v,
        Err(f) => {
            return RuleOutcome::failed(
                f.error,
                format!("error evaluating left operand '{}': {}", left, f.details),
            )
        }
    };
    let r = match operand(right, doc) {
        Ok(v) => v,
        Err(f) => {
            return RuleOutcome::failed(
                f.error,
                format!("error evaluating right operand '{}': {}", right, f.details),
            )
        }
    };

    let result = match op {
        CompareOp::Eq => values_equal(&l.value, &r.value),
        CompareOp::Neq => !values_equal(&l.value, &r.value),
        CompareOp::In | CompareOp::NotIn => {
            let items: &[String] = match right {
                Operand::List(items) => items,
                _ => &[],
            };
            is_member(&l.value, items) == (op == CompareOp::In)
        }
        CompareOp::Gt | CompareOp::Gte | CompareOp::Lt | CompareOp::Lte => {
            match compare_ordered(&l.value, op, &r.value) {
                Ok(b) => b,
                Err(e) => {
                    let details = format!("{} {} {} -> ERROR: {}", l.details, op, r.details, e);
                    return RuleOutcome::failed(e, details);
                }
            }
        }
    };
    RuleOutcome::done(
        result,
        format!("{} {} {} -> {}", l.details, op, r.details, result),
    )
}

// ──────────────────────────────────────────────
// Operands
// ──────────────────────────────────────────────

fn literal_details(v: &Value) -> String {
    match v {
        Value::Number(n) => format!("literal {:.6}", n),
        Value::String(s) => format!("literal string '{}'", s),
        other => format!("literal {}", other),
    }
}

fn operand(op: &Operand, doc: &Value) -> Result<Evaluated, Failure> {
    match op {
        Operand::Path(p) => match path::get(doc, p) {
            Ok(Some(v)) => Ok(Evaluated {
                details: format!("path {} = {}", p, v),
                value: v.clone(),
            }),
            Ok(None) => Ok(Evaluated {
                value: Value::Null,
                details: format!("path {} = null (absent)", p),
            }),
            Err(e) => Err(Failure {
                details: format!("failed to resolve {}: {}", p, e),
                error: e.into(),
            }),
        },
        Operand::Literal(v) => Ok(Evaluated {
            value: v.clone(),
            details: literal_details(v),
        }),
        Operand::Expr(expr) => {
            let (n, details) = arith(expr, doc)?;
            Ok(Evaluated {
                value: Value::Number(n),
                details: format!("EXP({})", details),
            })
        }
        Operand::Aggregate(func, p) => match aggregate_path(*func, doc, p) {
            Ok(n) => Ok(Evaluated {
                value: Value::Number(n),
                details: format!("{}({}) = {}", func.name(), p, n),
            }),
            Err(e) => Err(Failure {
                details: format!("{}({}) failed: {}", func.name(), p, e),
                error: e,
            }),
        },
        Operand::List(items) => Ok(Evaluated {
            value: Value::Array(items.iter().map(|s| Value::from(s.as_str())).collect()),
            details: format!("list [{}]", items.join(", ")),
        }),
    }
}

/// Evaluate an `EXP(...)` body to a number plus its trace.
fn arith(expr: &ArithExpr, doc: &Value) -> Result<(f64, String), Failure> {
    match expr {
        ArithExpr::Single(term) => {
            let n = arith_term(term, doc)?;
            Ok((n, format!("{:.6}", n)))
        }
        ArithExpr::Binary(a, op, b) => {
            let x = arith_term(a, doc)?;
            let y = arith_term(b, doc)?;
            if *op == ArithOp::Div && y == 0.0 {
                return Err(Failure {
                    error: RuleError::DivisionByZero {
                        expression: expr.to_string(),
                    },
                    details: format!("{:.2} / {:.2} -> ERROR: division by zero", x, y),
                });
            }
            let result = op.apply(x, y);
            Ok((
                result,
                format!("{:.2} {} {:.2} = {:.2}", x, op.symbol(), y, result),
            ))
        }
    }
}

fn arith_term(term: &Operand, doc: &Value) -> Result<f64, Failure> {
    if let Operand::Expr(inner) = term {
        return Ok(arith(inner, doc)?.0);
    }
    let ev = operand(term, doc)?;
    require_number(&ev.value, &format!("operand '{}'", term)).map_err(Failure::from)
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
