//! Rule AST.
//!
//! Produced by [`crate::parser::parse_rule`]. The `Display` impls render a
//! canonical form of each node, used in evaluation traces.

use std::fmt;

use crate::path::Path;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// `<rule> OR <rule>`; the right side is only evaluated when the left
    /// does not pass.
    Or(Box<Rule>, Box<Rule>),
    /// `SET <path> = <operand>`
    Set { target: Path, value: Operand },
    /// `IF <rule> THEN <rule>`
    If {
        condition: Box<Rule>,
        action: Box<Rule>,
    },
    /// `<path> == null` / `<path> != null`
    NullCheck { path: Path, negated: bool },
    /// `<operand> <op> <operand>`
    Compare {
        left: Operand,
        op: CompareOp,
        right: Operand,
    },
}

impl Rule {
    /// Action rules (`SET`, `IF`) pass whenever they execute without error;
    /// everything else is a condition that may halt its policy.
    pub fn is_action(&self) -> bool {
        matches!(self, Rule::Set { .. } | Rule::If { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Neq => "!=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::In => "IN",
            CompareOp::NotIn => "NOT IN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Path(Path),
    Literal(Value),
    Expr(Box<ArithExpr>),
    Aggregate(AggregateFn, Path),
    /// Right-hand side of `IN` / `NOT IN`. Elements are always strings.
    List(Vec<String>),
}

/// Body of `EXP(...)`: one term, or two terms joined by one operator.
#[derive(Debug, Clone, PartialEq)]
pub enum ArithExpr {
    Single(Operand),
    Binary(Operand, ArithOp, Operand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub fn symbol(self) -> char {
        match self {
            ArithOp::Add => '+',
            ArithOp::Sub => '-',
            ArithOp::Mul => '*',
            ArithOp::Div => '/',
        }
    }

    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => a / b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    Sum,
    Count,
    Max,
    Min,
    Average,
}

impl AggregateFn {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "SUM" => Some(AggregateFn::Sum),
            "COUNT" => Some(AggregateFn::Count),
            "MAX" => Some(AggregateFn::Max),
            "MIN" => Some(AggregateFn::Min),
            "AVERAGE" => Some(AggregateFn::Average),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AggregateFn::Sum => "SUM",
            AggregateFn::Count => "COUNT",
            AggregateFn::Max => "MAX",
            AggregateFn::Min => "MIN",
            AggregateFn::Average => "AVERAGE",
        }
    }
}

// ──────────────────────────────────────────────
// Canonical rendering
// ──────────────────────────────────────────────

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Or(l, r) => write!(f, "{} OR {}", l, r),
            Rule::Set { target, value } => write!(f, "SET {} = {}", target, value),
            Rule::If { condition, action } => write!(f, "IF {} THEN {}", condition, action),
            Rule::NullCheck { path, negated } => {
                write!(f, "{} {} null", path, if *negated { "!=" } else { "==" })
            }
            Rule::Compare { left, op, right } => write!(f, "{} {} {}", left, op, right),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Path(p) => write!(f, "{}", p),
            Operand::Literal(Value::String(s)) => {
                write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
            }
            Operand::Literal(v) => write!(f, "{}", v),
            Operand::Expr(e) => write!(f, "EXP({})", e),
            Operand::Aggregate(func, p) => write!(f, "{}({})", func.name(), p),
            Operand::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

impl fmt::Display for ArithExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArithExpr::Single(o) => write!(f, "{}", o),
            ArithExpr::Binary(a, op, b) => write!(f, "{} {} {}", a, op.symbol(), b),
        }
    }
}
