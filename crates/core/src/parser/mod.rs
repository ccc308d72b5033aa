//! Rule parser.
//!
//! Rule forms are recognized in a fixed order, first match wins:
//!
//! 1. a top-level `OR` word splits the rule in two (right side recursive)
//! 2. `SET <path> = <operand>`
//! 3. `IF <rule> THEN <rule>`, split at the first top-level `THEN`
//! 4. `<path> == null` / `<path> != null`
//! 5. `<operand> <op> <operand>`, with a `[...]` list after `IN`/`NOT IN`
//!
//! "Top level" means outside any parentheses or brackets. Quoted text is a
//! single token, so keywords inside quotes never split a rule.

use crate::ast::{CompareOp, Rule};
use crate::error::ParseError;
use crate::lexer::{lex, Spanned, Token};
use crate::path::Path;

mod operands;

/// Parse one rule string.
pub fn parse_rule(text: &str) -> Result<Rule, ParseError> {
    let tokens = lex(text)?;
    parse_tokens(text, &tokens, text.len())
}

/// `end` is the offset reported for errors at the end of `tokens`.
fn parse_tokens(src: &str, tokens: &[Spanned], end: usize) -> Result<Rule, ParseError> {
    let Some(first) = tokens.first() else {
        return Err(ParseError::new(end, "empty rule"));
    };

    if let Some(i) = find_top_level_word(tokens, "OR") {
        if i == 0 || i == tokens.len() - 1 {
            return Err(ParseError::new(
                tokens[i].offset,
                "OR requires a rule on both sides",
            ));
        }
        let left = parse_tokens(src, &tokens[..i], tokens[i].offset)?;
        let right = parse_tokens(src, &tokens[i + 1..], end)?;
        return Ok(Rule::Or(Box::new(left), Box::new(right)));
    }

    match &first.token {
        Token::Word(w) if w == "SET" => {
            let mut p = Parser::new(src, &tokens[1..], end);
            let rule = p.parse_set()?;
            p.expect_end()?;
            Ok(rule)
        }
        Token::Word(w) if w == "IF" => {
            let then = find_top_level_word(tokens, "THEN")
                .ok_or_else(|| ParseError::new(end, "IF without THEN"))?;
            if then == 1 {
                return Err(ParseError::new(tokens[then].offset, "IF without a condition"));
            }
            let condition = parse_tokens(src, &tokens[1..then], tokens[then].offset)?;
            let action = parse_tokens(src, &tokens[then + 1..], end)?;
            Ok(Rule::If {
                condition: Box::new(condition),
                action: Box::new(action),
            })
        }
        _ => {
            if let Some(rule) = null_check(tokens)? {
                return Ok(rule);
            }
            let mut p = Parser::new(src, tokens, end);
            let rule = p.parse_comparison()?;
            p.expect_end()?;
            Ok(rule)
        }
    }
}

fn find_top_level_word(tokens: &[Spanned], word: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, t) in tokens.iter().enumerate() {
        match &t.token {
            Token::LParen | Token::LBracket => depth += 1,
            Token::RParen | Token::RBracket => depth = depth.saturating_sub(1),
            Token::Word(w) if depth == 0 && w == word => return Some(i),
            _ => {}
        }
    }
    None
}

fn null_check(tokens: &[Spanned]) -> Result<Option<Rule>, ParseError> {
    let [path, op, null] = tokens else {
        return Ok(None);
    };
    let negated = match op.token {
        Token::Eq => false,
        Token::Neq => true,
        _ => return Ok(None),
    };
    match (&path.token, &null.token) {
        (Token::Path(text), Token::Word(w)) if w == "null" => Ok(Some(Rule::NullCheck {
            path: parse_path(text, path.offset)?,
            negated,
        })),
        _ => Ok(None),
    }
}

pub(crate) fn parse_path(text: &str, offset: usize) -> Result<Path, ParseError> {
    Path::parse(text).map_err(|e| ParseError::new(offset, e.to_string()))
}

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

struct Parser<'a> {
    src: &'a str,
    tokens: &'a [Spanned],
    pos: usize,
    end: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, tokens: &'a [Spanned], end: usize) -> Self {
        Parser {
            src,
            tokens,
            pos: 0,
            end,
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_at(&self, ahead: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + ahead).map(|s| &s.token)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map(|s| s.offset).unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<&'a Spanned> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn is_word(&self, w: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(x)) if x == w)
    }

    fn err(&self, msg: impl Into<String>) -> ParseError {
        ParseError::new(self.offset(), msg)
    }

    fn found(&self) -> String {
        match self.peek() {
            Some(t) => t.to_string(),
            None => "end of rule".to_string(),
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ParseError> {
        if self.peek() == Some(expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected {}, got {}", expected, self.found())))
        }
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(t) => Err(self.err(format!("unexpected {} after end of rule", t))),
        }
    }

    fn take_path(&mut self) -> Result<Path, ParseError> {
        match self.peek() {
            Some(Token::Path(text)) => {
                let path = parse_path(text, self.offset())?;
                self.advance();
                Ok(path)
            }
            _ => Err(self.err(format!("expected path, got {}", self.found()))),
        }
    }

    // -- Rule forms ---------------------------------------------

    fn parse_set(&mut self) -> Result<Rule, ParseError> {
        let target = self.take_path()?;
        self.expect(&Token::Assign)?;
        let value = self.parse_operand(false)?;
        Ok(Rule::Set { target, value })
    }

    fn parse_comparison(&mut self) -> Result<Rule, ParseError> {
        let left = self.parse_operand(true)?;
        let op = self.parse_compare_op()?;
        let right = match op {
            CompareOp::In | CompareOp::NotIn => self.parse_list()?,
            _ => self.parse_operand(true)?,
        };
        Ok(Rule::Compare { left, op, right })
    }

    fn parse_compare_op(&mut self) -> Result<CompareOp, ParseError> {
        let op = match self.peek() {
            Some(Token::Eq) => CompareOp::Eq,
            Some(Token::Neq) => CompareOp::Neq,
            Some(Token::Gt) => CompareOp::Gt,
            Some(Token::Gte) => CompareOp::Gte,
            Some(Token::Lt) => CompareOp::Lt,
            Some(Token::Lte) => CompareOp::Lte,
            Some(Token::Word(w)) if w == "IN" => CompareOp::In,
            Some(Token::Word(w)) if w == "NOT" => {
                if !matches!(self.peek_at(1), Some(Token::Word(x)) if x == "IN") {
                    self.advance();
                    return Err(self.err(format!("expected 'IN' after 'NOT', got {}", self.found())));
                }
                self.advance();
                CompareOp::NotIn
            }
            _ => {
                return Err(self.err(format!(
                    "expected comparison operator, got {}",
                    self.found()
                )))
            }
        };
        self.advance();
        Ok(op)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AggregateFn, ArithExpr, ArithOp, Operand};
    use crate::value::Value;

    fn path(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    #[test]
    fn parses_simple_comparison() {
        let rule = parse_rule("$.valor > 100").unwrap();
        assert_eq!(
            rule,
            Rule::Compare {
                left: Operand::Path(path("$.valor")),
                op: CompareOp::Gt,
                right: Operand::Literal(Value::Number(100.0)),
            }
        );
        assert!(!rule.is_action());
    }

    #[test]
    fn parses_set_with_expression() {
        let rule = parse_rule("SET $.total = EXP($.valor * 0.9)").unwrap();
        assert_eq!(
            rule,
            Rule::Set {
                target: path("$.total"),
                value: Operand::Expr(Box::new(ArithExpr::Binary(
                    Operand::Path(path("$.valor")),
                    ArithOp::Mul,
                    Operand::Literal(Value::Number(0.9)),
                ))),
            }
        );
        assert!(rule.is_action());
    }

    #[test]
    fn set_literals_follow_number_bool_string_order() {
        let value = |src: &str| match parse_rule(src).unwrap() {
            Rule::Set { value, .. } => value,
            other => panic!("expected SET, got {:?}", other),
        };
        assert_eq!(
            value("SET $.d = 15.0"),
            Operand::Literal(Value::Number(15.0))
        );
        assert_eq!(value("SET $.d = true"), Operand::Literal(Value::Bool(true)));
        assert_eq!(value("SET $.d = null"), Operand::Literal(Value::Null));
        assert_eq!(
            value("SET $.d = 'premium'"),
            Operand::Literal(Value::from("premium"))
        );
        assert_eq!(
            value("SET $.d = cliente  vip"),
            Operand::Literal(Value::from("cliente  vip"))
        );
        assert_eq!(
            value("SET $.d = 2024-01-01"),
            Operand::Literal(Value::from("2024-01-01"))
        );
        assert_eq!(
            value("SET $.d = ana@x.com"),
            Operand::Literal(Value::from("ana@x.com"))
        );
        assert_eq!(value("SET $.d = 1e3"), Operand::Literal(Value::Number(1000.0)));
        assert_eq!(
            value("SET $.d = aguardando == revisao"),
            Operand::Literal(Value::from("aguardando == revisao"))
        );
        assert_eq!(
            value("SET $.d = COUNT($.itens)"),
            Operand::Aggregate(AggregateFn::Count, path("$.itens"))
        );
        assert_eq!(value("SET $.d = $.e"), Operand::Path(path("$.e")));
    }

    #[test]
    fn or_splits_at_first_top_level_word() {
        let rule = parse_rule("$.moeda == 'USD' OR $.moeda == EUR OR $.moeda == BRL").unwrap();
        match rule {
            Rule::Or(left, right) => {
                assert_eq!(left.to_string(), "$.moeda == 'USD'");
                assert!(matches!(*right, Rule::Or(..)));
            }
            other => panic!("expected OR, got {:?}", other),
        }
    }

    #[test]
    fn or_takes_precedence_over_if() {
        let rule = parse_rule("IF $.a > 1 THEN SET $.b = 1 OR $.c == 2").unwrap();
        match rule {
            Rule::Or(left, _) => assert!(matches!(*left, Rule::If { .. })),
            other => panic!("expected OR, got {:?}", other),
        }
    }

    #[test]
    fn quoted_or_does_not_split() {
        let rule = parse_rule("$.nota == 'a OR b'").unwrap();
        assert!(matches!(rule, Rule::Compare { .. }));
    }

    #[test]
    fn comparison_operands_fall_back_to_verbatim_literals() {
        assert_eq!(
            parse_rule("$.nome == O'Brien").unwrap(),
            Rule::Compare {
                left: Operand::Path(path("$.nome")),
                op: CompareOp::Eq,
                right: Operand::Literal(Value::from("O'Brien")),
            }
        );
        assert_eq!(
            parse_rule("$.status != em-analise").unwrap(),
            Rule::Compare {
                left: Operand::Path(path("$.status")),
                op: CompareOp::Neq,
                right: Operand::Literal(Value::from("em-analise")),
            }
        );
        assert_eq!(
            parse_rule("$.cep-origem IN [01000-000, sem  cep]").unwrap(),
            Rule::Compare {
                left: Operand::Path(path("$.cep-origem")),
                op: CompareOp::In,
                right: Operand::List(vec!["01000-000".into(), "sem  cep".into()]),
            }
        );
        assert_eq!(
            parse_rule("$.v == 1e3").unwrap().to_string(),
            "$.v == 1000"
        );
    }

    #[test]
    fn parses_if_then() {
        let rule = parse_rule("IF $.valor > 1000 THEN SET $.aprovacao = 'manual'").unwrap();
        match rule {
            Rule::If { condition, action } => {
                assert_eq!(condition.to_string(), "$.valor > 1000");
                assert_eq!(action.to_string(), "SET $.aprovacao = 'manual'");
            }
            other => panic!("expected IF, got {:?}", other),
        }
    }

    #[test]
    fn parses_null_checks() {
        assert_eq!(
            parse_rule("$.cliente.email != null").unwrap(),
            Rule::NullCheck {
                path: path("$.cliente.email"),
                negated: true,
            }
        );
        // A literal on the left is an ordinary comparison.
        assert!(matches!(
            parse_rule("1 == null").unwrap(),
            Rule::Compare { .. }
        ));
    }

    #[test]
    fn parses_membership_lists() {
        let rule = parse_rule("$.estado NOT IN [SP, 'RJ', 42]").unwrap();
        assert_eq!(
            rule,
            Rule::Compare {
                left: Operand::Path(path("$.estado")),
                op: CompareOp::NotIn,
                right: Operand::List(vec!["SP".into(), "RJ".into(), "42".into()]),
            }
        );
        assert_eq!(rule.to_string(), "$.estado NOT IN [SP, RJ, 42]");
        assert!(matches!(
            parse_rule("$.x IN []").unwrap(),
            Rule::Compare { right: Operand::List(ref v), .. } if v.is_empty()
        ));
    }

    #[test]
    fn parses_nested_expressions_and_aggregates() {
        let rule = parse_rule("EXP(SUM($.itens) / EXP($.n + 1)) >= 2").unwrap();
        assert_eq!(rule.to_string(), "EXP(SUM($.itens) / EXP($.n + 1)) >= 2");
    }

    #[test]
    fn reports_errors_with_offsets() {
        let err = parse_rule("$.valor >").unwrap_err();
        assert_eq!(err.position, 9);

        let err = parse_rule("$.valor ?? 1").unwrap_err();
        assert_eq!(err.position, 8);

        assert!(parse_rule("").is_err());
        assert!(parse_rule("SET valor = 1").is_err());
        assert!(parse_rule("SET $.a == 1").is_err());
        assert!(parse_rule("IF $.a > 1").is_err());
        assert!(parse_rule("$.a > 1 OR").is_err());
        assert!(parse_rule("$.a IN SP").is_err());
        assert!(parse_rule("$.a NOT [SP]").is_err());
        assert!(parse_rule("$.a > 1 == 2").is_err());
        assert!(parse_rule("EXP($.a + ) > 1").is_err());
        assert!(parse_rule("EXP('x') > 1").is_err());
        assert!(parse_rule("SUM(3) > 1").is_err());
        assert!(parse_rule("$.a[x] > 1").is_err());
    }
}
