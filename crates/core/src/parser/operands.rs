use super::Parser;
use crate::ast::{AggregateFn, ArithExpr, ArithOp, Operand};
use crate::error::ParseError;
use crate::lexer::{Spanned, Token};
use crate::value::{parse_number, Value};

impl<'a> Parser<'a> {
    // -- Operands -----------------------------------------------

    /// A `SET` value or one side of a comparison.
    ///
    /// Paths, numbers, quoted strings and function calls are read as such.
    /// Anything else is a literal taken verbatim from the rule text, up to
    /// the comparison operator when `stop_at_compare` is set and to the end
    /// of the rule otherwise.
    pub(super) fn parse_operand(&mut self, stop_at_compare: bool) -> Result<Operand, ParseError> {
        if let Some(Token::Word(w)) = self.peek() {
            if self.peek_at(1) == Some(&Token::LParen) {
                return self.parse_call(w);
            }
        }
        let extent = self.operand_extent(stop_at_compare);
        if extent == self.pos {
            return Err(self.err(format!("expected operand, got {}", self.found())));
        }
        let single = extent == self.pos + 1;
        match self.peek() {
            Some(Token::Path(_)) => Ok(Operand::Path(self.take_path()?)),
            Some(Token::Number(raw)) if single => {
                let n = self.number(raw)?;
                self.advance();
                Ok(Operand::Literal(Value::Number(n)))
            }
            Some(Token::Str(s)) if single => {
                self.advance();
                Ok(Operand::Literal(Value::String(s.clone())))
            }
            _ => {
                let text = self.raw(self.pos, extent);
                self.pos = extent;
                Ok(Operand::Literal(Value::parse_literal(text)))
            }
        }
    }

    /// Index one past the last token of the operand starting here.
    fn operand_extent(&self, stop_at_compare: bool) -> usize {
        let mut i = self.pos;
        while i < self.tokens.len() {
            if stop_at_compare && self.starts_comparison(i) {
                break;
            }
            i += 1;
        }
        i
    }

    fn starts_comparison(&self, i: usize) -> bool {
        match &self.tokens[i].token {
            Token::Eq
            | Token::Neq
            | Token::Lt
            | Token::Lte
            | Token::Gt
            | Token::Gte
            | Token::Assign => true,
            Token::Word(w) if w == "IN" => true,
            Token::Word(w) if w == "NOT" => {
                matches!(self.tokens.get(i + 1).map(|s| &s.token), Some(Token::Word(x)) if x == "IN")
            }
            _ => false,
        }
    }

    /// Rule text covered by tokens `from..to`.
    fn raw(&self, from: usize, to: usize) -> &'a str {
        &self.src[self.tokens[from].offset..self.tokens[to - 1].end]
    }

    fn parse_call(&mut self, name: &str) -> Result<Operand, ParseError> {
        if name == "EXP" {
            Ok(Operand::Expr(Box::new(self.parse_exp()?)))
        } else if let Some(func) = AggregateFn::from_name(name) {
            self.parse_aggregate(func)
        } else {
            Err(self.err(format!("unknown function '{}'", name)))
        }
    }

    fn number(&self, raw: &str) -> Result<f64, ParseError> {
        parse_number(raw).ok_or_else(|| self.err(format!("number out of range: {}", raw)))
    }

    fn parse_aggregate(&mut self, func: AggregateFn) -> Result<Operand, ParseError> {
        self.advance(); // function name
        self.expect(&Token::LParen)?;
        let path = self.take_path()?;
        self.expect(&Token::RParen)?;
        Ok(Operand::Aggregate(func, path))
    }

    // -- Arithmetic ---------------------------------------------

    /// `EXP(<term> [<op> <term>])`
    fn parse_exp(&mut self) -> Result<ArithExpr, ParseError> {
        self.advance(); // EXP
        self.expect(&Token::LParen)?;
        let first = self.parse_arith_term()?;
        let op = match self.peek() {
            Some(Token::Plus) => Some(ArithOp::Add),
            Some(Token::Minus) => Some(ArithOp::Sub),
            Some(Token::Star) => Some(ArithOp::Mul),
            Some(Token::Slash) => Some(ArithOp::Div),
            _ => None,
        };
        let expr = match op {
            Some(op) => {
                self.advance();
                let second = self.parse_arith_term()?;
                ArithExpr::Binary(first, op, second)
            }
            None => ArithExpr::Single(first),
        };
        self.expect(&Token::RParen)?;
        Ok(expr)
    }

    fn parse_arith_term(&mut self) -> Result<Operand, ParseError> {
        match self.peek() {
            Some(Token::Path(_)) => Ok(Operand::Path(self.take_path()?)),
            Some(Token::Number(raw)) => {
                let n = self.number(raw)?;
                self.advance();
                Ok(Operand::Literal(Value::Number(n)))
            }
            Some(Token::Word(w)) if self.peek_at(1) == Some(&Token::LParen) => self.parse_call(w),
            _ => Err(self.err(format!(
                "expected numeric operand in EXP, got {}",
                self.found()
            ))),
        }
    }

    // -- Lists --------------------------------------------------

    /// `[a, 'b', 3]`; every element is kept as a string. Unquoted elements
    /// are the text between separators, keywords included.
    pub(super) fn parse_list(&mut self) -> Result<Operand, ParseError> {
        self.expect(&Token::LBracket)?;
        let mut items = Vec::new();
        if self.peek() == Some(&Token::RBracket) {
            self.advance();
            return Ok(Operand::List(items));
        }
        loop {
            let start = self.pos;
            while !matches!(self.peek(), None | Some(Token::Comma | Token::RBracket)) {
                self.advance();
            }
            let item = match &self.tokens[start..self.pos] {
                [] => {
                    return Err(self.err(format!("expected list element, got {}", self.found())))
                }
                [Spanned {
                    token: Token::Str(s),
                    ..
                }] => s.clone(),
                _ => self.raw(start, self.pos).to_string(),
            };
            items.push(item);
            match self.peek() {
                Some(Token::Comma) => {
                    self.advance();
                }
                Some(Token::RBracket) => {
                    self.advance();
                    break;
                }
                _ => return Err(self.err(format!("expected ',' or ']', got {}", self.found()))),
            }
        }
        Ok(Operand::List(items))
    }
}
