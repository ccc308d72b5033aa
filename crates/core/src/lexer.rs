use std::fmt;

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Bare words and keywords (`SET`, `IF`, `OR`, `IN`, `EXP`, ...),
    /// distinguished in the parser
    Word(String),
    /// Quoted string literal (content without quotes, escapes resolved)
    Str(String),
    /// Numeric literal, kept as written so list elements echo exactly
    Number(String),
    /// `$.`-prefixed path, validated by the parser
    Path(String),
    // Comparison operators
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    /// Single `=`, only meaningful in `SET`
    Assign,
    // Arithmetic operators
    Plus,
    Minus,
    Star,
    Slash,
    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => write!(f, "'{}'", w),
            Token::Str(s) => write!(f, "string '{}'", s),
            Token::Number(n) => write!(f, "number {}", n),
            Token::Path(p) => write!(f, "path {}", p),
            Token::Eq => f.write_str("'=='"),
            Token::Neq => f.write_str("'!='"),
            Token::Lt => f.write_str("'<'"),
            Token::Lte => f.write_str("'<='"),
            Token::Gt => f.write_str("'>'"),
            Token::Gte => f.write_str("'>='"),
            Token::Assign => f.write_str("'='"),
            Token::Plus => f.write_str("'+'"),
            Token::Minus => f.write_str("'-'"),
            Token::Star => f.write_str("'*'"),
            Token::Slash => f.write_str("'/'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::LBracket => f.write_str("'['"),
            Token::RBracket => f.write_str("']'"),
            Token::Comma => f.write_str("','"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    /// Byte offset of the token's first character in the rule text.
    pub offset: usize,
    /// Byte offset just past the token's last character.
    pub end: usize,
}

/// A `-` directly before a digit is a sign (not subtraction) when the
/// previous token cannot end an operand.
fn sign_allowed(prev: Option<&Token>) -> bool {
    !matches!(
        prev,
        Some(
            Token::Word(_)
                | Token::Str(_)
                | Token::Number(_)
                | Token::Path(_)
                | Token::RParen
                | Token::RBracket
        )
    )
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '=' | '!' | '<' | '>' | '(' | ')' | ',')
}

/// Arithmetic operators only exist inside parentheses; outside them
/// `-`, `+`, `*` and `/` are ordinary word characters.
fn is_word_char(c: char, depth: usize) -> bool {
    !is_delimiter(c)
        && !matches!(c, '[' | ']')
        && !(depth > 0 && matches!(c, '+' | '-' | '*' | '/'))
}

fn is_path_char(c: char, next: Option<char>, depth: usize) -> bool {
    if is_delimiter(c) {
        return false;
    }
    match c {
        '+' | '*' | '/' => depth == 0,
        // Inside EXP `$.a-1` subtracts while `$.cep-origem` is still a key.
        '-' => depth == 0 || next.is_some_and(|n| n.is_alphabetic() || n == '_'),
        _ => true,
    }
}

/// End of the float starting at `pos`: digits, an optional fraction and an
/// optional exponent.
fn scan_number(chars: &[(usize, char)], mut pos: usize) -> usize {
    let digit_at = |i: usize| chars.get(i).is_some_and(|(_, c)| c.is_ascii_digit());
    if chars[pos].1 == '-' {
        pos += 1;
    }
    while digit_at(pos) {
        pos += 1;
    }
    if chars.get(pos).is_some_and(|(_, c)| *c == '.') && digit_at(pos + 1) {
        pos += 1;
        while digit_at(pos) {
            pos += 1;
        }
    }
    if chars.get(pos).is_some_and(|(_, c)| matches!(c, 'e' | 'E')) {
        let sign = chars.get(pos + 1).is_some_and(|(_, c)| matches!(c, '+' | '-'));
        let first = if sign { pos + 2 } else { pos + 1 };
        if digit_at(first) {
            pos = first;
            while digit_at(pos) {
                pos += 1;
            }
        }
    }
    pos
}

pub fn lex(src: &str) -> Result<Vec<Spanned>, ParseError> {
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let mut tokens: Vec<Spanned> = Vec::new();
    let mut pos = 0usize;
    let mut depth = 0usize;

    let offset_at = |i: usize| chars.get(i).map(|(o, _)| *o).unwrap_or(src.len());
    let text = |from: usize, to: usize| -> String { chars[from..to].iter().map(|(_, c)| c).collect() };

    while pos < chars.len() {
        let (offset, c) = chars[pos];
        let next = chars.get(pos + 1).map(|(_, c)| *c);

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        // String literal, either quote style. A quote inside a word
        // (`O'Brien`) is part of the word.
        if c == '"' || c == '\'' {
            let quote = c;
            pos += 1;
            let mut s = String::new();
            loop {
                let Some(&(_, sc)) = chars.get(pos) else {
                    return Err(ParseError::new(offset, "unterminated string literal"));
                };
                if sc == quote {
                    pos += 1;
                    break;
                }
                if sc == '\\' {
                    pos += 1;
                    let Some(&(_, esc)) = chars.get(pos) else {
                        return Err(ParseError::new(offset, "unterminated escape in string"));
                    };
                    match esc {
                        '"' => s.push('"'),
                        '\'' => s.push('\''),
                        '\\' => s.push('\\'),
                        'n' => s.push('\n'),
                        't' => s.push('\t'),
                        other => {
                            s.push('\\');
                            s.push(other);
                        }
                    }
                    pos += 1;
                    continue;
                }
                s.push(sc);
                pos += 1;
            }
            tokens.push(Spanned {
                token: Token::Str(s),
                offset,
                end: offset_at(pos),
            });
            continue;
        }

        // Path
        if c == '$' && next == Some('.') {
            let start = pos;
            pos += 2;
            while pos < chars.len() {
                let ahead = chars.get(pos + 1).map(|(_, c)| *c);
                if !is_path_char(chars[pos].1, ahead, depth) {
                    break;
                }
                pos += 1;
            }
            tokens.push(Spanned {
                token: Token::Path(text(start, pos)),
                offset,
                end: offset_at(pos),
            });
            continue;
        }

        // Number, unless it runs straight into more word text (`2024-01-01`)
        let signed = c == '-'
            && next.is_some_and(|n| n.is_ascii_digit())
            && sign_allowed(tokens.last().map(|t| &t.token));
        if c.is_ascii_digit() || signed {
            let end = scan_number(&chars, pos);
            if !chars.get(end).is_some_and(|(_, n)| is_word_char(*n, depth)) {
                tokens.push(Spanned {
                    token: Token::Number(text(pos, end)),
                    offset,
                    end: offset_at(end),
                });
                pos = end;
                continue;
            }
        }

        // Operators
        let (token, width) = match (c, next) {
            ('=', Some('=')) => (Token::Eq, 2),
            ('=', _) => (Token::Assign, 1),
            ('!', Some('=')) => (Token::Neq, 2),
            ('<', Some('=')) => (Token::Lte, 2),
            ('<', _) => (Token::Lt, 1),
            ('>', Some('=')) => (Token::Gte, 2),
            ('>', _) => (Token::Gt, 1),
            ('+', _) if depth > 0 => (Token::Plus, 1),
            ('-', _) if depth > 0 => (Token::Minus, 1),
            ('*', _) if depth > 0 => (Token::Star, 1),
            ('/', _) if depth > 0 => (Token::Slash, 1),
            ('(', _) => {
                depth += 1;
                (Token::LParen, 1)
            }
            (')', _) => {
                depth = depth.saturating_sub(1);
                (Token::RParen, 1)
            }
            ('[', _) => (Token::LBracket, 1),
            (']', _) => (Token::RBracket, 1),
            (',', _) => (Token::Comma, 1),
            _ if is_word_char(c, depth) => {
                let start = pos;
                while pos < chars.len() && is_word_char(chars[pos].1, depth) {
                    pos += 1;
                }
                tokens.push(Spanned {
                    token: Token::Word(text(start, pos)),
                    offset,
                    end: offset_at(pos),
                });
                continue;
            }
            _ => {
                return Err(ParseError::new(
                    offset_at(pos),
                    format!("unexpected character '{}'", c),
                ))
            }
        };
        pos += width;
        tokens.push(Spanned {
            token,
            offset,
            end: offset_at(pos),
        });
    }

    Ok(tokens)
}
