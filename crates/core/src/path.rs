//! `$.`-prefixed document paths.
//!
//! A path is `$.` followed by dot-separated key segments, each of which may
//! carry one or more `[index]` suffixes: `$.cliente.tipo`,
//! `$.transacoes[0].valor`, `$.matriz[1][0]`.
//!
//! [`get`] treats a missing key at the final segment as absent rather than
//! an error; every other missing or mismatched step is a [`PathError`].
//! [`set`] creates the intermediate containers it needs but never replaces
//! an existing scalar.

use std::fmt;
use std::str::FromStr;

use crate::error::PathError;
use crate::value::{Map, Value};

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// A parsed document path. Always has at least one segment, the first of
/// which is a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub fn parse(text: &str) -> Result<Path, PathError> {
        let body = text.strip_prefix("$.").ok_or_else(|| PathError::MissingRoot {
            path: text.to_string(),
        })?;
        let mut segments = Vec::new();
        for piece in body.split('.') {
            parse_piece(piece, text, &mut segments)?;
        }
        Ok(Path { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Render the first `len` segments (`$` for zero).
    pub fn prefix(&self, len: usize) -> String {
        let mut out = String::from("$");
        for seg in &self.segments[..len.min(self.segments.len())] {
            match seg {
                Segment::Key(k) => {
                    out.push('.');
                    out.push_str(k);
                }
                Segment::Index(i) => {
                    out.push('[');
                    out.push_str(&i.to_string());
                    out.push(']');
                }
            }
        }
        out
    }
}

fn parse_piece(piece: &str, full: &str, out: &mut Vec<Segment>) -> Result<(), PathError> {
    if piece.is_empty() {
        return Err(PathError::EmptySegment {
            path: full.to_string(),
        });
    }
    let malformed = || PathError::MalformedBracket {
        path: full.to_string(),
        segment: piece.to_string(),
    };

    let (name, mut rest) = match piece.find('[') {
        Some(i) => (&piece[..i], &piece[i..]),
        None => (piece, ""),
    };
    if name.is_empty() || name.contains(']') {
        return Err(malformed());
    }
    out.push(Segment::Key(name.to_string()));

    while !rest.is_empty() {
        if !rest.starts_with('[') {
            return Err(malformed());
        }
        let end = rest.find(']').ok_or_else(malformed)?;
        let index_text = &rest[1..end];
        if index_text.contains('[') {
            return Err(malformed());
        }
        let index = index_text
            .parse::<usize>()
            .map_err(|_| PathError::InvalidIndex {
                path: full.to_string(),
                index: index_text.to_string(),
            })?;
        out.push(Segment::Index(index));
        rest = &rest[end + 1..];
    }
    Ok(())
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix(self.segments.len()))
    }
}

// ──────────────────────────────────────────────
// Reading
// ──────────────────────────────────────────────

/// Resolve `path` inside `doc`.
///
/// `Ok(None)` means the final key is absent from an otherwise valid path.
pub fn get<'a>(doc: &'a Value, path: &Path) -> Result<Option<&'a Value>, PathError> {
    let last = path.segments.len() - 1;
    let mut current = doc;
    for (i, seg) in path.segments.iter().enumerate() {
        match seg {
            Segment::Key(key) => {
                let map = match current {
                    Value::Object(map) => map,
                    _ => {
                        return Err(PathError::NotAnObject {
                            path: path.prefix(i),
                        })
                    }
                };
                match map.get(key) {
                    Some(v) => current = v,
                    None if i == last => return Ok(None),
                    None => {
                        return Err(PathError::MissingKey {
                            path: path.prefix(i + 1),
                        })
                    }
                }
            }
            Segment::Index(index) => {
                let items = match current {
                    Value::Array(items) => items,
                    _ => {
                        return Err(PathError::NotAnArray {
                            path: path.prefix(i),
                        })
                    }
                };
                current = items
                    .get(*index)
                    .ok_or_else(|| PathError::IndexOutOfBounds {
                        path: path.prefix(i),
                        index: *index,
                        len: items.len(),
                    })?;
            }
        }
    }
    Ok(Some(current))
}

/// Resolve operand text that may be either a path or a literal.
///
/// Text starting with `$.` is looked up (absent resolves to null); anything
/// else is parsed with [`Value::parse_literal`].
pub fn resolve(doc: &Value, text: &str) -> Result<Value, PathError> {
    if text.starts_with("$.") {
        let path = Path::parse(text)?;
        Ok(get(doc, &path)?.cloned().unwrap_or(Value::Null))
    } else {
        Ok(Value::parse_literal(text))
    }
}

// ──────────────────────────────────────────────
// Writing
// ──────────────────────────────────────────────

/// Assign `value` at `path`, creating intermediate containers as needed.
pub fn set(doc: &mut Value, path: &Path, value: Value) -> Result<(), PathError> {
    let last = path.segments.len() - 1;
    let mut current = doc;
    for i in 0..last {
        let next_is_index = matches!(path.segments[i + 1], Segment::Index(_));
        current = descend(current, path, i, next_is_index)?;
    }
    match &path.segments[last] {
        Segment::Key(key) => {
            container_object(current, path, last)?.insert(key.clone(), value);
        }
        Segment::Index(index) => {
            let items = container_array(current, path, last)?;
            pad(items, *index);
            items[*index] = value;
        }
    }
    Ok(())
}

fn descend<'a>(
    current: &'a mut Value,
    path: &Path,
    i: usize,
    next_is_index: bool,
) -> Result<&'a mut Value, PathError> {
    let fresh = || {
        if next_is_index {
            Value::Array(Vec::new())
        } else {
            Value::object()
        }
    };
    match &path.segments[i] {
        Segment::Key(key) => {
            let map = container_object(current, path, i)?;
            Ok(map.entry(key.clone()).or_insert_with(fresh))
        }
        Segment::Index(index) => {
            let items = container_array(current, path, i)?;
            let created = *index >= items.len();
            pad(items, *index);
            if created && next_is_index {
                items[*index] = fresh();
            }
            Ok(&mut items[*index])
        }
    }
}

fn container_object<'a>(
    current: &'a mut Value,
    path: &Path,
    i: usize,
) -> Result<&'a mut Map, PathError> {
    match current {
        Value::Object(map) => Ok(map),
        Value::Array(_) => Err(PathError::NotAnObject {
            path: path.prefix(i),
        }),
        _ => Err(PathError::ScalarCollision {
            path: path.prefix(i),
        }),
    }
}

fn container_array<'a>(
    current: &'a mut Value,
    path: &Path,
    i: usize,
) -> Result<&'a mut Vec<Value>, PathError> {
    match current {
        Value::Array(items) => Ok(items),
        Value::Object(_) => Err(PathError::NotAnArray {
            path: path.prefix(i),
        }),
        _ => Err(PathError::ScalarCollision {
            path: path.prefix(i),
        }),
    }
}

/// Grow `items` to hold `index`, filling new slots with empty mappings.
fn pad(items: &mut Vec<Value>, index: usize) {
    while items.len() <= index {
        items.push(Value::object());
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
