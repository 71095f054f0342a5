use alloc::string::{String, ToString};
use alloc::vec::Vec;

use thiserror::Error;

use crate::path::{Literal, Segment, SegmentKind};

// -----------------------------------------------------------------------------
// Error

/// Why a path could not be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseErrorKind {
    #[error("empty segment")]
    EmptySegment,

    #[error("`{0}` is never closed")]
    Unclosed(char),

    #[error("unexpected `{0}`")]
    Unexpected(char),

    #[error("string literal is never closed")]
    UnclosedString,

    #[error("invalid literal `{0}`")]
    InvalidLiteral(String),

    #[error("invalid name `{0}`")]
    InvalidName(String),

    #[error("provider segment has no id")]
    MissingProviderId,
}

/// A path parsing error, with the byte offset it was found at.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid path at offset {offset}: {kind}")]
pub struct ParseError {
    pub offset: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    #[inline]
    fn new(offset: usize, kind: ParseErrorKind) -> Self {
        Self { offset, kind }
    }
}

// -----------------------------------------------------------------------------
// Parsing

pub(crate) const ARRAY_MARKER: char = '#';
pub(crate) const PROVIDER_MARKER: char = '@';

/// Splits `path` into classified segments.
///
/// An empty (or blank) path yields a single [`SegmentKind::This`].
pub(crate) fn parse(path: &str) -> Result<Vec<Segment>, ParseError> {
    if path.trim().is_empty() {
        return Ok(alloc::vec![Segment::new(SegmentKind::This, 0)]);
    }

    let mut segments = Vec::new();
    for (offset, piece) in split_top_level(path)? {
        parse_piece(piece, offset, &mut segments)?;
    }
    Ok(segments)
}

/// Splits on `.` and `/` outside of groups and string literals.
fn split_top_level(path: &str) -> Result<Vec<(usize, &str)>, ParseError> {
    let mut pieces = Vec::new();
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut quote: Option<(char, usize)> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in path.char_indices() {
        if let Some((q, _)) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' if !stack.is_empty() => quote = Some((c, i)),
            '[' | '(' => stack.push((c, i)),
            ']' | ')' => {
                let open = if c == ']' { '[' } else { '(' };
                match stack.pop() {
                    Some((o, _)) if o == open => {}
                    _ => return Err(ParseError::new(i, ParseErrorKind::Unexpected(c))),
                }
            }
            '.' | '/' if stack.is_empty() => {
                pieces.push((start, &path[start..i]));
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }

    if let Some((_, at)) = quote {
        return Err(ParseError::new(at, ParseErrorKind::UnclosedString));
    }
    if let Some((open, at)) = stack.pop() {
        return Err(ParseError::new(at, ParseErrorKind::Unclosed(open)));
    }
    pieces.push((start, &path[start..]));
    Ok(pieces)
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn parse_piece(piece: &str, base: usize, out: &mut Vec<Segment>) -> Result<(), ParseError> {
    let leading = piece.len() - piece.trim_start().len();
    let piece = piece.trim();
    let base = base + leading;
    if piece.is_empty() {
        return Err(ParseError::new(base, ParseErrorKind::EmptySegment));
    }

    let head_end = piece.find(['(', '[', '?']).unwrap_or(piece.len());
    let head = piece[..head_end].trim_end();
    let mut rest = &piece[head_end..];

    if !head.chars().all(is_name_char) {
        return Err(ParseError::new(base, ParseErrorKind::InvalidName(head.to_string())));
    }

    if rest.starts_with('(') {
        if head.is_empty() {
            return Err(ParseError::new(base, ParseErrorKind::Unexpected('(')));
        }
        // Groups are balanced here, and methods take type names only.
        let close = rest.find(')').unwrap_or(rest.len() - 1);
        let hints = split_hints(&rest[1..close]);
        out.push(Segment::new(
            SegmentKind::Method {
                name: head.to_string(),
                hints,
            },
            base,
        ));
        rest = &rest[close + 1..];
    } else if head == "this" {
        out.push(Segment::new(SegmentKind::This, base));
    } else if !head.is_empty() {
        out.push(Segment::new(SegmentKind::Member(head.to_string()), base));
    }

    loop {
        let trimmed = rest.trim_start();
        let at = base + (piece.len() - trimmed.len());
        let Some(c) = trimmed.chars().next() else {
            return Ok(());
        };
        match c {
            '?' => {
                out.push(Segment::new(SegmentKind::Unwrap, at));
                rest = &trimmed[1..];
            }
            '[' => {
                let close = group_end(trimmed)
                    .ok_or(ParseError::new(at, ParseErrorKind::Unclosed('[')))?;
                out.push(parse_group(&trimmed[1..close], at)?);
                rest = &trimmed[close + 1..];
            }
            _ => return Err(ParseError::new(at, ParseErrorKind::Unexpected(c))),
        }
    }
}

/// Returns the byte index of the `]` closing the group `text` starts with.
fn group_end(text: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut depth = 0_usize;
    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_group(body: &str, at: usize) -> Result<Segment, ParseError> {
    let trimmed = body.trim_start();
    let inner_at = at + 1 + (body.len() - trimmed.len());

    if let Some(args) = trimmed.strip_prefix(ARRAY_MARKER) {
        let args = parse_literals(args, inner_at + 1)?;
        return Ok(Segment::new(SegmentKind::Array(args), at));
    }

    if let Some(spec) = trimmed.strip_prefix(PROVIDER_MARKER) {
        let (id, path_id) = spec.split_once(':').unwrap_or((spec, ""));
        let id = id.trim();
        if id.is_empty() {
            return Err(ParseError::new(inner_at, ParseErrorKind::MissingProviderId));
        }
        return Ok(Segment::new(
            SegmentKind::Provider {
                id: id.to_string(),
                path_id: path_id.trim().to_string(),
            },
            at,
        ));
    }

    let args = parse_literals(body, at + 1)?;
    Ok(Segment::new(SegmentKind::Indexer(args), at))
}

/// Splits method type hints on commas outside of `<...>` and `[...]`.
fn split_hints(text: &str) -> Vec<String> {
    let mut hints = Vec::new();
    let mut depth = 0_usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '<' | '[' | '(' => depth += 1,
            '>' | ']' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                hints.push(text[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = text[start..].trim();
    if !last.is_empty() || !hints.is_empty() {
        hints.push(last.to_string());
    }
    hints
}

fn parse_literals(text: &str, at: usize) -> Result<Vec<Literal>, ParseError> {
    let mut literals = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            ',' => {
                literals.push(parse_literal(&text[start..i], at + start)?);
                start = i + 1;
            }
            _ => {}
        }
    }
    literals.push(parse_literal(&text[start..], at + start)?);
    Ok(literals)
}

fn parse_literal(raw: &str, at: usize) -> Result<Literal, ParseError> {
    let text = raw.trim();
    let at = at + (raw.len() - raw.trim_start().len());
    let invalid = || ParseError::new(at, ParseErrorKind::InvalidLiteral(text.to_string()));

    if text.is_empty() {
        return Err(invalid());
    }
    if let Some(slot) = text.strip_prefix('$') {
        return slot.parse().map(Literal::Slot).map_err(|_| invalid());
    }
    if let Some(q @ ('"' | '\'')) = text.chars().next() {
        return unquote(text, q).map(Literal::Str).ok_or_else(invalid);
    }
    match text {
        "true" => return Ok(Literal::Bool(true)),
        "false" => return Ok(Literal::Bool(false)),
        _ => {}
    }
    if let Ok(v) = text.parse::<i64>() {
        return Ok(Literal::Int(v));
    }
    if text.contains(['.', 'e', 'E'])
        && text.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+')
        && let Ok(v) = text.parse::<f64>()
    {
        return Ok(Literal::Float(v));
    }
    if text.chars().all(is_name_char) {
        return Ok(Literal::Str(text.to_string()));
    }
    Err(invalid())
}

fn unquote(text: &str, q: char) -> Option<String> {
    let inner = text.strip_prefix(q)?.strip_suffix(q)?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next()?),
            c if c == q => return None,
            c => out.push(c),
        }
    }
    Some(out)
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;

    use super::{ParseError, ParseErrorKind, parse};
    use crate::path::{Literal, SegmentKind};

    fn kinds(path: &str) -> alloc::vec::Vec<SegmentKind> {
        parse(path).unwrap().into_iter().map(|s| s.kind).collect()
    }

    fn member(name: &str) -> SegmentKind {
        SegmentKind::Member(String::from(name))
    }

    #[test]
    fn self_reference() {
        assert_eq!(kinds(""), vec![SegmentKind::This]);
        assert_eq!(kinds("  "), vec![SegmentKind::This]);
        assert_eq!(kinds("this"), vec![SegmentKind::This]);
    }

    #[test]
    fn members_and_separators() {
        let expected = vec![member("a"), member("b"), member("c")];
        assert_eq!(kinds("a.b.c"), expected);
        assert_eq!(kinds("a/b/c"), expected);
        assert_eq!(kinds(" a . b/ c "), expected);
    }

    #[test]
    fn brackets_and_unwrap() {
        assert_eq!(
            kinds("items[2].name?"),
            vec![
                member("items"),
                SegmentKind::Indexer(vec![Literal::Int(2)]),
                member("name"),
                SegmentKind::Unwrap,
            ]
        );
        assert_eq!(
            kinds("grid[#1, 2][0]"),
            vec![
                member("grid"),
                SegmentKind::Array(vec![Literal::Int(1), Literal::Int(2)]),
                SegmentKind::Indexer(vec![Literal::Int(0)]),
            ]
        );
        assert_eq!(
            kinds("[\"a.b\", 'c]', $1, -0.5, true, key]"),
            vec![SegmentKind::Indexer(vec![
                Literal::Str(String::from("a.b")),
                Literal::Str(String::from("c]")),
                Literal::Slot(1),
                Literal::Float(-0.5),
                Literal::Bool(true),
                Literal::Str(String::from("key")),
            ])]
        );
        assert_eq!(kinds("?"), vec![SegmentKind::Unwrap]);
    }

    #[test]
    fn methods_and_providers() {
        assert_eq!(
            kinds("Scale().SetAt(i32, HashMap<String, f32>)"),
            vec![
                SegmentKind::Method {
                    name: String::from("Scale"),
                    hints: vec![],
                },
                SegmentKind::Method {
                    name: String::from("SetAt"),
                    hints: vec![String::from("i32"), String::from("HashMap<String, f32>")],
                },
            ]
        );
        assert_eq!(
            kinds("mat[@material:_Color/r]"),
            vec![
                member("mat"),
                SegmentKind::Provider {
                    id: String::from("material"),
                    path_id: String::from("_Color/r"),
                },
            ]
        );
    }

    #[test]
    fn malformed_paths_report_offsets() {
        assert_eq!(
            parse("a[1"),
            Err(ParseError {
                offset: 1,
                kind: ParseErrorKind::Unclosed('['),
            })
        );
        assert_eq!(
            parse("a]"),
            Err(ParseError {
                offset: 1,
                kind: ParseErrorKind::Unexpected(']'),
            })
        );
        assert_eq!(
            parse("a..b"),
            Err(ParseError {
                offset: 2,
                kind: ParseErrorKind::EmptySegment,
            })
        );
        assert_eq!(parse("a[1,]").unwrap_err().offset, 4);
        assert_eq!(parse("a[@]").unwrap_err().kind, ParseErrorKind::MissingProviderId);
        assert_eq!(parse("a b").unwrap_err().offset, 0);
    }
}
