use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::value::Value;

// -----------------------------------------------------------------------------
// Literal

/// A parameter written inside a bracket group.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `42`, `-1`
    Int(i64),
    /// `1.5`, `2e3`
    Float(f64),
    /// `true`, `false`
    Bool(bool),
    /// `"key"`, `'key'` or a bare word.
    Str(String),
    /// `$n`: a dynamic slot bound after resolution.
    Slot(usize),
}

impl Literal {
    /// Returns the literal as a value in its natural type, or `None` for slots.
    pub fn to_value(&self) -> Option<Box<dyn Value>> {
        Some(match self {
            Self::Int(v) => Box::new(*v),
            Self::Float(v) => Box::new(*v),
            Self::Bool(v) => Box::new(*v),
            Self::Str(v) => Box::new(v.clone()),
            Self::Slot(_) => return None,
        })
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Slot(n) => write!(f, "${n}"),
            Self::Str(v) => {
                f.write_str("\"")?;
                for c in v.chars() {
                    if matches!(c, '"' | '\\') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("\"")
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Segment

/// What a [`Segment`] addresses.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentKind {
    /// The value itself: an empty path or `this`.
    This,
    /// A field or property.
    Member(String),
    /// `?`: the value inside an optional.
    Unwrap,
    /// `name(T1, T2)`: a method, selected by name and parameter type names.
    Method { name: String, hints: Vec<String> },
    /// `[a, b]`: a declared indexer, or a list or dictionary element.
    Indexer(Vec<Literal>),
    /// `[#i, j]`: a raw array element.
    Array(Vec<Literal>),
    /// `[@id:path-id]`: a path handled by a registered provider.
    Provider { id: String, path_id: String },
}

/// One classified step of a path, with the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub offset: usize,
}

impl Segment {
    #[inline]
    pub(crate) fn new(kind: SegmentKind, offset: usize) -> Self {
        Self { kind, offset }
    }

    /// Returns `true` for segments that print without a leading separator.
    #[inline]
    pub(crate) fn is_suffix(&self) -> bool {
        matches!(
            self.kind,
            SegmentKind::Unwrap
                | SegmentKind::Indexer(_)
                | SegmentKind::Array(_)
                | SegmentKind::Provider { .. }
        )
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SegmentKind::This => f.write_str("this"),
            SegmentKind::Member(name) => f.write_str(name),
            SegmentKind::Unwrap => f.write_str("?"),
            SegmentKind::Method { name, hints } => {
                write!(f, "{name}(")?;
                write_list(f, hints)?;
                f.write_str(")")
            }
            SegmentKind::Indexer(args) => {
                f.write_str("[")?;
                write_list(f, args)?;
                f.write_str("]")
            }
            SegmentKind::Array(args) => {
                f.write_str("[#")?;
                write_list(f, args)?;
                f.write_str("]")
            }
            SegmentKind::Provider { id, path_id } => write!(f, "[@{id}:{path_id}]"),
        }
    }
}
