//! Binding paths: `"a.b[2].C()"` style strings and their parsed segments.
//!
//! | text | segment(s) |
//! |------|------------|
//! | empty, `this` | [`SegmentKind::This`] |
//! | `name` | [`SegmentKind::Member`] |
//! | `name?`, `?` | member + [`SegmentKind::Unwrap`] |
//! | `name(T1, T2)` | [`SegmentKind::Method`] |
//! | `name[a, b]`, `[a, b]` | member + [`SegmentKind::Indexer`] |
//! | `[#i, j]` | [`SegmentKind::Array`] |
//! | `[@id:path-id]` | [`SegmentKind::Provider`] |
//!
//! Segments are separated by `.` or `/`; whitespace around separators is
//! ignored. Bracket groups may follow each other, as in `grid[#1, 2][0]`.

// -----------------------------------------------------------------------------
// Modules

mod parser;
mod segment;
mod serde;

// -----------------------------------------------------------------------------
// Exports

pub use parser::{ParseError, ParseErrorKind};
pub use segment::{Literal, Segment, SegmentKind};

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::str::FromStr;

// -----------------------------------------------------------------------------
// BindingPath

/// A parsed path together with its normalized text.
///
/// Two paths that differ only in separators, whitespace, redundant `this`
/// segments or literal quoting normalize to the same text and compare equal.
///
/// # Examples
///
/// ```
/// use vc_bind::path::BindingPath;
///
/// let a = BindingPath::parse("items [ 2 ] / name").unwrap();
/// let b: BindingPath = "this.items[2].name".parse().unwrap();
///
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "items[2].name");
/// assert_eq!(a.segments().len(), 3);
/// ```
#[derive(Clone)]
pub struct BindingPath {
    text: String,
    segments: Vec<Segment>,
}

impl BindingPath {
    /// Parses `path`.
    pub fn parse(path: &str) -> Result<Self, ParseError> {
        let mut segments = parser::parse(path)?;
        if segments.len() > 1 {
            segments.retain(|s| s.kind != SegmentKind::This);
        }
        let text = normalize(&segments);
        Ok(Self { text, segments })
    }

    /// Returns the normalized text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the parsed segments.
    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns `true` if the path addresses the value itself.
    #[inline]
    pub fn is_this(&self) -> bool {
        matches!(self.segments.as_slice(), [s] if s.kind == SegmentKind::This)
    }
}

fn normalize(segments: &[Segment]) -> String {
    use core::fmt::Write;

    let mut text = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 && !segment.is_suffix() {
            text.push('.');
        }
        // Writing into a `String` cannot fail.
        let _ = write!(text, "{segment}");
    }
    text
}

impl PartialEq for BindingPath {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for BindingPath {}

impl Hash for BindingPath {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl FromStr for BindingPath {
    type Err = ParseError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for BindingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Debug for BindingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BindingPath({:?})", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::BindingPath;

    fn normalized(path: &str) -> alloc::string::String {
        BindingPath::parse(path).unwrap().as_str().into()
    }

    #[test]
    fn normalization_is_stable() {
        assert_eq!(normalized(""), "this");
        assert_eq!(normalized("this"), "this");
        assert_eq!(normalized("this / a"), "a");
        assert_eq!(normalized("a/b?.c"), "a.b?.c");
        assert_eq!(normalized("m['k', 1.50]"), "m[\"k\",1.5]");
        assert_eq!(normalized("grid[# 1,2 ][0]"), "grid[#1,2][0]");
        assert_eq!(normalized("Get( i32 , f32 )"), "Get(i32,f32)");
        assert_eq!(normalized("[@mat : _Color]"), "[@mat:_Color]");

        for path in ["a.b?.c", "m[\"k\",1.5]", "grid[#1,2][0]", "Get(i32,f32)"] {
            assert_eq!(normalized(&normalized(path)), path);
        }
    }

    #[test]
    fn this_only() {
        assert!(BindingPath::parse(" ").unwrap().is_this());
        assert!(!BindingPath::parse("a").unwrap().is_this());
    }
}
