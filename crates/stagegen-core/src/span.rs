//! Source-origin tracking for synthesized nodes.
//!
//! Nodes built programmatically have no source text of their own, but callers
//! usually construct them on behalf of something that does (a line in a
//! template, a column in a query DSL). [`Span`] carries that position so
//! diagnostics can point back at it.

use std::fmt;

/// The origin a node was built for, represented by its starting position.
///
/// The default span (line 0) means "no known origin".
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Line number (1-indexed, 0 when unknown).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
}

impl Span {
    /// A span with no known origin.
    pub const NONE: Span = Span { line: 0, col: 0 };

    /// A span at a position.
    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Whether this span points at a real origin.
    #[inline]
    pub fn is_known(&self) -> bool {
        self.line != 0
    }

    /// Returns `self` when known, otherwise `other`.
    #[inline]
    pub fn or(self, other: Span) -> Span {
        if self.is_known() { self } else { other }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            write!(f, "{}:{}", self.line, self.col)
        } else {
            f.write_str("-")
        }
    }
}
