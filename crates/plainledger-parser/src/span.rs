//! Source location tracking.
//!
//! The journal grammar is line oriented, so locations are line ranges rather
//! than byte offsets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A range of source lines, 1-based and inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// First line.
    pub first: usize,
    /// Last line.
    pub last: usize,
}

impl Span {
    /// A span covering `first..=last`.
    #[must_use]
    pub const fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }

    /// A span covering a single line.
    #[must_use]
    pub const fn line(line: usize) -> Self {
        Self::new(line, line)
    }

    /// Number of lines covered.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.last + 1 - self.first
    }

    /// Always false; a span covers at least one line.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Extend this span to end at `line`.
    #[must_use]
    pub fn extend_to(self, line: usize) -> Self {
        Self::new(self.first, self.last.max(line))
    }

    /// The covered lines of `source`.
    #[must_use]
    pub fn lines<'a>(&self, source: &'a str) -> Vec<&'a str> {
        source
            .lines()
            .skip(self.first.saturating_sub(1))
            .take(self.len())
            .collect()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "line {}", self.first)
        } else {
            write!(f, "lines {}-{}", self.first, self.last)
        }
    }
}

/// A value with an associated source span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spanned<T> {
    /// The value.
    pub value: T,
    /// The source span.
    pub span: Span,
}

impl<T> Spanned<T> {
    /// Create a new spanned value.
    #[must_use]
    pub const fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }
}
