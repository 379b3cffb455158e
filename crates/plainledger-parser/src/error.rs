//! Parse error types.

use crate::date::DateError;
use crate::Span;
use std::fmt;

/// A line-scoped parse error carrying the offending text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// The line where the error occurred.
    pub span: Span,
    /// The offending source line.
    pub text: String,
}

impl ParseError {
    /// Create a new parse error.
    #[must_use]
    pub fn new(kind: ParseErrorKind, line: usize, text: impl Into<String>) -> Self {
        Self {
            kind,
            span: Span::line(line),
            text: text.into(),
        }
    }

    /// The 1-based line number.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.span.first
    }

    /// Get a short label for the error.
    #[must_use]
    pub const fn label(&self) -> &str {
        match &self.kind {
            ParseErrorKind::InvalidDate(_) => "invalid date",
            ParseErrorKind::InvalidNumber(_) => "invalid number",
            ParseErrorKind::InvalidAmount(_) => "invalid amount",
            ParseErrorKind::MissingAccount => "expected account name",
            ParseErrorKind::MissingField(_) => "missing field",
            ParseErrorKind::UnexpectedIndent => "unexpected indentation",
            ParseErrorKind::UnknownDirective(_) => "unknown directive",
            ParseErrorKind::UnknownSubDirective(_) => "unknown sub-directive",
            ParseErrorKind::UnterminatedBlock(_) => "unterminated block",
            ParseErrorKind::Syntax(_) => "syntax error",
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {:?}", self.span, self.kind, self.text)
    }
}

impl std::error::Error for ParseError {}

/// Kinds of parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A date did not parse or does not exist.
    InvalidDate(DateError),
    /// A number literal did not parse.
    InvalidNumber(String),
    /// An amount or price annotation is malformed.
    InvalidAmount(String),
    /// A posting line without an account.
    MissingAccount,
    /// A directive is missing a required argument.
    MissingField(String),
    /// An indented line outside of any transaction or directive block.
    UnexpectedIndent,
    /// Unrecognised top-level keyword.
    UnknownDirective(String),
    /// Unrecognised line inside an `account`, `commodity` or `payee` block.
    UnknownSubDirective(String),
    /// A `test` or `comment` block never closed.
    UnterminatedBlock(String),
    /// Anything else.
    Syntax(String),
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDate(e) => write!(f, "invalid date: {e}"),
            Self::InvalidNumber(s) => write!(f, "invalid number '{s}'"),
            Self::InvalidAmount(s) => write!(f, "invalid amount: {s}"),
            Self::MissingAccount => write!(f, "expected account name"),
            Self::MissingField(field) => write!(f, "missing required field: {field}"),
            Self::UnexpectedIndent => write!(f, "indented line outside of a block"),
            Self::UnknownDirective(s) => write!(f, "unknown directive '{s}'"),
            Self::UnknownSubDirective(s) => write!(f, "unknown sub-directive '{s}'"),
            Self::UnterminatedBlock(s) => write!(f, "'{s}' block is never closed"),
            Self::Syntax(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl From<DateError> for ParseErrorKind {
    fn from(err: DateError) -> Self {
        Self::InvalidDate(err)
    }
}
