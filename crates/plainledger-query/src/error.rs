//! Filter expression error types.

use thiserror::Error;

/// Error returned when a filter expression cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// A token is not a valid regular expression.
    #[error("invalid pattern {pattern:?}: {message}")]
    InvalidPattern {
        /// The offending token.
        pattern: String,
        /// Message from the regex compiler.
        message: String,
    },
    /// The expression text does not follow the grammar.
    #[error("syntax error at position {position}: {message}")]
    Syntax {
        /// Byte offset into the preprocessed expression.
        position: usize,
        /// Description of what went wrong.
        message: String,
    },
}

impl FilterError {
    /// Create a syntax error.
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }
}
