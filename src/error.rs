//! Error types for the bibstyle crate
//!
//! Everything in here is fatal: the run stops and no output is written.
//! Recoverable conditions go through [`crate::Diagnostics`] instead.

use thiserror::Error;

/// Result type for bibstyle operations
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for bibstyle
#[derive(Error, Debug)]
pub enum Error {
    /// Structural error inside an item, with the line the item starts on
    #[error("Parse error at line {line}: {message}")]
    ParseError {
        /// Line number (1-indexed) where the offending item starts
        line: usize,
        /// Error message
        message: String,
        /// Optional source snippet
        snippet: Option<String>,
    },

    /// Brace depth went negative or the input ended inside a group
    #[error("curly braces do not match at line {line}")]
    UnbalancedBraces {
        /// Line number (1-indexed) where the mismatch was detected
        line: usize,
    },

    /// Unknown value for a run option
    #[error("invalid value '{value}' for option '{option}'")]
    InvalidOption {
        /// Option name
        option: &'static str,
        /// Rejected value
        value: String,
    },

    /// Failure reported by an enrichment record source
    #[error("record source error: {0}")]
    Source(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed JSON record store
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite record store failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl Error {
    /// Build a [`Error::ParseError`] carrying a short excerpt of the offending text
    pub(crate) fn parse(line: usize, message: impl Into<String>, source: &str) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
            snippet: Some(snippet(source, 60)),
        }
    }
}

/// Get a snippet of input for error messages
fn snippet(input: &str, max_len: usize) -> String {
    let snippet: String = input.chars().take(max_len).collect();
    if input.chars().count() > max_len {
        format!("{snippet}...")
    } else {
        snippet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = Error::parse(7, "missing '=' in field 'title'", "title {Foo}");
        assert_eq!(
            err.to_string(),
            "Parse error at line 7: missing '=' in field 'title'"
        );
        match err {
            Error::ParseError { snippet, .. } => assert_eq!(snippet.as_deref(), Some("title {Foo}")),
            _ => panic!("Expected parse error"),
        }
    }

    #[test]
    fn test_snippet_truncates() {
        let long = "x".repeat(100);
        let s = snippet(&long, 10);
        assert_eq!(s, format!("{}...", "x".repeat(10)));
    }

    #[test]
    fn test_unbalanced_display() {
        let err = Error::UnbalancedBraces { line: 3 };
        assert_eq!(err.to_string(), "curly braces do not match at line 3");
    }
}
