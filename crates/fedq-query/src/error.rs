//! Error types for query-string parsing.
//!
//! This module provides error types for lexing, parsing, and value validation.

use std::{error::Error, fmt};

use crate::value::ValueError;

/// Lexer error with position information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// Error message.
    pub message: String,
    /// Byte position in input where error occurred.
    pub position: usize,
    /// The original input string.
    pub input: String,
}

impl LexError {
    /// Creates a new lexer error.
    pub fn new(message: impl Into<String>, position: usize, input: &str) -> Self {
        Self {
            message: message.into(),
            position,
            input: input.to_string(),
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.message, self.position)
    }
}

impl Error for LexError {}

/// Parse error with token position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Error message.
    pub message: String,
    /// Token index where error occurred (if applicable).
    pub token_index: Option<usize>,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(message: impl Into<String>, token_index: Option<usize>) -> Self {
        Self {
            message: message.into(),
            token_index,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(idx) = self.token_index {
            write!(f, "at token {}: {}", idx, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl Error for ParseError {}

/// A unified error type for query-string parsing.
#[derive(Debug, Clone)]
pub struct QueryError {
    /// The kind of error that occurred.
    pub kind: QueryErrorKind,
    /// The original query string (if available).
    pub query: Option<String>,
}

/// The specific kind of query error.
#[derive(Debug, Clone)]
pub enum QueryErrorKind {
    /// Tokenization failed.
    Lex {
        /// Error message.
        message: String,
        /// Byte position in input.
        position: usize,
    },
    /// The token stream is not `field:value` pairs.
    Parse {
        /// Error message.
        message: String,
        /// Token index, if known.
        token_index: Option<usize>,
    },
    /// A value carries a malformed modifier.
    Value {
        /// Field the value was given for.
        field: String,
        /// Underlying value error.
        source: ValueError,
    },
    /// The query string is empty and empty queries are not allowed.
    Empty,
}

impl QueryError {
    /// Creates a parse error.
    pub fn parse(message: impl Into<String>, token_index: Option<usize>) -> Self {
        Self {
            kind: QueryErrorKind::Parse {
                message: message.into(),
                token_index,
            },
            query: None,
        }
    }

    /// Creates a value error for `field`.
    pub fn value(field: impl Into<String>, source: ValueError) -> Self {
        Self {
            kind: QueryErrorKind::Value {
                field: field.into(),
                source,
            },
            query: None,
        }
    }

    /// Creates an empty-query error.
    pub fn empty() -> Self {
        Self {
            kind: QueryErrorKind::Empty,
            query: None,
        }
    }

    /// Sets the query string for this error.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Returns the error message without context.
    pub fn message(&self) -> String {
        match &self.kind {
            QueryErrorKind::Lex { message, .. } | QueryErrorKind::Parse { message, .. } => {
                message.clone()
            }
            QueryErrorKind::Value { field, source } => format!("field '{field}': {source}"),
            QueryErrorKind::Empty => "empty query".to_string(),
        }
    }

    /// Returns a suggestion for common errors.
    pub fn suggestion(&self) -> Option<&'static str> {
        match &self.kind {
            QueryErrorKind::Lex { message, .. } if message.contains("unclosed quote") => {
                Some("Add a closing quote (\") to complete the value")
            }
            QueryErrorKind::Parse { message, .. } if message.contains("expected ':'") => {
                Some("Queries take the form field:value, e.g. 'Cluster:prod+Namespace:default'")
            }
            QueryErrorKind::Parse { message, .. } if message.contains("empty value") => {
                Some("Remove the extra ',' or quote a value that contains one")
            }
            QueryErrorKind::Value {
                source: ValueError::NotANumber { .. },
                ..
            } => Some("Comparators (<, <=, ==, >=, >) need a numeric operand"),
            QueryErrorKind::Empty => Some("Pass at least one field:value pair"),
            _ => None,
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "query syntax error: {}", self.message())?;

        if let Some(query) = &self.query {
            writeln!(f, "  {}", query)?;
            if let QueryErrorKind::Lex { position, .. } = &self.kind {
                let clamped = (*position).min(query.len());
                writeln!(f, "  {}^", " ".repeat(clamped))?;
            }
        }

        if let Some(suggestion) = self.suggestion() {
            write!(f, "hint: {}", suggestion)?;
        }

        Ok(())
    }
}

impl Error for QueryError {}

impl From<LexError> for QueryError {
    fn from(err: LexError) -> Self {
        Self {
            kind: QueryErrorKind::Lex {
                message: err.message,
                position: err.position,
            },
            query: Some(err.input),
        }
    }
}

impl From<ParseError> for QueryError {
    fn from(err: ParseError) -> Self {
        Self::parse(err.message, err.token_index)
    }
}
