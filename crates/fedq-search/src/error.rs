//! Error types for the fedq-search crate.

use fedq_query::ValueError;
use thiserror::Error;

/// Errors that can occur when planning or executing a search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A compound searcher was configured without any backends.
    #[error("no searcher specs configured")]
    NoSearcherSpecs,

    /// A query needs the default backend but none is marked default.
    #[error("no default searcher spec configured to handle {0}")]
    NoDefaultSpec(String),

    /// More than one backend is marked default.
    #[error("{0} searcher specs are marked default, expected at most one")]
    MultipleDefaultSpecs(usize),

    /// The planner met a query shape it cannot place.
    #[error("unsupported query type: {0}")]
    UnsupportedQueryType(String),

    /// No single backend can sort by every requested field.
    #[error("no searcher spec can sort by all of: {}", .0.join(", "))]
    NoMatchingSortSpec(Vec<String>),

    /// The executor reached a node with nothing to execute.
    #[error("empty execution tree node")]
    EmptyExecutionTree,

    /// A backend does not know a field label.
    #[error("unknown field '{field}' for {category}")]
    UnknownField {
        /// The field label.
        field: String,
        /// Entity category of the backend.
        category: String,
    },

    /// A field value could not be interpreted.
    #[error("invalid value for field '{field}': {message}")]
    InvalidValue {
        /// The field label.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// A backend call failed.
    #[error("backend {backend} failed: {message}")]
    Backend {
        /// Backend name.
        backend: String,
        /// Error message.
        message: String,
    },

    /// The request was cancelled.
    #[error("search cancelled")]
    Cancelled,

    /// The request ran past its deadline.
    #[error("search deadline exceeded")]
    DeadlineExceeded,
}

impl SearchError {
    /// Creates an `InvalidValue` error from a value modifier error.
    pub(crate) fn invalid_value(field: &str, source: &ValueError) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: source.to_string(),
        }
    }

    /// True for errors caused by how the engine was set up rather than by a
    /// particular request. These never go away on retry.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::NoSearcherSpecs | Self::NoDefaultSpec(_) | Self::MultipleDefaultSpecs(_)
        )
    }
}

/// Errors building a field registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two fields share a label (compared case-insensitively).
    #[error("duplicate field label '{label}' in {category}")]
    DuplicateLabel {
        /// Entity category.
        category: String,
        /// The duplicated label.
        label: String,
    },

    /// A field has an empty label or path.
    #[error("field in {category} has an empty label or path")]
    EmptyField {
        /// Entity category.
        category: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_classified() {
        assert!(SearchError::NoSearcherSpecs.is_configuration_error());
        assert!(SearchError::NoDefaultSpec("field 'x'".into()).is_configuration_error());
        assert!(!SearchError::Cancelled.is_configuration_error());
        assert!(!SearchError::NoMatchingSortSpec(vec!["a".into()]).is_configuration_error());
    }

    #[test]
    fn sort_error_lists_fields() {
        let err = SearchError::NoMatchingSortSpec(vec!["Name".into(), "CVSS".into()]);
        assert_eq!(
            err.to_string(),
            "no searcher spec can sort by all of: Name, CVSS"
        );
    }
}
