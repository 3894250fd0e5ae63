//! Structured queries for fedq.
//!
//! This crate defines the query tree that every fedq backend consumes:
//!
//! - **Conjunction / Disjunction**: AND and OR of sub-queries
//! - **Boolean**: a must-conjunction minus a must-not disjunction
//! - **Field match**: `Cluster:prod`, with value modifiers (`!`, `r/`, `"..."`, `>=`, `*`, `-`)
//! - **Linked fields**: several field matches within one repeated sub-object
//! - **Doc ids / match none**: identifier sets and the absorbing element
//!
//! It also parses the textual surface `field:value1,value2+field2:value3`.
//!
//! # Example
//!
//! ```
//! use fedq_query::{ParseOptions, fields, parse_query_string};
//!
//! let q = parse_query_string("Cluster:prod+Image:nginx,redis", &ParseOptions::default()).unwrap();
//! assert_eq!(fields(&q).len(), 3);
//! ```

#![warn(missing_docs)]

mod ast;
mod builder;
mod error;
mod helpers;
mod lexer;
mod parser;
mod value;

pub use ast::{BaseQuery, BooleanQuery, MatchFieldQuery, Pagination, Query, QueryKind, SortOption};
pub use builder::QueryBuilder;
pub use error::{LexError, ParseError, QueryError, QueryErrorKind};
pub use helpers::{conjunction_or_single, disjunction_or_single, fields, filter_fields};
pub use lexer::{Token, tokenize};
pub use parser::{ParseOptions, parse_query_string, to_query_string};
pub use value::{
    Comparator, MatchKind, MatchValue, NEGATION_PREFIX, NULL_VALUE, REGEX_PREFIX, ValueError,
    WILDCARD, exact, negate, parse_value, regex,
};
