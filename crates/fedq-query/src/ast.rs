//! Structured query abstract syntax tree.
//!
//! A [`Query`] is a nested tree of conjunctions, disjunctions, boolean
//! must/must-not pairs and base predicates. It carries no behavior of its own:
//! planners, backends and compilers interpret it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A structured query.
///
/// A query whose `kind` is `None` is the empty query. At the root it matches
/// everything; it is never a committed predicate inside a larger query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// The query body, or `None` for the empty query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<QueryKind>,
    /// Sorting and paging, only meaningful at the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// The body of a [`Query`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// All sub-queries must match.
    Conjunction(Vec<Query>),
    /// At least one sub-query must match.
    Disjunction(Vec<Query>),
    /// Must-match conjunction minus must-not disjunction.
    Boolean(BooleanQuery),
    /// A leaf predicate.
    Base(BaseQuery),
}

/// AND-NOT query: every `must` query matches and no `must_not` query matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BooleanQuery {
    /// Conjunction of required queries.
    pub must: Vec<Query>,
    /// Disjunction of excluded queries.
    pub must_not: Vec<Query>,
}

/// Leaf predicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseQuery {
    /// A single field predicate.
    MatchField(MatchFieldQuery),
    /// Several field predicates that must hold within the same repeated
    /// sub-object (for example the same array element).
    MatchLinkedFields(Vec<MatchFieldQuery>),
    /// Matches exactly the listed document identifiers.
    DocIds(Vec<String>),
    /// Matches nothing.
    MatchNone,
}

/// A predicate on one field label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchFieldQuery {
    /// Human field label, resolved through a field registry.
    pub field: String,
    /// Value, possibly carrying a modifier prefix (see [`crate::parse_value`]).
    pub value: String,
    /// Whether matched substrings should be reported back.
    #[serde(default)]
    pub highlight: bool,
}

impl MatchFieldQuery {
    /// Creates a non-highlighted field predicate.
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            highlight: false,
        }
    }

    /// Returns the same predicate with highlighting enabled.
    pub fn highlighted(mut self) -> Self {
        self.highlight = true;
        self
    }
}

/// Sort and page request attached to a root query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Sort keys in priority order.
    #[serde(default)]
    pub sort_options: Vec<SortOption>,
    /// Maximum number of results, `None` for unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Number of leading results to skip.
    #[serde(default)]
    pub offset: usize,
}

impl Pagination {
    /// Creates a pagination that only sorts.
    pub fn sorted_by(sort_options: Vec<SortOption>) -> Self {
        Self {
            sort_options,
            limit: None,
            offset: 0,
        }
    }

    /// Returns the same pagination with a limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns the same pagination with an offset.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Returns a copy carrying only the sort options.
    pub fn sort_only(&self) -> Self {
        Self::sorted_by(self.sort_options.clone())
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOption {
    /// Field label to sort on.
    pub field: String,
    /// Descending when true.
    #[serde(default)]
    pub reversed: bool,
}

impl SortOption {
    /// Ascending sort on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reversed: false,
        }
    }

    /// Descending sort on `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reversed: true,
        }
    }
}

impl Query {
    /// The empty query.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps a query body.
    pub fn from_kind(kind: QueryKind) -> Self {
        Self {
            kind: Some(kind),
            pagination: None,
        }
    }

    /// A conjunction of `queries`.
    pub fn conjunction(queries: Vec<Self>) -> Self {
        Self::from_kind(QueryKind::Conjunction(queries))
    }

    /// A disjunction of `queries`.
    pub fn disjunction(queries: Vec<Self>) -> Self {
        Self::from_kind(QueryKind::Disjunction(queries))
    }

    /// A boolean must / must-not query.
    pub fn boolean(must: Vec<Self>, must_not: Vec<Self>) -> Self {
        Self::from_kind(QueryKind::Boolean(BooleanQuery { must, must_not }))
    }

    /// A single field predicate.
    pub fn match_field(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::base(BaseQuery::MatchField(MatchFieldQuery::new(field, value)))
    }

    /// A linked-fields predicate.
    pub fn match_linked_fields(fields: Vec<MatchFieldQuery>) -> Self {
        Self::base(BaseQuery::MatchLinkedFields(fields))
    }

    /// A document identifier match.
    pub fn doc_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::base(BaseQuery::DocIds(ids.into_iter().map(Into::into).collect()))
    }

    /// The query that matches nothing.
    pub fn match_none() -> Self {
        Self::base(BaseQuery::MatchNone)
    }

    /// Wraps a base predicate.
    pub fn base(base: BaseQuery) -> Self {
        Self::from_kind(QueryKind::Base(base))
    }

    /// Returns the query with `pagination` attached.
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Returns the query with its pagination removed.
    pub fn without_pagination(mut self) -> Self {
        self.pagination = None;
        self
    }

    /// True for the empty query.
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
    }

    /// True when the query carries at least one sort option.
    pub fn is_sorted(&self) -> bool {
        self.pagination
            .as_ref()
            .is_some_and(|p| !p.sort_options.is_empty())
    }

    /// Formats the query as an indented tree.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        match &self.kind {
            None => writeln!(f, "{prefix}MatchAll")?,
            Some(QueryKind::Conjunction(queries)) => {
                writeln!(f, "{prefix}Conjunction")?;
                for q in queries {
                    q.fmt_tree(f, indent + 1)?;
                }
            }
            Some(QueryKind::Disjunction(queries)) => {
                writeln!(f, "{prefix}Disjunction")?;
                for q in queries {
                    q.fmt_tree(f, indent + 1)?;
                }
            }
            Some(QueryKind::Boolean(b)) => {
                writeln!(f, "{prefix}Boolean")?;
                writeln!(f, "{prefix}  Must")?;
                for q in &b.must {
                    q.fmt_tree(f, indent + 2)?;
                }
                writeln!(f, "{prefix}  MustNot")?;
                for q in &b.must_not {
                    q.fmt_tree(f, indent + 2)?;
                }
            }
            Some(QueryKind::Base(base)) => base.fmt_tree(f, &prefix)?,
        }
        if let Some(p) = &self.pagination {
            let keys: Vec<String> = p
                .sort_options
                .iter()
                .map(|s| {
                    if s.reversed {
                        format!("-{}", s.field)
                    } else {
                        s.field.clone()
                    }
                })
                .collect();
            writeln!(
                f,
                "{prefix}  Sort[{}] limit={:?} offset={}",
                keys.join(", "),
                p.limit,
                p.offset
            )?;
        }
        Ok(())
    }
}

impl BaseQuery {
    /// Formats a leaf line.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, prefix: &str) -> fmt::Result {
        match self {
            Self::MatchField(m) => writeln!(f, "{prefix}{}", format_field(m)),
            Self::MatchLinkedFields(fields) => {
                let parts: Vec<String> = fields.iter().map(format_field).collect();
                writeln!(f, "{prefix}Linked({})", parts.join(", "))
            }
            Self::DocIds(ids) => writeln!(f, "{prefix}DocIds{ids:?}"),
            Self::MatchNone => writeln!(f, "{prefix}MatchNone"),
        }
    }
}

/// Renders `field:value`, with a trailing marker for highlighted fields.
fn format_field(m: &MatchFieldQuery) -> String {
    if m.highlight {
        format!("{}:{:?} (highlight)", m.field, m.value)
    } else {
        format!("{}:{:?}", m.field, m.value)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}
