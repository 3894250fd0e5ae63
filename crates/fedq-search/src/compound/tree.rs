//! Execution tree produced by the planner.

use std::fmt;

use fedq_query::Query;

/// Stable handle of a searcher spec within one request.
///
/// Registered specs keep their position in the compound searcher's list;
/// specs synthesized during planning are numbered after them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecId(pub(crate) usize);

impl SpecId {
    /// Position in the request's spec table.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SpecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spec#{}", self.0)
    }
}

/// A node of the execution tree.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestNode {
    /// Intersection of the children.
    And(Vec<Self>),
    /// Union of the children.
    Or(Vec<Self>),
    /// `must` minus `must_not`.
    Boolean {
        /// Rows to keep.
        must: Box<Self>,
        /// Rows to remove.
        must_not: Box<Self>,
    },
    /// Rows of `left`, reordered by the order `right` produced.
    LeftJoinWithRightOrder {
        /// Rows.
        left: Box<Self>,
        /// Ordering source; its predicate is vacuous.
        right: Box<Self>,
    },
    /// One backend call.
    Base {
        /// Backend answering the query.
        spec: SpecId,
        /// Query sent to the backend.
        query: Query,
    },
}

impl RequestNode {
    /// A leaf node.
    pub fn base(spec: SpecId, query: Query) -> Self {
        Self::Base { spec, query }
    }

    /// Number of backend calls the tree performs at most.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::And(children) | Self::Or(children) => children.iter().map(Self::leaf_count).sum(),
            Self::Boolean { must, must_not } => must.leaf_count() + must_not.leaf_count(),
            Self::LeftJoinWithRightOrder { left, right } => left.leaf_count() + right.leaf_count(),
            Self::Base { .. } => 1,
        }
    }

    /// Formats the node as an indented tree.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        match self {
            Self::And(children) => {
                writeln!(f, "{prefix}And")?;
                for child in children {
                    child.fmt_tree(f, indent + 1)?;
                }
                Ok(())
            }
            Self::Or(children) => {
                writeln!(f, "{prefix}Or")?;
                for child in children {
                    child.fmt_tree(f, indent + 1)?;
                }
                Ok(())
            }
            Self::Boolean { must, must_not } => {
                writeln!(f, "{prefix}Boolean")?;
                writeln!(f, "{prefix}  must:")?;
                must.fmt_tree(f, indent + 2)?;
                writeln!(f, "{prefix}  must_not:")?;
                must_not.fmt_tree(f, indent + 2)
            }
            Self::LeftJoinWithRightOrder { left, right } => {
                writeln!(f, "{prefix}LeftJoinWithRightOrder")?;
                writeln!(f, "{prefix}  rows:")?;
                left.fmt_tree(f, indent + 2)?;
                writeln!(f, "{prefix}  order:")?;
                right.fmt_tree(f, indent + 2)
            }
            Self::Base { spec, query } => {
                writeln!(f, "{prefix}Base({spec})")?;
                for line in query.to_string().lines() {
                    writeln!(f, "{prefix}  {line}")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for RequestNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}
