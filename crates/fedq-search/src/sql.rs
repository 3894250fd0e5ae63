//! SQL compiler for relational backends.
//!
//! Translates a [`Query`] into a parameterized PostgreSQL `WHERE` clause.
//! Field labels resolve through an [`OptionsMap`] to `category.column`.
//!
//! ```sql
//! deployments.name ilike $1                      -- prefix (bound as 'value%')
//! deployments.name ilike $1                      -- exact
//! deployments.name ~* $1                         -- regex
//! deployments.replicas >= $1                     -- comparison
//! deployments.cluster is not null                -- wildcard
//! deployments.id = ANY($1::text[])               -- doc ids
//! (a and not (b))                                -- boolean
//! ```

use std::fmt;

use fedq_query::{BaseQuery, MatchFieldQuery, MatchKind, Pagination, Query, QueryKind, parse_value};
use serde::Serialize;

use crate::{
    error::SearchError,
    options::{DataType, FieldDescriptor, OptionsMap},
};

/// A SQL fragment with `$n` placeholders and their values, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlQuery {
    /// The SQL text.
    pub clause: String,
    /// Bind values for `$1`, `$2`, ...
    pub params: Vec<SqlParam>,
}

/// A bind value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    /// `text`
    Text(String),
    /// `numeric`
    Numeric(f64),
    /// `bool`
    Boolean(bool),
    /// `text[]`
    TextArray(Vec<String>),
}

impl fmt::Display for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::TextArray(items) => {
                let quoted: Vec<String> = items.iter().map(|s| s.replace('\'', "''")).collect();
                write!(f, "'{{{}}}'", quoted.join(","))
            }
        }
    }
}

/// Compiles `query` into a `WHERE` clause body for `table`.
///
/// Returns `None` when the query places no constraint.
pub fn compile_where(
    table: &str,
    query: &Query,
    options: &dyn OptionsMap,
) -> Result<Option<SqlQuery>, SearchError> {
    let mut compiler = Compiler {
        table,
        options,
        params: Vec::new(),
    };
    let clause = compiler.query(query)?;
    Ok(clause.map(|clause| SqlQuery {
        clause,
        params: compiler.params,
    }))
}

/// Renders `order by ... LIMIT ... OFFSET ...` for `pagination`.
///
/// Returns an empty string when there is nothing to render.
pub fn order_by_clause(
    pagination: &Pagination,
    options: &dyn OptionsMap,
) -> Result<String, SearchError> {
    let mut parts = Vec::new();
    if !pagination.sort_options.is_empty() {
        let keys = pagination
            .sort_options
            .iter()
            .map(|s| {
                let descriptor = options.get(&s.field).ok_or_else(|| {
                    SearchError::NoMatchingSortSpec(vec![s.field.clone()])
                })?;
                let direction = if s.reversed { "desc" } else { "asc" };
                Ok(format!("{} {direction}", column(descriptor)))
            })
            .collect::<Result<Vec<_>, SearchError>>()?;
        parts.push(format!("order by {}", keys.join(", ")));
    }
    if let Some(limit) = pagination.limit {
        parts.push(format!("LIMIT {limit}"));
    }
    if pagination.offset > 0 {
        parts.push(format!("OFFSET {}", pagination.offset));
    }
    Ok(parts.join(" "))
}

/// Renders a complete `select table.id from table ...` statement.
pub fn select_ids(
    table: &str,
    query: &Query,
    options: &dyn OptionsMap,
) -> Result<SqlQuery, SearchError> {
    let mut clause = format!("select {table}.id from {table}");
    let mut params = Vec::new();
    if let Some(filter) = compile_where(table, query, options)? {
        clause.push_str(" where ");
        clause.push_str(&filter.clause);
        params = filter.params;
    }
    if let Some(pagination) = &query.pagination {
        let tail = order_by_clause(pagination, options)?;
        if !tail.is_empty() {
            clause.push(' ');
            clause.push_str(&tail);
        }
    }
    Ok(SqlQuery { clause, params })
}

/// Qualified column for a field.
fn column(descriptor: &FieldDescriptor) -> String {
    format!("{}.{}", descriptor.category, descriptor.path)
}

/// Walks a query, collecting bind values.
struct Compiler<'a> {
    /// Table the id column belongs to.
    table: &'a str,
    /// Label resolution.
    options: &'a dyn OptionsMap,
    /// Bind values so far.
    params: Vec<SqlParam>,
}

impl Compiler<'_> {
    /// Adds a bind value, returning its placeholder.
    fn bind(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    /// Compiles a query; `None` when it places no constraint.
    fn query(&mut self, query: &Query) -> Result<Option<String>, SearchError> {
        let Some(kind) = &query.kind else {
            return Ok(None);
        };
        match kind {
            QueryKind::Conjunction(queries) => self.join(queries, "and"),
            QueryKind::Disjunction(queries) => self.join(queries, "or"),
            QueryKind::Boolean(b) => {
                let must = self.join(&b.must, "and")?.unwrap_or_else(|| "true".into());
                let must_not = self.join(&b.must_not, "or")?.unwrap_or_else(|| "false".into());
                Ok(Some(format!("({must} and not ({must_not}))")))
            }
            QueryKind::Base(BaseQuery::MatchField(m)) => self.field(m).map(Some),
            QueryKind::Base(BaseQuery::MatchLinkedFields(fields)) => {
                let mut parts = Vec::with_capacity(fields.len());
                for m in fields {
                    parts.push(self.field(m)?);
                }
                Ok(wrap(parts, "and"))
            }
            QueryKind::Base(BaseQuery::DocIds(ids)) => {
                let placeholder = self.bind(SqlParam::TextArray(ids.clone()));
                Ok(Some(format!("{}.id = ANY({placeholder}::text[])", self.table)))
            }
            QueryKind::Base(BaseQuery::MatchNone) => Ok(Some("false".into())),
        }
    }

    /// Joins compiled children with `op`.
    fn join(&mut self, queries: &[Query], op: &str) -> Result<Option<String>, SearchError> {
        let mut parts = Vec::with_capacity(queries.len());
        for query in queries {
            if let Some(part) = self.query(query)? {
                parts.push(part);
            }
        }
        Ok(wrap(parts, op))
    }

    /// Compiles one field predicate.
    fn field(&mut self, m: &MatchFieldQuery) -> Result<String, SearchError> {
        let options = self.options;
        let descriptor = options
            .get(&m.field)
            .ok_or_else(|| SearchError::UnknownField {
                field: m.field.clone(),
                category: self.table.to_string(),
            })?;
        let col = column(descriptor);
        let value = parse_value(&m.value).map_err(|e| SearchError::invalid_value(&m.field, &e))?;

        let predicate = match (value.kind, descriptor.data_type) {
            (MatchKind::Wildcard, _) => format!("{col} is not null"),
            (MatchKind::Null, _) => format!("{col} is null"),
            (MatchKind::Regex(pattern), _) => {
                format!("{col} ~* {}", self.bind(SqlParam::Text(pattern)))
            }
            (MatchKind::Compare(cmp, operand), _) => {
                let n = number(&m.field, &operand)?;
                format!("{col} {} {}", cmp.as_str(), self.bind(SqlParam::Numeric(n)))
            }
            (MatchKind::Prefix(v) | MatchKind::Exact(v), DataType::Numeric) => {
                let n = number(&m.field, &v)?;
                format!("{col} = {}", self.bind(SqlParam::Numeric(n)))
            }
            (MatchKind::Prefix(v) | MatchKind::Exact(v), DataType::Boolean) => {
                let b = match v.trim().to_lowercase().as_str() {
                    "true" => true,
                    "false" => false,
                    _ => {
                        return Err(SearchError::InvalidValue {
                            field: m.field.clone(),
                            message: format!("'{v}' is not true or false"),
                        });
                    }
                };
                format!("{col} = {}", self.bind(SqlParam::Boolean(b)))
            }
            (MatchKind::Prefix(v), DataType::String) => {
                format!("{col} ilike {}", self.bind(SqlParam::Text(format!("{v}%"))))
            }
            (MatchKind::Exact(v), DataType::String) => {
                format!("{col} ilike {}", self.bind(SqlParam::Text(v)))
            }
        };

        Ok(if value.negated {
            format!("not ({predicate})")
        } else {
            predicate
        })
    }
}

/// Parses a numeric operand.
fn number(field: &str, raw: &str) -> Result<f64, SearchError> {
    raw.trim().parse().map_err(|_| SearchError::InvalidValue {
        field: field.to_string(),
        message: format!("'{raw}' is not a number"),
    })
}

/// Parenthesizes two or more parts joined by `op`.
fn wrap(mut parts: Vec<String>, op: &str) -> Option<String> {
    match parts.len() {
        0 => None,
        1 => parts.pop(),
        _ => Some(format!("({})", parts.join(&format!(" {op} ")))),
    }
}
