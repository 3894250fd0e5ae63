//! Fluent construction of structured queries.

use std::collections::HashSet;

use crate::{
    ast::{MatchFieldQuery, Pagination, Query},
    helpers::{conjunction_or_single, disjunction_or_single},
    value::{NULL_VALUE, WILDCARD, exact, regex},
};

/// Builds a conjunction of per-field disjunctions.
///
/// Values added for one field are OR-ed together; distinct fields are AND-ed
/// in the order they were first added.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    /// Field label and its values, in insertion order.
    fields: Vec<(String, Vec<String>)>,
    /// Field labels whose matches should be highlighted.
    highlighted: HashSet<String>,
    /// Linked-field groups.
    linked: Vec<Vec<MatchFieldQuery>>,
    /// Document identifier restriction.
    doc_ids: Option<Vec<String>>,
    /// Pagination applied to the built query.
    pagination: Option<Pagination>,
}

impl QueryBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds prefix-matched values for `field`.
    pub fn add_strings<I, S>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.entry(field);
        entry.extend(values.into_iter().map(Into::into));
        self
    }

    /// Adds exact-matched values for `field`.
    pub fn add_exact_matches<I, S>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let quoted: Vec<String> = values.into_iter().map(|v| exact(v.as_ref())).collect();
        self.add_strings(field, quoted)
    }

    /// Adds regular-expression values for `field`.
    pub fn add_regexes<I, S>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = values.into_iter().map(|v| regex(v.as_ref())).collect();
        self.add_strings(field, patterns)
    }

    /// Adds boolean values for `field`.
    pub fn add_bools(self, field: &str, values: &[bool]) -> Self {
        self.add_strings(field, values.iter().map(ToString::to_string))
    }

    /// Requires `field` to be absent.
    pub fn add_null_field(self, field: &str) -> Self {
        self.add_strings(field, [NULL_VALUE])
    }

    /// Requires `field` to be present.
    pub fn add_wildcard(self, field: &str) -> Self {
        self.add_strings(field, [WILDCARD])
    }

    /// Restricts results to the given identifiers.
    pub fn add_doc_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.doc_ids
            .get_or_insert_with(Vec::new)
            .extend(ids.into_iter().map(Into::into));
        self
    }

    /// Adds a linked-field group: `fields[i]` must match `values[i]` within the
    /// same sub-object. Extra entries on either side are ignored.
    pub fn add_linked_fields(mut self, fields: &[&str], values: &[&str]) -> Self {
        let group = fields
            .iter()
            .zip(values)
            .map(|(f, v)| MatchFieldQuery::new(*f, *v))
            .collect();
        self.linked.push(group);
        self
    }

    /// Requests highlighting for every value added to `field`.
    pub fn mark_highlighted(mut self, field: &str) -> Self {
        self.highlighted.insert(field.to_lowercase());
        self
    }

    /// Attaches pagination.
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Builds the query. A builder with nothing added yields the empty query.
    pub fn build(self) -> Query {
        let mut conjuncts = Vec::new();
        if let Some(ids) = self.doc_ids {
            conjuncts.push(Query::doc_ids(ids));
        }
        for (field, values) in self.fields {
            let highlight = self.highlighted.contains(&field.to_lowercase());
            let disjuncts = values
                .into_iter()
                .map(|value| {
                    let mut m = MatchFieldQuery::new(field.clone(), value);
                    m.highlight = highlight;
                    Query::base(crate::BaseQuery::MatchField(m))
                })
                .collect();
            conjuncts.push(disjunction_or_single(disjuncts));
        }
        for mut group in self.linked {
            for m in &mut group {
                m.highlight = self.highlighted.contains(&m.field.to_lowercase());
            }
            conjuncts.push(Query::match_linked_fields(group));
        }

        let query = conjunction_or_single(conjuncts);
        match self.pagination {
            Some(p) => query.with_pagination(p),
            None => query,
        }
    }

    /// Returns the value list for `field`, creating it on first use.
    fn entry(&mut self, field: &str) -> &mut Vec<String> {
        let idx = match self
            .fields
            .iter()
            .position(|(f, _)| f.eq_ignore_ascii_case(field))
        {
            Some(idx) => idx,
            None => {
                self.fields.push((field.to_string(), Vec::new()));
                self.fields.len() - 1
            }
        };
        &mut self.fields[idx].1
    }
}
