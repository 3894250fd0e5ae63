//! Search results and identifier remapping.

use std::collections::{BTreeMap, HashMap};

use fedq_query::Pagination;
use serde::Serialize;
use serde_json::Value;

use crate::{context::Context, searcher::Transformation};

/// One matching document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResult {
    /// Document identifier; results with equal ids describe the same document.
    pub id: String,
    /// Field path to the matched values, for highlighted fields.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub matches: BTreeMap<String, Vec<String>>,
    /// Backend relevance score.
    pub score: f64,
    /// Field path to retrieved values.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Value>,
}

impl SearchResult {
    /// A result with only an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Adds matched values under `path`.
    pub fn with_match(mut self, path: impl Into<String>, values: Vec<String>) -> Self {
        self.matches.insert(path.into(), values);
        self
    }

    /// Adds a retrieved value under `path`.
    pub fn with_field(mut self, path: impl Into<String>, value: Value) -> Self {
        self.fields.insert(path.into(), value);
        self
    }

    /// Merges `other` into `self` for two views of the same document.
    ///
    /// Keys only one side has are kept; on a shared key the value from
    /// `other` replaces ours. The higher score wins.
    pub(crate) fn merge_overwrite(&mut self, other: Self) {
        self.matches.extend(other.matches);
        self.fields.extend(other.fields);
        if other.score > self.score {
            self.score = other.score;
        }
    }

    /// Accumulates a source result into a remapped target.
    ///
    /// Match lists on a shared key are concatenated; for fields the first
    /// writer wins.
    fn merge_accumulate(&mut self, source: &Self) {
        for (path, values) in &source.matches {
            self.matches
                .entry(path.clone())
                .or_default()
                .extend(values.iter().cloned());
        }
        for (path, value) in &source.fields {
            self.fields
                .entry(path.clone())
                .or_insert_with(|| value.clone());
        }
        if source.score > self.score {
            self.score = source.score;
        }
    }
}

/// Remaps result ids through a one-to-many transformation.
///
/// Each source id may fan out to several targets and several sources may land
/// on one target; a target appears once, in first-seen order, carrying the
/// accumulated matches and fields of every source that reached it.
pub fn transform_results(
    ctx: &Context,
    results: Vec<SearchResult>,
    transformation: &Transformation,
) -> Vec<SearchResult> {
    let mut out: Vec<SearchResult> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for source in results {
        for target in transformation(ctx, &source.id) {
            let idx = match index.get(&target) {
                Some(&idx) => idx,
                None => {
                    index.insert(target.clone(), out.len());
                    out.push(SearchResult::new(target));
                    out.len() - 1
                }
            };
            out[idx].merge_accumulate(&source);
        }
    }

    out
}

/// Applies offset and limit.
pub fn page_results(results: Vec<SearchResult>, pagination: &Pagination) -> Vec<SearchResult> {
    let iter = results.into_iter().skip(pagination.offset);
    match pagination.limit {
        Some(limit) => iter.take(limit).collect(),
        None => iter.collect(),
    }
}
