//! An in-memory backend over JSON documents.
//!
//! [`MemorySearcher`] answers structured queries against a fixed set of JSON
//! objects. Field labels resolve through a [`FieldRegistry`] to dotted
//! document paths; paths fan out through arrays, so `containers.image.name`
//! sees every container's image. Linked-field predicates must hold within
//! one element of the deepest array their paths share.

mod matcher;

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use fedq_query::{BaseQuery, MatchFieldQuery, Pagination, Query, QueryKind};
use serde_json::Value;
use tracing::trace;

use self::matcher::{FieldMatcher, as_text, compare_values, values_at};
use crate::{
    context::Context,
    error::SearchError,
    options::{FieldDescriptor, FieldRegistry, OptionsMap},
    result::{SearchResult, page_results},
    searcher::{Searcher, Transformation},
};

/// Field path to matched text, for highlighted predicates.
type Matches = BTreeMap<String, Vec<String>>;

/// A document with its identifier pulled out.
#[derive(Debug, Clone)]
struct Document {
    /// Identifier from the `id` key.
    id: String,
    /// The full document.
    body: Value,
}

/// A searcher over JSON documents held in memory.
#[derive(Debug, Clone)]
pub struct MemorySearcher {
    /// Field labels and their paths.
    registry: Arc<FieldRegistry>,
    /// Documents in load order.
    documents: Vec<Document>,
}

impl MemorySearcher {
    /// Creates a searcher over `documents`.
    ///
    /// Every document must be an object with a string or numeric `id`.
    pub fn new(registry: Arc<FieldRegistry>, documents: Vec<Value>) -> Result<Self, SearchError> {
        let mut docs = Vec::with_capacity(documents.len());
        for (index, body) in documents.into_iter().enumerate() {
            let id = body
                .get("id")
                .and_then(as_text)
                .ok_or_else(|| SearchError::Backend {
                    backend: registry.category().to_string(),
                    message: format!("document {index} has no string or numeric 'id'"),
                })?;
            docs.push(Document { id, body });
        }
        Ok(Self {
            registry,
            documents: docs,
        })
    }

    /// The field registry.
    pub fn registry(&self) -> Arc<FieldRegistry> {
        Arc::clone(&self.registry)
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True when there are no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// A transformation mapping a document id to the ids stored under
    /// `path` in that document.
    pub fn link_transformation(&self, path: &str) -> Transformation {
        let links: HashMap<String, Vec<String>> = self
            .documents
            .iter()
            .map(|doc| {
                let targets = values_at(&doc.body, path)
                    .into_iter()
                    .filter_map(as_text)
                    .collect();
                (doc.id.clone(), targets)
            })
            .collect();
        Arc::new(move |_: &Context, id: &str| links.get(id).cloned().unwrap_or_default())
    }

    /// Resolves a label, failing on unknown fields.
    fn descriptor(&self, label: &str) -> Result<&FieldDescriptor, SearchError> {
        self.registry
            .get(label)
            .ok_or_else(|| SearchError::UnknownField {
                field: label.to_string(),
                category: self.registry.category().to_string(),
            })
    }

    /// Binds every predicate in `query` to a path and matcher.
    fn compile(&self, query: &Query) -> Result<Compiled, SearchError> {
        let Some(kind) = &query.kind else {
            return Ok(Compiled::All);
        };
        Ok(match kind {
            QueryKind::Conjunction(queries) => Compiled::And(
                queries
                    .iter()
                    .map(|q| self.compile(q))
                    .collect::<Result<_, _>>()?,
            ),
            QueryKind::Disjunction(queries) => Compiled::Or(
                queries
                    .iter()
                    .map(|q| self.compile(q))
                    .collect::<Result<_, _>>()?,
            ),
            QueryKind::Boolean(b) => Compiled::Not(
                Box::new(Compiled::And(
                    b.must.iter().map(|q| self.compile(q)).collect::<Result<_, _>>()?,
                )),
                Box::new(Compiled::Or(
                    b.must_not
                        .iter()
                        .map(|q| self.compile(q))
                        .collect::<Result<_, _>>()?,
                )),
            ),
            QueryKind::Base(BaseQuery::MatchField(m)) => Compiled::Field(self.compile_field(m)?),
            QueryKind::Base(BaseQuery::MatchLinkedFields(fields)) => self.compile_linked(fields)?,
            QueryKind::Base(BaseQuery::DocIds(ids)) => Compiled::Ids(ids.clone()),
            QueryKind::Base(BaseQuery::MatchNone) => Compiled::Nothing,
        })
    }

    /// Binds one field predicate.
    fn compile_field(&self, m: &MatchFieldQuery) -> Result<CompiledField, SearchError> {
        let descriptor = self.descriptor(&m.field)?;
        Ok(CompiledField {
            path: descriptor.path.clone(),
            highlight: m.highlight,
            matcher: FieldMatcher::new(m, descriptor)?,
        })
    }

    /// Binds linked fields under their longest common path prefix.
    fn compile_linked(&self, fields: &[MatchFieldQuery]) -> Result<Compiled, SearchError> {
        let compiled = fields
            .iter()
            .map(|m| self.compile_field(m))
            .collect::<Result<Vec<_>, _>>()?;
        let prefix = common_prefix(compiled.iter().map(|f| f.path.as_str()));
        let relative = compiled
            .into_iter()
            .map(|f| CompiledField {
                path: f.path[prefix.len()..].trim_start_matches('.').to_string(),
                ..f
            })
            .collect();
        Ok(Compiled::Linked { prefix, fields: relative })
    }

    /// Orders results by the sort keys, id breaking ties.
    fn sort(&self, matched: &mut [SearchResult], pagination: &Pagination) -> Result<(), SearchError> {
        if pagination.sort_options.is_empty() {
            return Ok(());
        }
        let keys = pagination
            .sort_options
            .iter()
            .map(|s| Ok((self.descriptor(&s.field)?.path.clone(), s.reversed)))
            .collect::<Result<Vec<_>, SearchError>>()?;
        let bodies: HashMap<&str, &Value> = self
            .documents
            .iter()
            .map(|d| (d.id.as_str(), &d.body))
            .collect();

        let sort_key = |id: &str, path: &str| -> Option<Value> {
            bodies
                .get(id)
                .and_then(|body| values_at(body, path).first().map(|v| (*v).clone()))
        };
        matched.sort_by(|a, b| {
            for (path, reversed) in &keys {
                let ordering = match (sort_key(&a.id, path), sort_key(&b.id, path)) {
                    (Some(x), Some(y)) => {
                        let o = compare_values(&x, &y);
                        if *reversed { o.reverse() } else { o }
                    }
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            a.id.cmp(&b.id)
        });
        Ok(())
    }

    /// Every matching document, in load order.
    fn matching(&self, query: &Query) -> Result<Vec<SearchResult>, SearchError> {
        let compiled = self.compile(query)?;
        let mut out = Vec::new();
        for doc in &self.documents {
            if let Some(matches) = compiled.eval(&doc.body, &doc.id) {
                let mut result = SearchResult::new(doc.id.clone());
                result.score = 1.0;
                result.matches = matches;
                for descriptor in self.registry.descriptors() {
                    if let Some(value) = stored_value(&doc.body, &descriptor.path) {
                        result.fields.insert(descriptor.path.clone(), value);
                    }
                }
                out.push(result);
            }
        }
        Ok(out)
    }
}

impl Searcher for MemorySearcher {
    fn search(&self, ctx: &Context, query: &Query) -> Result<Vec<SearchResult>, SearchError> {
        ctx.check()?;
        let mut results = self.matching(query)?;
        if let Some(pagination) = &query.pagination {
            self.sort(&mut results, pagination)?;
            results = page_results(results, pagination);
        }
        trace!(
            category = self.registry.category(),
            results = results.len(),
            "memory search"
        );
        Ok(results)
    }

    fn count(&self, ctx: &Context, query: &Query) -> Result<usize, SearchError> {
        ctx.check()?;
        Ok(self.matching(query)?.len())
    }
}

/// A query bound to document paths.
#[derive(Debug)]
enum Compiled {
    /// Matches everything.
    All,
    /// Matches nothing.
    Nothing,
    /// Every part matches.
    And(Vec<Compiled>),
    /// Some part matches.
    Or(Vec<Compiled>),
    /// First matches and second does not.
    Not(Box<Compiled>, Box<Compiled>),
    /// One field predicate.
    Field(CompiledField),
    /// Fields that must hold within one element under `prefix`.
    Linked {
        /// Common path of the repeated element.
        prefix: String,
        /// Predicates with paths relative to `prefix`.
        fields: Vec<CompiledField>,
    },
    /// Identifier membership.
    Ids(Vec<String>),
}

/// A field predicate bound to a document path.
#[derive(Debug)]
struct CompiledField {
    /// Dotted path, relative to the evaluation scope.
    path: String,
    /// Whether to record matched values.
    highlight: bool,
    /// The value predicate.
    matcher: FieldMatcher,
}

impl CompiledField {
    /// Tests the field within `scope`, recording hits under `full_path`.
    fn eval(&self, scope: &Value, full_path: &str, matches: &mut Matches) -> bool {
        match self.matcher.matches(&values_at(scope, &self.path)) {
            Some(hits) => {
                if self.highlight && !hits.is_empty() {
                    matches
                        .entry(full_path.to_string())
                        .or_default()
                        .extend(hits);
                }
                true
            }
            None => false,
        }
    }
}

impl Compiled {
    /// Tests a document, returning its matches.
    fn eval(&self, body: &Value, id: &str) -> Option<Matches> {
        let mut matches = Matches::new();
        self.eval_into(body, id, &mut matches).then_some(matches)
    }

    /// Tests a document, accumulating matches into `matches`.
    fn eval_into(&self, body: &Value, id: &str, matches: &mut Matches) -> bool {
        match self {
            Self::All => true,
            Self::Nothing => false,
            Self::And(parts) => parts.iter().all(|p| p.eval_into(body, id, matches)),
            Self::Or(parts) => {
                let mut any = false;
                for part in parts {
                    any |= part.eval_into(body, id, matches);
                }
                any
            }
            Self::Not(must, must_not) => {
                let mut discard = Matches::new();
                must.eval_into(body, id, matches) && !must_not.eval_into(body, id, &mut discard)
            }
            Self::Field(field) => field.eval(body, &field.path, matches),
            Self::Linked { prefix, fields } => {
                let scopes = if prefix.is_empty() {
                    vec![body]
                } else {
                    values_at(body, prefix)
                };
                let mut hit = false;
                for scope in scopes {
                    let mut local = Matches::new();
                    let all = fields.iter().all(|f| {
                        let full = join_path(prefix, &f.path);
                        f.eval(scope, &full, &mut local)
                    });
                    if all {
                        hit = true;
                        for (path, values) in local {
                            matches.entry(path).or_default().extend(values);
                        }
                    }
                }
                hit
            }
            Self::Ids(ids) => ids.iter().any(|candidate| candidate == id),
        }
    }
}

/// Joins two dotted paths.
fn join_path(prefix: &str, rest: &str) -> String {
    match (prefix.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{prefix}.{rest}"),
    }
}

/// Longest shared run of leading path segments, excluding each path's last
/// segment.
fn common_prefix<'a>(paths: impl Iterator<Item = &'a str>) -> String {
    let mut prefix: Option<Vec<&str>> = None;
    for path in paths {
        let segments: Vec<&str> = path.split('.').collect();
        let parent = &segments[..segments.len().saturating_sub(1)];
        prefix = Some(match prefix {
            None => parent.to_vec(),
            Some(current) => current
                .iter()
                .zip(parent)
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| *a)
                .collect(),
        });
    }
    prefix.unwrap_or_default().join(".")
}

/// The value stored under `path`: a scalar when there is one, else an array.
fn stored_value(body: &Value, path: &str) -> Option<Value> {
    let values = values_at(body, path);
    match values.as_slice() {
        [] => None,
        [single] => Some((*single).clone()),
        many => Some(Value::Array(many.iter().map(|v| (*v).clone()).collect())),
    }
}
