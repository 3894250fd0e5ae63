//! Field predicates over JSON documents.

use std::cmp::Ordering;

use fedq_query::{Comparator, MatchFieldQuery, MatchKind, parse_value};
use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::{
    error::SearchError,
    options::{DataType, FieldDescriptor},
};

/// Values at a dotted path, fanning out through arrays. Nulls are skipped.
pub(crate) fn values_at<'a>(root: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![root];
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        let mut next = Vec::new();
        for value in current {
            descend(value, segment, &mut next);
        }
        current = next;
    }
    let mut out = Vec::with_capacity(current.len());
    for value in current {
        flatten(value, &mut out);
    }
    out
}

/// Steps one path segment into `value`, through arrays.
fn descend<'a>(value: &'a Value, segment: &str, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                descend(item, segment, out);
            }
        }
        Value::Object(map) => {
            if let Some(child) = map.get(segment) {
                out.push(child);
            }
        }
        _ => {}
    }
}

/// Collects scalars, unrolling arrays and dropping nulls.
fn flatten<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                flatten(item, out);
            }
        }
        other => out.push(other),
    }
}

/// Text form of a scalar.
pub(crate) fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numeric form of a number or numeric string.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Orders two sort keys: numerically when both are numbers, else by
/// lower-cased text.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    let x = as_text(a).unwrap_or_default().to_lowercase();
    let y = as_text(b).unwrap_or_default().to_lowercase();
    x.cmp(&y)
}

/// The positive form of a predicate.
#[derive(Debug)]
enum Test {
    /// Lower-cased prefix.
    Prefix(String),
    /// Lower-cased whole value.
    Exact(String),
    /// Case-insensitive pattern.
    Regex(Regex),
    /// Numeric comparison against the operand.
    Compare(Comparator, f64),
    /// Boolean equality.
    Bool(bool),
    /// Any value present.
    Wildcard,
    /// No value present.
    Null,
}

/// A compiled field predicate.
#[derive(Debug)]
pub(crate) struct FieldMatcher {
    /// Inverts the test.
    negated: bool,
    /// What a value must satisfy.
    test: Test,
}

impl FieldMatcher {
    /// Compiles `field`'s value for a field of `descriptor`'s type.
    pub(crate) fn new(
        field: &MatchFieldQuery,
        descriptor: &FieldDescriptor,
    ) -> Result<Self, SearchError> {
        let value = parse_value(&field.value)
            .map_err(|e| SearchError::invalid_value(&field.field, &e))?;
        let invalid = |message: String| SearchError::InvalidValue {
            field: field.field.clone(),
            message,
        };

        let test = match (value.kind, descriptor.data_type) {
            (MatchKind::Wildcard, _) => Test::Wildcard,
            (MatchKind::Null, _) => Test::Null,
            (MatchKind::Regex(pattern), _) => Test::Regex(
                RegexBuilder::new(&pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            (MatchKind::Compare(cmp, operand), _) => {
                let operand = operand
                    .parse()
                    .map_err(|_| invalid(format!("'{operand}' is not a number")))?;
                Test::Compare(cmp, operand)
            }
            (MatchKind::Prefix(v) | MatchKind::Exact(v), DataType::Numeric) => {
                let operand = v
                    .trim()
                    .parse()
                    .map_err(|_| invalid(format!("'{v}' is not a number")))?;
                Test::Compare(Comparator::Equal, operand)
            }
            (MatchKind::Prefix(v) | MatchKind::Exact(v), DataType::Boolean) => {
                match v.trim().to_lowercase().as_str() {
                    "true" => Test::Bool(true),
                    "false" => Test::Bool(false),
                    _ => return Err(invalid(format!("'{v}' is not true or false"))),
                }
            }
            (MatchKind::Prefix(v), DataType::String) => Test::Prefix(v.to_lowercase()),
            (MatchKind::Exact(v), DataType::String) => Test::Exact(v.to_lowercase()),
        };

        Ok(Self {
            negated: value.negated,
            test,
        })
    }

    /// Returns the matching values' text when the predicate holds.
    ///
    /// A negated predicate holds when the positive one does not and reports
    /// no matched text.
    pub(crate) fn matches(&self, values: &[&Value]) -> Option<Vec<String>> {
        let positive = match &self.test {
            Test::Wildcard => (!values.is_empty()).then(|| texts(values.iter().copied())),
            Test::Null => values.is_empty().then(Vec::new),
            test => {
                let hits = texts(values.iter().copied().filter(|v| test_one(test, v)));
                (!hits.is_empty()).then_some(hits)
            }
        };
        match (self.negated, positive) {
            (false, result) => result,
            (true, Some(_)) => None,
            (true, None) => Some(Vec::new()),
        }
    }
}

/// Text forms of `values`.
fn texts<'a>(values: impl Iterator<Item = &'a Value>) -> Vec<String> {
    values.filter_map(as_text).collect()
}

/// Applies a non-presence test to one value.
fn test_one(test: &Test, value: &Value) -> bool {
    match test {
        Test::Prefix(prefix) => as_text(value).is_some_and(|t| t.to_lowercase().starts_with(prefix)),
        Test::Exact(exact) => as_text(value).is_some_and(|t| t.to_lowercase() == *exact),
        Test::Regex(re) => as_text(value).is_some_and(|t| re.is_match(&t)),
        Test::Compare(cmp, operand) => as_number(value).is_some_and(|n| cmp.apply(n, *operand)),
        Test::Bool(expected) => match value {
            Value::Bool(b) => b == expected,
            Value::String(s) => s.eq_ignore_ascii_case(if *expected { "true" } else { "false" }),
            _ => false,
        },
        Test::Wildcard => true,
        Test::Null => false,
    }
}
