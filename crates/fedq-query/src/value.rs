//! Field value modifiers.
//!
//! A [`crate::MatchFieldQuery`] value is a plain string that may start with a
//! modifier: `!` negates, `r/` introduces a regex, `"..."` requests an exact
//! match, `>=` `<=` `>` `<` `==` compare numerically, and the bare values `*`
//! and `-` match any value and no value respectively. Anything else is a
//! case-insensitive prefix match.

use std::fmt;

use thiserror::Error;

/// Value meaning "the field has any value".
pub const WILDCARD: &str = "*";
/// Value meaning "the field has no value".
pub const NULL_VALUE: &str = "-";
/// Prefix marking a negated value.
pub const NEGATION_PREFIX: &str = "!";
/// Prefix marking a regular expression.
pub const REGEX_PREFIX: &str = "r/";

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchValue {
    /// The match is inverted.
    pub negated: bool,
    /// What to match.
    pub kind: MatchKind,
}

/// The matching strategy for a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKind {
    /// Case-insensitive prefix.
    Prefix(String),
    /// Case-insensitive equality.
    Exact(String),
    /// Case-insensitive regular expression.
    Regex(String),
    /// Numeric comparison against the operand.
    Compare(Comparator, String),
    /// Any value present.
    Wildcard,
    /// No value present.
    Null,
}

/// Numeric comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,
    /// `==`
    Equal,
    /// `>=`
    GreaterOrEqual,
    /// `>`
    Greater,
}

impl Comparator {
    /// Operator prefixes, longest first so `>=` wins over `>`.
    const PREFIXES: [(&'static str, Self); 5] = [
        (">=", Self::GreaterOrEqual),
        ("<=", Self::LessOrEqual),
        ("==", Self::Equal),
        (">", Self::Greater),
        ("<", Self::Less),
    ];

    /// The SQL / textual operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Equal => "=",
            Self::GreaterOrEqual => ">=",
            Self::Greater => ">",
        }
    }

    /// Applies the comparison `left <op> right`.
    pub fn apply(self, left: f64, right: f64) -> bool {
        match self {
            Self::Less => left < right,
            Self::LessOrEqual => left <= right,
            Self::Equal => left == right,
            Self::GreaterOrEqual => left >= right,
            Self::Greater => left > right,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors decoding a field value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// `r/` with nothing after it.
    #[error("empty regular expression in value '{0}'")]
    EmptyRegex(String),
    /// A comparator without an operand.
    #[error("missing operand after comparator in value '{0}'")]
    MissingOperand(String),
    /// A comparator whose operand is not a number.
    #[error("'{operand}' is not a number in value '{value}'")]
    NotANumber {
        /// The full value.
        value: String,
        /// The operand that failed to parse.
        operand: String,
    },
    /// Only a negation prefix.
    #[error("negation without a value")]
    BareNegation,
}

/// Decodes a raw field value into its modifier and operand.
pub fn parse_value(raw: &str) -> Result<MatchValue, ValueError> {
    let trimmed = raw.trim();
    let (negated, rest) = match trimmed.strip_prefix(NEGATION_PREFIX) {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    if negated && rest.is_empty() {
        return Err(ValueError::BareNegation);
    }

    let kind = if rest == WILDCARD {
        MatchKind::Wildcard
    } else if rest == NULL_VALUE {
        MatchKind::Null
    } else if let Some(pattern) = rest.strip_prefix(REGEX_PREFIX) {
        if pattern.is_empty() {
            return Err(ValueError::EmptyRegex(raw.to_string()));
        }
        MatchKind::Regex(pattern.to_string())
    } else if let Some(exact) = strip_quotes(rest) {
        MatchKind::Exact(exact.to_string())
    } else if let Some((cmp, operand)) = split_comparator(rest) {
        let operand = operand.trim();
        if operand.is_empty() {
            return Err(ValueError::MissingOperand(raw.to_string()));
        }
        if operand.parse::<f64>().is_err() {
            return Err(ValueError::NotANumber {
                value: raw.to_string(),
                operand: operand.to_string(),
            });
        }
        MatchKind::Compare(cmp, operand.to_string())
    } else {
        MatchKind::Prefix(rest.to_string())
    };

    Ok(MatchValue { negated, kind })
}

/// Returns the inner text of a double-quoted value.
fn strip_quotes(value: &str) -> Option<&str> {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        Some(&value[1..value.len() - 1])
    } else {
        None
    }
}

/// Splits a leading comparator from its operand.
fn split_comparator(value: &str) -> Option<(Comparator, &str)> {
    Comparator::PREFIXES
        .iter()
        .find_map(|(prefix, cmp)| value.strip_prefix(prefix).map(|rest| (*cmp, rest)))
}

/// Wraps a value in quotes so it matches exactly.
pub fn exact(value: &str) -> String {
    format!("\"{value}\"")
}

/// Marks a value as a regular expression.
pub fn regex(value: &str) -> String {
    format!("{REGEX_PREFIX}{value}")
}

/// Negates a value.
pub fn negate(value: &str) -> String {
    format!("{NEGATION_PREFIX}{value}")
}
