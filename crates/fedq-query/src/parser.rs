//! Query-string parser.
//!
//! # Grammar
//!
//! ```text
//! query  → pair ("+" pair)*
//! pair   → WORD ":" values
//! values → value ("," value)*
//! value  → WORD | QUOTED
//! ```
//!
//! Values of one pair form a disjunction, pairs form a conjunction, and a
//! field named twice has its values merged into one disjunction.

use std::collections::HashSet;

use crate::{
    ast::{BaseQuery, MatchFieldQuery, Query, QueryKind},
    builder::QueryBuilder,
    error::{ParseError, QueryError},
    lexer::{Token, tokenize},
    value::{exact, parse_value},
};

/// Options controlling [`parse_query_string`].
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Return the empty query for blank input instead of an error.
    pub match_all_if_empty: bool,
    /// Field labels (case-insensitive) to drop from the parsed query.
    pub excluded_fields: HashSet<String>,
}

impl ParseOptions {
    /// Options accepting blank input as "match everything".
    pub fn match_all_if_empty() -> Self {
        Self {
            match_all_if_empty: true,
            ..Self::default()
        }
    }

    /// Adds a field label to drop.
    pub fn exclude_field(mut self, field: &str) -> Self {
        self.excluded_fields.insert(field.to_lowercase());
        self
    }
}

/// A parsed `field:values` pair.
struct Pair {
    /// Field label.
    field: String,
    /// Raw values, quotes restored for quoted tokens.
    values: Vec<String>,
}

/// Recursive descent parser over the token stream.
struct Parser {
    /// Token stream to parse.
    tokens: Vec<Token>,
    /// Current position in token stream.
    position: usize,
}

impl Parser {
    /// Creates a new parser from a token stream.
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Parses: query → pair ("+" pair)*
    fn parse(mut self) -> Result<Vec<Pair>, ParseError> {
        let mut pairs = vec![self.parse_pair()?];
        while let Some(token) = self.peek() {
            if *token != Token::Plus {
                return Err(ParseError::new(
                    format!("unexpected token: {token:?}"),
                    Some(self.position),
                ));
            }
            self.advance();
            pairs.push(self.parse_pair()?);
        }
        Ok(pairs)
    }

    /// Parses: pair → WORD ":" values
    fn parse_pair(&mut self) -> Result<Pair, ParseError> {
        let field = match self.peek().cloned() {
            Some(Token::Word(field)) => {
                self.advance();
                field
            }
            Some(token) => {
                return Err(ParseError::new(
                    format!("expected field name, found {token:?}"),
                    Some(self.position),
                ));
            }
            None => {
                return Err(ParseError::new(
                    "expected field name after '+'",
                    Some(self.position),
                ));
            }
        };

        if self.peek() != Some(&Token::Colon) {
            return Err(ParseError::new(
                format!("expected ':' after field '{field}'"),
                Some(self.position),
            ));
        }
        self.advance();

        let values = self.parse_values(&field)?;
        Ok(Pair { field, values })
    }

    /// Parses: values → value ("," value)*
    fn parse_values(&mut self, field: &str) -> Result<Vec<String>, ParseError> {
        let mut values = vec![self.parse_value(field)?];
        while self.peek() == Some(&Token::Comma) {
            self.advance();
            values.push(self.parse_value(field)?);
        }
        Ok(values)
    }

    /// Parses: value → WORD | QUOTED
    fn parse_value(&mut self, field: &str) -> Result<String, ParseError> {
        match self.peek().cloned() {
            Some(Token::Word(value)) => {
                self.advance();
                Ok(value)
            }
            Some(Token::Quoted(value)) => {
                self.advance();
                Ok(exact(&value))
            }
            _ => Err(ParseError::new(
                format!("empty value for field '{field}'"),
                Some(self.position),
            )),
        }
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }
}

/// Parses a `field:value1,value2+field2:value3` query string.
///
/// Every value is checked for a well-formed modifier. Blank input yields the
/// empty query when `options.match_all_if_empty` is set and an error
/// otherwise.
///
/// ```
/// use fedq_query::{ParseOptions, Query, parse_query_string};
///
/// let q = parse_query_string("Cluster:prod", &ParseOptions::default()).unwrap();
/// assert_eq!(q, Query::match_field("Cluster", "prod"));
/// ```
pub fn parse_query_string(input: &str, options: &ParseOptions) -> Result<Query, QueryError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        if options.match_all_if_empty {
            return Ok(Query::empty());
        }
        return Err(QueryError::empty().with_query(input));
    }

    let pairs = Parser::new(tokens)
        .parse()
        .map_err(|e| QueryError::from(e).with_query(input))?;

    let mut builder = QueryBuilder::new();
    for pair in pairs {
        if options.excluded_fields.contains(&pair.field.to_lowercase()) {
            continue;
        }
        for value in &pair.values {
            parse_value(value).map_err(|e| QueryError::value(&pair.field, e).with_query(input))?;
        }
        builder = builder.add_strings(&pair.field, pair.values);
    }
    Ok(builder.build())
}

/// Renders a conjunction of per-field disjunctions back to query-string form.
///
/// Returns `None` for shapes the string surface cannot express (booleans,
/// linked fields, doc ids, nested mixes).
pub fn to_query_string(query: &Query) -> Option<String> {
    let conjuncts: Vec<&Query> = match &query.kind {
        None => return Some(String::new()),
        Some(QueryKind::Conjunction(qs)) => qs.iter().collect(),
        Some(_) => vec![query],
    };

    let mut pairs = Vec::with_capacity(conjuncts.len());
    for conjunct in conjuncts {
        let matches: Vec<&MatchFieldQuery> = match &conjunct.kind {
            Some(QueryKind::Base(BaseQuery::MatchField(m))) => vec![m],
            Some(QueryKind::Disjunction(qs)) => qs
                .iter()
                .map(|q| match &q.kind {
                    Some(QueryKind::Base(BaseQuery::MatchField(m))) => Some(m),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()?,
            _ => return None,
        };
        let field = &matches.first()?.field;
        if matches.iter().any(|m| !m.field.eq_ignore_ascii_case(field)) {
            return None;
        }
        let values: Vec<&str> = matches.iter().map(|m| m.value.as_str()).collect();
        pairs.push(format!("{field}:{}", values.join(",")));
    }
    Some(pairs.join("+"))
}
