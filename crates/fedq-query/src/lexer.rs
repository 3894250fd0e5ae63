//! Query-string lexer.
//!
//! Splits `field:value1,value2+field2:value3` into tokens. The first `:` of a
//! pair separates the field from its values; any later `:` belongs to the
//! value, so `Image:docker.io/nginx:1.25` lexes as one value.

use std::{iter::Peekable, str::Chars};

use crate::error::LexError;

/// A token in the query-string language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Unquoted text with surrounding whitespace trimmed.
    Word(String),

    /// A double-quoted value (quotes stripped, content preserved).
    Quoted(String),

    /// Field / value separator.
    Colon,

    /// Separates alternative values of one field.
    Comma,

    /// Separates conjuncts.
    Plus,
}

/// Tokenizes a query string.
struct Lexer<'a> {
    /// The original input string.
    input: &'a str,
    /// Character iterator with one-character lookahead.
    chars: Peekable<Chars<'a>>,
    /// Current byte position in input.
    position: usize,
    /// Whether the current pair has already seen its field separator.
    in_values: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
            in_values: false,
        }
    }

    /// Tokenizes the entire input, returning all tokens or an error.
    fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }

        Ok(tokens)
    }

    /// Returns the next token, or None if at end of input.
    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_whitespace();

        let Some(&ch) = self.chars.peek() else {
            return Ok(None);
        };

        match ch {
            '"' => self.read_quoted(),
            ',' => {
                self.advance();
                Ok(Some(Token::Comma))
            }
            '+' => {
                self.advance();
                self.in_values = false;
                Ok(Some(Token::Plus))
            }
            ':' if !self.in_values => {
                self.advance();
                self.in_values = true;
                Ok(Some(Token::Colon))
            }
            _ => Ok(self.read_word()),
        }
    }

    /// Reads a quoted value.
    fn read_quoted(&mut self) -> Result<Option<Token>, LexError> {
        let start_pos = self.position;
        self.advance(); // opening quote

        let mut content = String::new();
        loop {
            match self.chars.peek() {
                Some(&'"') => {
                    self.advance();
                    return Ok(Some(Token::Quoted(content)));
                }
                Some(&ch) => {
                    content.push(ch);
                    self.advance();
                }
                None => {
                    return Err(LexError::new("unclosed quote", start_pos, self.input));
                }
            }
        }
    }

    /// Reads unquoted text up to the next delimiter.
    fn read_word(&mut self) -> Option<Token> {
        let mut word = String::new();

        while let Some(&ch) = self.chars.peek() {
            let delimiter = matches!(ch, ',' | '+' | '"') || (ch == ':' && !self.in_values);
            if delimiter {
                break;
            }
            word.push(ch);
            self.advance();
        }

        let trimmed = word.trim_end();
        if trimmed.is_empty() {
            return None;
        }
        Some(Token::Word(trimmed.to_string()))
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Advances to the next character.
    fn advance(&mut self) {
        if let Some(ch) = self.chars.next() {
            self.position += ch.len_utf8();
        }
    }
}

/// Tokenizes a query string.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(input).tokenize()
}
