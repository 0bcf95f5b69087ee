//! Query tokens
//!
//! A search text is a space-separated list of tokens. Each token is an
//! optional operator symbol immediately followed by its operand:
//!
//! | symbol | operator     | operand filtered |
//! |--------|--------------|------------------|
//! | `=`    | equals       | yes              |
//! | `<>`   | not equals   | yes              |
//! | `*=`   | contains     | yes              |
//! | `^=`   | starts with  | yes              |
//! | `$=`   | ends with    | yes              |
//! | `?=`   | wildcard     | no               |
//! | `~=`   | pattern      | no               |
//! | `%=`   | fuzzy        | no               |
//!
//! A token without a symbol uses [`DEFAULT_OPERATOR`].

use crate::sql::{CompareOp, Column, Condition};
use crate::text::{CompositeTextFilter, TextFilter, WhitespaceTextFilter};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<o>=|<>|\*=|\^=|\$=|\?=|~=|%=)?(?P<v>.+)").expect("valid token regex")
});

/// Operator used when a token carries no symbol.
pub const DEFAULT_OPERATOR: TokenOperator = TokenOperator::Contains;

/// Similarity required by fuzzy tokens that do not name a threshold.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenOperator {
    Equals,
    NotEquals,
    Contains,
    StartsWith,
    EndsWith,
    Wildcard,
    Pattern,
    Fuzzy,
}

impl TokenOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(TokenOperator::Equals),
            "<>" => Some(TokenOperator::NotEquals),
            "*=" => Some(TokenOperator::Contains),
            "^=" => Some(TokenOperator::StartsWith),
            "$=" => Some(TokenOperator::EndsWith),
            "?=" => Some(TokenOperator::Wildcard),
            "~=" => Some(TokenOperator::Pattern),
            "%=" => Some(TokenOperator::Fuzzy),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TokenOperator::Equals => "=",
            TokenOperator::NotEquals => "<>",
            TokenOperator::Contains => "*=",
            TokenOperator::StartsWith => "^=",
            TokenOperator::EndsWith => "$=",
            TokenOperator::Wildcard => "?=",
            TokenOperator::Pattern => "~=",
            TokenOperator::Fuzzy => "%=",
        }
    }

    /// Whether the operand goes through the text filters before matching.
    pub fn requires_filtering(&self) -> bool {
        matches!(
            self,
            TokenOperator::Equals
                | TokenOperator::NotEquals
                | TokenOperator::Contains
                | TokenOperator::StartsWith
                | TokenOperator::EndsWith
        )
    }
}

impl fmt::Display for TokenOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One operator-tagged operand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub operator: TokenOperator,
    pub operand: String,
}

impl Token {
    pub fn new(operator: TokenOperator, operand: impl Into<String>) -> Self {
        Self {
            operator,
            operand: operand.into(),
        }
    }

    /// The condition this token puts on an indexed token value column.
    pub fn condition(&self, column: impl Into<Column>) -> Condition {
        let column = column.into();
        let operand = &self.operand;
        match self.operator {
            TokenOperator::Equals => Condition::eq(column, operand.as_str()),
            TokenOperator::NotEquals => {
                Condition::compare(column, CompareOp::Ne, operand.as_str())
            }
            TokenOperator::Contains => {
                Condition::like(column, format!("%{}%", escape_like(operand)))
            }
            TokenOperator::StartsWith => Condition::like(column, format!("{}%", escape_like(operand))),
            TokenOperator::EndsWith => Condition::like(column, format!("%{}", escape_like(operand))),
            TokenOperator::Wildcard => Condition::like(column, wildcard_to_like(operand)),
            TokenOperator::Pattern => Condition::regex(column, operand.as_str()),
            TokenOperator::Fuzzy => {
                let (value, threshold) = split_fuzzy(operand);
                Condition::fuzzy(column, value, threshold)
            }
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.operand)
    }
}

/// Escape LIKE metacharacters with a backslash.
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Translate a `*`/`?` wildcard into a lowercase LIKE pattern.
fn wildcard_to_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        match c {
            '*' => out.push('%'),
            '?' => out.push('_'),
            '%' | '_' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Split a fuzzy operand `value[:threshold]`.
fn split_fuzzy(operand: &str) -> (&str, f64) {
    if let Some((value, threshold)) = operand.rsplit_once(':') {
        if let Ok(threshold) = threshold.parse::<f64>() {
            if (0.0..=1.0).contains(&threshold) && !value.is_empty() {
                return (value, threshold);
            }
        }
    }
    (operand, DEFAULT_FUZZY_THRESHOLD)
}

// ============================================================================
// PARSER
// ============================================================================

/// Splits search text into tokens and filters their operands.
#[derive(Debug)]
pub struct TokenParser {
    filter: CompositeTextFilter,
    default_operator: TokenOperator,
}

impl Default for TokenParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenParser {
    pub fn new() -> Self {
        Self {
            filter: CompositeTextFilter::standard(),
            default_operator: DEFAULT_OPERATOR,
        }
    }

    pub fn with_default_operator(mut self, operator: TokenOperator) -> Self {
        self.default_operator = operator;
        self
    }

    pub fn default_operator(&self) -> TokenOperator {
        self.default_operator
    }

    /// Collapse whitespace and split into raw token strings.
    pub fn split(text: &str) -> Vec<String> {
        let collapsed = WhitespaceTextFilter.apply(text);
        if collapsed.is_empty() {
            return Vec::new();
        }
        collapsed.split(' ').map(str::to_string).collect()
    }

    /// Parse one raw token.
    ///
    /// Returns `None` when the token does not match the grammar, its
    /// operand is empty after filtering, or a pattern operand is not a
    /// valid regular expression.
    pub fn parse_token(&self, raw: &str) -> Option<Token> {
        let caps = TOKEN_RE.captures(raw)?;
        let operator = caps
            .name("o")
            .and_then(|m| TokenOperator::from_symbol(m.as_str()))
            .unwrap_or(self.default_operator);
        let mut operand = caps.name("v").map(|m| m.as_str().to_string())?;

        if operator.requires_filtering() {
            operand = self.filter.apply(&operand);
        }
        if operand.is_empty() {
            return None;
        }
        if operator == TokenOperator::Pattern {
            if let Err(e) = Regex::new(&operand) {
                tracing::debug!(token = %raw, error = %e, "Skipping token with invalid pattern");
                return None;
            }
        }
        Some(Token { operator, operand })
    }

    /// Parse a whole search text, skipping tokens that yield no operand.
    pub fn normalize(&self, text: Option<&str>) -> Vec<Token> {
        let Some(text) = text else {
            return Vec::new();
        };
        Self::split(text)
            .iter()
            .filter_map(|raw| {
                let token = self.parse_token(raw);
                if token.is_none() {
                    tracing::trace!(token = %raw, "Skipping token");
                }
                token
            })
            .collect()
    }
}
