//! Query text filters
//!
//! Operands of the comparison operators are normalized the same way the
//! indexer normalized the token values they are matched against: collapse
//! whitespace, then fold case and diacritics.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// A step of the text normalization pipeline.
pub trait TextFilter: Send + Sync {
    fn apply(&self, text: &str) -> String;

    fn name(&self) -> &str;
}

/// Collapses whitespace runs into a single space and trims the ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTextFilter;

impl TextFilter for WhitespaceTextFilter {
    fn apply(&self, text: &str) -> String {
        WHITESPACE_RE.replace_all(text, " ").trim().to_string()
    }

    fn name(&self) -> &str {
        "whitespace"
    }
}

/// Lowercases, strips diacritics and drops everything but letters, digits,
/// apostrophes and whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTextFilter;

impl TextFilter for StandardTextFilter {
    fn apply(&self, text: &str) -> String {
        text.nfd()
            .filter(|c| !is_combining_mark(*c))
            .flat_map(char::to_lowercase)
            .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '\'')
            .collect()
    }

    fn name(&self) -> &str {
        "standard"
    }
}

/// Lowercases in composed form and keeps diacritics, matching what
/// `LOWER(column)` yields on stored vocabulary.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowercaseTextFilter;

impl TextFilter for LowercaseTextFilter {
    fn apply(&self, text: &str) -> String {
        text.nfc().flat_map(char::to_lowercase).collect()
    }

    fn name(&self) -> &str {
        "lowercase"
    }
}

/// Runs its filters in order, each on the previous one's output.
#[derive(Default)]
pub struct CompositeTextFilter {
    filters: Vec<Box<dyn TextFilter>>,
}

impl CompositeTextFilter {
    pub fn new(filters: Vec<Box<dyn TextFilter>>) -> Self {
        Self { filters }
    }

    /// Whitespace collapsing followed by standard folding.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(WhitespaceTextFilter),
            Box::new(StandardTextFilter),
        ])
    }

    /// Whitespace collapsing followed by case folding only.
    pub fn lookup() -> Self {
        Self::new(vec![
            Box::new(WhitespaceTextFilter),
            Box::new(LowercaseTextFilter),
        ])
    }

    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }
}

impl TextFilter for CompositeTextFilter {
    fn apply(&self, text: &str) -> String {
        self.filters
            .iter()
            .fold(text.to_string(), |acc, filter| filter.apply(&acc))
    }

    fn name(&self) -> &str {
        "composite"
    }
}

impl std::fmt::Debug for CompositeTextFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeTextFilter")
            .field("filters", &self.filter_names())
            .finish()
    }
}
