//! Pinakes Core - Catalog Types and Chronology
//!
//! Pure data structures shared by the search engine and the indexers.
//! Nothing in this crate performs I/O: it holds the identifier and paging
//! types, the historical date model, the century expression adapter and the
//! error types used across the workspace.

pub mod century;
pub mod chronology;
pub mod date_index;
pub mod error;

pub use century::{threshold_value, CenturyDateAdapter};
pub use chronology::{Datation, HistoricalDate};
pub use date_index::{DateField, DateIndexEntry};
pub use error::{ConfigError, PinakesError, PinakesResult};

use serde::{Deserialize, Serialize};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Primary key of a catalog row (authors, works, keywords, relation types).
///
/// The catalog is an imported relational dump with integer keys, so ids are
/// plain `i32` values rather than generated UUIDs.
pub type EntityId = i32;

/// The kind of catalog entity a search targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Author,
    Work,
}

impl EntityKind {
    /// Name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Author => "author",
            EntityKind::Work => "work",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// PAGING
// ============================================================================

/// Paging options shared by every paged request.
///
/// `page_number` is 1-based. A `page_size` of zero or less disables paging
/// entirely: the data query is then unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingOptions {
    pub page_number: i32,
    pub page_size: i32,
}

impl Default for PagingOptions {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: 20,
        }
    }
}

impl PagingOptions {
    pub fn new(page_number: i32, page_size: i32) -> Self {
        Self {
            page_number,
            page_size,
        }
    }

    /// Options that fetch everything in a single page.
    pub fn unpaged() -> Self {
        Self {
            page_number: 1,
            page_size: 0,
        }
    }

    pub fn is_paged(&self) -> bool {
        self.page_size > 0
    }

    /// Number of entities to skip before the requested page.
    pub fn skip_count(&self) -> i64 {
        if !self.is_paged() {
            return 0;
        }
        (i64::from(self.page_number.max(1)) - 1) * i64::from(self.page_size)
    }
}

/// One page of results along with the total number of matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPage<T> {
    pub page_number: i32,
    pub page_size: i32,
    pub total: i64,
    pub items: Vec<T>,
}

impl<T> DataPage<T> {
    pub fn new(paging: PagingOptions, total: i64, items: Vec<T>) -> Self {
        Self {
            page_number: paging.page_number,
            page_size: paging.page_size,
            total,
            items,
        }
    }

    pub fn empty(paging: PagingOptions) -> Self {
        Self::new(paging, 0, Vec::new())
    }

    /// Total number of pages, or 1 when the request was unpaged.
    pub fn page_count(&self) -> i64 {
        if self.page_size <= 0 {
            return 1;
        }
        (self.total + i64::from(self.page_size) - 1) / i64::from(self.page_size)
    }
}

/// An id/value pair used for filter vocabularies (keywords, relation types).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LookupResult {
    pub id: EntityId,
    pub value: String,
}

impl std::fmt::Display for LookupResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}: {}", self.id, self.value)
    }
}
