//! Date index entries
//!
//! The date indexer reads the century column of authors and works and
//! stores one parsed row per record in the date index table, which the
//! search engine's century filters then range-query. This module builds
//! those rows; writing them is the indexer's job.

use crate::century::CenturyDateAdapter;
use crate::chronology::HistoricalDate;
use crate::EntityId;
use serde::{Deserialize, Serialize};

/// Field code of a date index row, telling which table it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateField {
    /// Author century (`aut`).
    Author,
    /// Work century (`wrk`).
    Work,
}

impl DateField {
    pub fn code(&self) -> &'static str {
        match self {
            DateField::Author => "aut",
            DateField::Work => "wrk",
        }
    }
}

/// One row of the date index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateIndexEntry {
    pub field: DateField,
    pub target_id: EntityId,
    pub date: HistoricalDate,
    /// Human-readable rendering of `date`.
    pub date_txt: String,
    /// Sort value of `date`, compared against century thresholds.
    pub date_val: f64,
    /// The original century expression.
    pub source: String,
}

impl DateIndexEntry {
    /// Build the entry for one record, or `None` when `source` is not a
    /// century expression.
    pub fn build(
        adapter: &CenturyDateAdapter,
        field: DateField,
        target_id: EntityId,
        source: &str,
    ) -> Option<Self> {
        let date = adapter.parse_str(source)?;
        Some(Self {
            field,
            target_id,
            date,
            date_txt: date.to_string(),
            date_val: date.sort_value(),
            source: source.to_string(),
        })
    }

    /// Build entries for a batch of `(id, century text)` sources.
    ///
    /// Invalid expressions are logged and skipped; a bad record never aborts
    /// the batch.
    pub fn build_all<'a, I>(field: DateField, sources: I) -> Vec<Self>
    where
        I: IntoIterator<Item = (EntityId, &'a str)>,
    {
        let adapter = CenturyDateAdapter::new();
        sources
            .into_iter()
            .filter_map(|(id, source)| {
                let entry = Self::build(&adapter, field, id, source);
                if entry.is_none() {
                    tracing::error!(
                        field = field.code(),
                        target_id = id,
                        source,
                        "Invalid date"
                    );
                }
                entry
            })
            .collect()
    }
}
