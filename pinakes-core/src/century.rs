//! Century expression adapter
//!
//! Catalog records carry their dating as free-text century notations such
//! as `"09"`, `"12 in."`, `"11 ex"`, `"12 (1/2)"` or `"11-12"`. The adapter
//! turns them into a [`HistoricalDate`]. Explicit years (any four-digit
//! numeral) are outside its scope and yield `None`.

use crate::chronology::{Datation, HistoricalDate};
use once_cell::sync::Lazy;
use regex::Regex;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("valid year regex"));

// v = century, ie = in/ex, fn/fd = fraction numerator/denominator
static CENTURY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\s*(?P<v>\d{1,2})\s*(?:(?:(?P<ie>in|ex)\.?)|(?:\((?P<fn>[1-4])/(?P<fd>[1-4])\)))?",
    )
    .expect("valid century regex")
});

/// Offset of an "initial" (`in`) point inside its century.
const INITIAL_OFFSET: i32 = 10;
/// Offset of a "final" (`ex`) point inside its century.
const FINAL_OFFSET: i32 = 90;

/// Parses century expressions into historical dates.
#[derive(Debug, Clone, Copy, Default)]
pub struct CenturyDateAdapter;

impl CenturyDateAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Parse `text` into a date.
    ///
    /// At most the first two century occurrences are used: one yields a
    /// single point, two yield a start/end range.
    pub fn parse(&self, text: Option<&str>) -> Option<HistoricalDate> {
        let text = text?;
        if text.is_empty() || YEAR_RE.is_match(text) {
            return None;
        }

        let mut points: Vec<Datation> = Vec::with_capacity(2);
        for caps in CENTURY_RE.captures_iter(text) {
            let Some(century) = caps.name("v").and_then(|m| m.as_str().parse::<i32>().ok())
            else {
                continue;
            };
            let base = (century - 1) * 100;

            let point = if let Some(ie) = caps.name("ie") {
                let offset = if ie.as_str().eq_ignore_ascii_case("in") {
                    INITIAL_OFFSET
                } else {
                    FINAL_OFFSET
                };
                Datation::approximate_year(base + offset)
            } else if let (Some(num), Some(den)) = (
                caps.name("fn").and_then(|m| m.as_str().parse::<i32>().ok()),
                caps.name("fd").and_then(|m| m.as_str().parse::<i32>().ok()),
            ) {
                // midpoint of the lower part of the n-th slice, truncated
                let slice = 100 / den;
                Datation::approximate_year(base + slice * num / 2)
            } else {
                Datation::century(century)
            };

            points.push(point);
            if points.len() == 2 {
                break;
            }
        }

        match points.as_slice() {
            [] => None,
            [single] => Some(HistoricalDate::single(*single)),
            [start, end, ..] => Some(HistoricalDate::range(*start, *end)),
        }
    }

    /// Convenience for non-optional input.
    pub fn parse_str(&self, text: &str) -> Option<HistoricalDate> {
        self.parse(Some(text))
    }
}

/// Convert a user-facing century bound into the year value stored in the
/// date index.
///
/// For `century >= 0` the minimum is the first year of the previous
/// hundred (`(c-1)*100`) and the maximum adds 99. For negative centuries
/// the base is `(c-1)*-100` and the maximum subtracts 99; the sign handling
/// there is asymmetric and is kept as the index expects it.
pub fn threshold_value(century: i32, is_max: bool) -> i32 {
    if century < 0 {
        let base = (century - 1) * -100;
        if is_max {
            base - 99
        } else {
            base
        }
    } else {
        let base = (century - 1) * 100;
        if is_max {
            base + 99
        } else {
            base
        }
    }
}
