//! Historical date model
//!
//! A historical date is either a single point or a start/end pair of
//! points. Each point ([`Datation`]) carries a signed value (negative for
//! BC), a flag telling whether the value is a century or a year, and an
//! approximation flag.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single point in time with century or year granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Datation {
    /// Century number or year; negative values are BC.
    pub value: i32,
    /// True when `value` is a century number rather than a year.
    pub is_century: bool,
    /// True for "circa" points.
    pub is_approximate: bool,
}

impl Datation {
    /// An exact century point.
    pub fn century(value: i32) -> Self {
        Self {
            value,
            is_century: true,
            is_approximate: false,
        }
    }

    /// An approximate year point.
    pub fn approximate_year(value: i32) -> Self {
        Self {
            value,
            is_century: false,
            is_approximate: true,
        }
    }

    /// An exact year point.
    pub fn year(value: i32) -> Self {
        Self {
            value,
            is_century: false,
            is_approximate: false,
        }
    }

    /// Numeric value used to sort and range-filter dates.
    ///
    /// Century points sort at the middle of their century, so that a
    /// century filter built from [`crate::threshold_value`] brackets them.
    pub fn sort_value(&self) -> f64 {
        if !self.is_century {
            return f64::from(self.value);
        }
        if self.value >= 0 {
            f64::from(self.value * 100 - 50)
        } else {
            f64::from(self.value * 100 + 50)
        }
    }
}

impl fmt::Display for Datation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_approximate {
            f.write_str("c. ")?;
        }
        let era = if self.value < 0 { "BC" } else { "AD" };
        let magnitude = self.value.unsigned_abs();
        if self.is_century {
            match to_roman(magnitude) {
                Some(roman) => write!(f, "{} {}", roman, era),
                None => write!(f, "{} {}", magnitude, era),
            }
        } else {
            write!(f, "{} {}", magnitude, era)
        }
    }
}

/// A historical date: a single point or a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HistoricalDate {
    Point(Datation),
    Range { start: Datation, end: Datation },
}

impl HistoricalDate {
    pub fn single(point: Datation) -> Self {
        HistoricalDate::Point(point)
    }

    pub fn range(start: Datation, end: Datation) -> Self {
        HistoricalDate::Range { start, end }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, HistoricalDate::Range { .. })
    }

    /// The single point, or the start of a range.
    pub fn start(&self) -> Datation {
        match self {
            HistoricalDate::Point(point) => *point,
            HistoricalDate::Range { start, .. } => *start,
        }
    }

    /// The end of a range; `None` for single points.
    pub fn end(&self) -> Option<Datation> {
        match self {
            HistoricalDate::Point(_) => None,
            HistoricalDate::Range { end, .. } => Some(*end),
        }
    }

    /// Value stored in the date index: the point's value, or the mean of a
    /// range's endpoints.
    pub fn sort_value(&self) -> f64 {
        match self {
            HistoricalDate::Point(point) => point.sort_value(),
            HistoricalDate::Range { start, end } => (start.sort_value() + end.sort_value()) / 2.0,
        }
    }
}

impl fmt::Display for HistoricalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoricalDate::Point(point) => write!(f, "{}", point),
            HistoricalDate::Range { start, end } => write!(f, "{} -- {}", start, end),
        }
    }
}

fn to_roman(mut n: u32) -> Option<String> {
    const NUMERALS: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    if n == 0 {
        return None;
    }
    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    Some(out)
}
