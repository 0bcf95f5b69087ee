//! Text scope field codes
//!
//! Each code names one indexed text field; codes are the values stored in
//! the occurrence table's `field` column.

use pinakes_core::{EntityKind, PinakesError, PinakesResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldCode {
    AuthorName,
    AuthorAlias,
    AuthorNote,
    WorkTitle,
    WorkAliasTitle,
    WorkTitulus,
    WorkIncipit,
    WorkDesinit,
    WorkPlace,
    WorkNote,
}

const ALL_CODES: [FieldCode; 10] = [
    FieldCode::AuthorName,
    FieldCode::AuthorAlias,
    FieldCode::AuthorNote,
    FieldCode::WorkTitle,
    FieldCode::WorkAliasTitle,
    FieldCode::WorkTitulus,
    FieldCode::WorkIncipit,
    FieldCode::WorkDesinit,
    FieldCode::WorkPlace,
    FieldCode::WorkNote,
];

impl FieldCode {
    pub fn code(&self) -> &'static str {
        match self {
            FieldCode::AuthorName => "aunam",
            FieldCode::AuthorAlias => "aanam",
            FieldCode::AuthorNote => "aunot",
            FieldCode::WorkTitle => "wkttl",
            FieldCode::WorkAliasTitle => "wattl",
            FieldCode::WorkTitulus => "wktit",
            FieldCode::WorkIncipit => "wkinc",
            FieldCode::WorkDesinit => "wkdes",
            FieldCode::WorkPlace => "wkplc",
            FieldCode::WorkNote => "wknot",
        }
    }

    /// The entity kind whose records carry this field.
    pub fn entity(&self) -> EntityKind {
        match self {
            FieldCode::AuthorName | FieldCode::AuthorAlias | FieldCode::AuthorNote => {
                EntityKind::Author
            }
            _ => EntityKind::Work,
        }
    }

    pub fn all() -> &'static [FieldCode] {
        &ALL_CODES
    }
}

impl fmt::Display for FieldCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for FieldCode {
    type Err = PinakesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        ALL_CODES
            .iter()
            .copied()
            .find(|f| f.code() == code)
            .ok_or_else(|| PinakesError::UnknownFieldCode {
                code: s.trim().to_string(),
                entity: "any".to_string(),
            })
    }
}

/// Fields searched when a request names none.
pub fn default_scope(kind: EntityKind) -> Vec<FieldCode> {
    match kind {
        EntityKind::Author => vec![FieldCode::AuthorName, FieldCode::AuthorAlias],
        EntityKind::Work => vec![FieldCode::WorkTitle, FieldCode::WorkAliasTitle],
    }
}

/// Split a comma-delimited scope such as `"aunam, aanam"`.
pub fn parse_scope_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve requested codes for `kind`.
///
/// Empty input yields the default scope. Duplicates are dropped keeping the
/// first occurrence. A code that is unknown, or that belongs to another
/// entity kind, is rejected.
pub fn resolve_scope(kind: EntityKind, codes: &[String]) -> PinakesResult<Vec<FieldCode>> {
    let mut fields: Vec<FieldCode> = Vec::with_capacity(codes.len());
    for raw in codes {
        let field = raw
            .parse::<FieldCode>()
            .ok()
            .filter(|f| f.entity() == kind)
            .ok_or_else(|| PinakesError::UnknownFieldCode {
                code: raw.trim().to_string(),
                entity: kind.name().to_string(),
            })?;
        if !fields.contains(&field) {
            fields.push(field);
        }
    }
    if fields.is_empty() {
        return Ok(default_scope(kind));
    }
    Ok(fields)
}
