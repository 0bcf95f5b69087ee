//! Result rows
//!
//! Executors return [`SqlRow`]s: ordered name/value pairs. Each query shape
//! has an explicit row struct read from them by column name, with `Option`
//! fields for every left-joined column.

use crate::paged::TOTAL_COLUMN;
use crate::sql::SqlValue;
use pinakes_core::{EntityId, LookupResult, PinakesError, PinakesResult};

// ============================================================================
// GENERIC ROW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlRow {
    columns: Vec<(String, SqlValue)>,
}

impl SqlRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
        self.columns.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn value(&self, name: &str) -> PinakesResult<&SqlValue> {
        self.get(name)
            .ok_or_else(|| PinakesError::row_shape(name, "is missing"))
    }

    pub fn get_opt_i32(&self, name: &str) -> PinakesResult<Option<i32>> {
        match self.value(name)? {
            SqlValue::Null => Ok(None),
            SqlValue::Int(v) => Ok(Some(*v)),
            SqlValue::BigInt(v) => i32::try_from(*v)
                .map(Some)
                .map_err(|_| PinakesError::row_shape(name, format!("value {} overflows i32", v))),
            other => Err(PinakesError::row_shape(
                name,
                format!("expected an integer, got {:?}", other),
            )),
        }
    }

    pub fn get_i32(&self, name: &str) -> PinakesResult<i32> {
        self.get_opt_i32(name)?
            .ok_or_else(|| PinakesError::row_shape(name, "is null"))
    }

    pub fn get_i64(&self, name: &str) -> PinakesResult<i64> {
        match self.value(name)? {
            SqlValue::Null => Err(PinakesError::row_shape(name, "is null")),
            value => value.as_i64().ok_or_else(|| {
                PinakesError::row_shape(name, format!("expected an integer, got {:?}", value))
            }),
        }
    }

    pub fn get_opt_string(&self, name: &str) -> PinakesResult<Option<String>> {
        match self.value(name)? {
            SqlValue::Null => Ok(None),
            SqlValue::Text(v) => Ok(Some(v.clone())),
            other => Err(PinakesError::row_shape(
                name,
                format!("expected text, got {:?}", other),
            )),
        }
    }

    /// Reads booleans stored as `BOOLEAN` or as 0/1 integers; null is false.
    pub fn get_bool(&self, name: &str) -> PinakesResult<bool> {
        match self.value(name)? {
            SqlValue::Null => Ok(false),
            SqlValue::Bool(v) => Ok(*v),
            SqlValue::Int(v) => Ok(*v != 0),
            SqlValue::BigInt(v) => Ok(*v != 0),
            other => Err(PinakesError::row_shape(
                name,
                format!("expected a boolean, got {:?}", other),
            )),
        }
    }
}

pub trait FromSqlRow: Sized {
    fn from_row(row: &SqlRow) -> PinakesResult<Self>;
}

/// Read every row, failing on the first malformed one.
pub fn read_rows<T: FromSqlRow>(rows: &[SqlRow]) -> PinakesResult<Vec<T>> {
    rows.iter().map(T::from_row).collect()
}

// ============================================================================
// QUERY SHAPES
// ============================================================================

/// One denormalized row of the author data query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthorRow {
    pub id: EntityId,
    pub name: String,
    pub century: Option<String>,
    pub dates: Option<String>,
    pub note: Option<String>,
    pub is_category: bool,
    pub alias: Option<String>,
    pub keyword_id: Option<EntityId>,
    pub keyword_value: Option<String>,
}

impl FromSqlRow for AuthorRow {
    fn from_row(row: &SqlRow) -> PinakesResult<Self> {
        Ok(Self {
            id: row.get_i32("id")?,
            name: row.get_opt_string("name")?.unwrap_or_default(),
            century: row.get_opt_string("century")?,
            dates: row.get_opt_string("dates")?,
            note: row.get_opt_string("note")?,
            is_category: row.get_bool("is_category")?,
            alias: row.get_opt_string("alias")?,
            keyword_id: row.get_opt_i32("keyword_id")?,
            keyword_value: row.get_opt_string("keyword_value")?,
        })
    }
}

/// One denormalized row of the work data query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkRow {
    pub id: EntityId,
    pub title: String,
    pub titulus: Option<String>,
    pub century: Option<String>,
    pub dates: Option<String>,
    pub place: Option<String>,
    pub note: Option<String>,
    pub author_id: Option<EntityId>,
    pub author_name: Option<String>,
    pub author_role_id: Option<EntityId>,
    pub author_role: Option<String>,
    pub keyword_id: Option<EntityId>,
    pub keyword_value: Option<String>,
}

impl FromSqlRow for WorkRow {
    fn from_row(row: &SqlRow) -> PinakesResult<Self> {
        Ok(Self {
            id: row.get_i32("id")?,
            title: row.get_opt_string("title")?.unwrap_or_default(),
            titulus: row.get_opt_string("titulus")?,
            century: row.get_opt_string("century")?,
            dates: row.get_opt_string("dates")?,
            place: row.get_opt_string("place")?,
            note: row.get_opt_string("note")?,
            author_id: row.get_opt_i32("author_id")?,
            author_name: row.get_opt_string("author_name")?,
            author_role_id: row.get_opt_i32("author_role_id")?,
            author_role: row.get_opt_string("author_role")?,
            keyword_id: row.get_opt_i32("keyword_id")?,
            keyword_value: row.get_opt_string("keyword_value")?,
        })
    }
}

/// A work data row with the detail-only columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkDetailRow {
    pub work: WorkRow,
    pub incipit: Option<String>,
    pub desinit: Option<String>,
    pub dates_note: Option<String>,
    pub place_note: Option<String>,
    pub manager: Option<String>,
    pub team: Option<String>,
}

impl FromSqlRow for WorkDetailRow {
    fn from_row(row: &SqlRow) -> PinakesResult<Self> {
        Ok(Self {
            work: WorkRow::from_row(row)?,
            incipit: row.get_opt_string("incipit")?,
            desinit: row.get_opt_string("desinit")?,
            dates_note: row.get_opt_string("dates_note")?,
            place_note: row.get_opt_string("place_note")?,
            manager: row.get_opt_string("manager")?,
            team: row.get_opt_string("team")?,
        })
    }
}

/// The single row of a count query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountRow {
    pub total: i64,
}

impl FromSqlRow for CountRow {
    fn from_row(row: &SqlRow) -> PinakesResult<Self> {
        Ok(Self {
            total: row.get_i64(TOTAL_COLUMN)?,
        })
    }
}

impl FromSqlRow for LookupResult {
    fn from_row(row: &SqlRow) -> PinakesResult<Self> {
        Ok(Self {
            id: row.get_i32("id")?,
            value: row.get_opt_string("value")?.unwrap_or_default(),
        })
    }
}
