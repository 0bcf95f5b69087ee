//! Per-entity predicate builders
//!
//! An [`EntityQueryBuilder`] knows one entity kind's table, the non-text
//! filters of its request, and the columns of its data query. The shared
//! token and paging logic lives in [`crate::paged::PagedQueryBuilder`],
//! which is generic over this trait.

mod author;
mod work;

pub use author::AuthorQueryBuilder;
pub use work::WorkQueryBuilder;

use crate::request::TextBasedRequest;
use crate::schema;
use crate::scope::{resolve_scope, FieldCode};
use crate::sql::{Column, CompareOp, Condition, Query, Source};
use pinakes_core::{threshold_value, DateField, EntityKind, PinakesResult};

pub trait EntityQueryBuilder: Send + Sync {
    type Request: TextBasedRequest + Send + Sync;

    fn kind(&self) -> EntityKind;

    /// The entity's primary table.
    fn table(&self) -> &'static str;

    /// Column of the primary table results are sorted by.
    fn sort_column(&self) -> &'static str;

    /// Output name of [`Self::sort_column`] in the data query.
    fn sort_key(&self) -> &'static str;

    /// Query selecting the distinct ids of entities passing the request's
    /// non-text filters. The primary table is aliased `t{ordinal}`.
    fn non_text_query(&self, request: &Self::Request, ordinal: usize) -> Query;

    /// The occurrence fields text tokens may match.
    fn fields(&self, request: &Self::Request) -> PinakesResult<Vec<FieldCode>> {
        resolve_scope(self.kind(), &request.text_request().text_scope)
    }

    /// Select the scalar columns of the primary table aliased `alias`.
    fn scalar_columns(&self, query: Query, alias: &str) -> Query;

    /// Select the extra scalar columns shown only by detail lookups.
    fn detail_columns(&self, query: Query, _alias: &str) -> Query {
        query
    }

    /// Left-join the one-to-many tables onto the page aliased `page` and
    /// select the page's columns followed by the related ones.
    fn related_columns(&self, query: Query, page: &str, detail: bool) -> Query;
}

/// Alias of the primary table in the subquery numbered `ordinal`.
pub fn table_alias(ordinal: usize) -> String {
    format!("t{}", ordinal)
}

/// Base of every non-text query: `SELECT DISTINCT t{n}.id FROM table AS t{n}`.
pub(crate) fn base_query(table: &str, alias: &str) -> Query {
    Query::from_aliased(table, alias)
        .select(Column::new(alias, "id"))
        .distinct()
}

/// Restrict `query` to entities whose indexed date falls within the century
/// bounds. A zero bound is ignored.
pub(crate) fn century_filter(
    query: Query,
    alias: &str,
    field: DateField,
    century_min: i32,
    century_max: i32,
) -> Query {
    if century_min == 0 && century_max == 0 {
        return query;
    }
    let date_val = Column::new(schema::DATES, "date_val");
    let mut query = query
        .join_once(
            Source::table(schema::DATES),
            Column::new(alias, "id"),
            Column::new(schema::DATES, "target_id"),
        )
        .filter(Condition::eq(Column::new(schema::DATES, "field"), field.code()));
    if century_min != 0 {
        let min = f64::from(threshold_value(century_min, false));
        query = query.filter(Condition::compare(date_val.clone(), CompareOp::Ge, min));
    }
    if century_max != 0 {
        let max = f64::from(threshold_value(century_max, true));
        query = query.filter(Condition::compare(date_val, CompareOp::Le, max));
    }
    query
}
