//! Query execution seam
//!
//! The engine builds query trees; an executor renders them for its dialect,
//! runs them and returns rows. [`crate::pg::PgExecutor`] runs them against
//! PostgreSQL; tests use an in-memory executor.

use crate::rows::SqlRow;
use crate::sql::{Dialect, Query};
use async_trait::async_trait;
use pinakes_core::PinakesResult;
use std::sync::Arc;

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// The dialect this executor renders queries in. Its capabilities decide
    /// how the identifier query is combined.
    fn dialect(&self) -> Dialect;

    /// Run a read-only query and return all its rows.
    async fn fetch(&self, query: &Query) -> PinakesResult<Vec<SqlRow>>;
}

#[async_trait]
impl<E: QueryExecutor + ?Sized> QueryExecutor for Arc<E> {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    async fn fetch(&self, query: &Query) -> PinakesResult<Vec<SqlRow>> {
        (**self).fetch(query).await
    }
}
