//! Pinakes Search - Catalog Search Engine
//!
//! Compiles author and work search requests into SQL and consolidates the
//! returned rows into result pages:
//! - text normalization and operator-prefixed tokens
//! - per-token subqueries over the inverted text index, combined with
//!   UNION / INTERSECT (or a CTE join where INTERSECT is missing)
//! - paged data and count queries
//! - consolidation of denormalized rows into results
//! - keyword and relation type lookups
//!
//! Queries are built as trees ([`sql::Query`]) and rendered per
//! [`sql::Dialect`]. A [`QueryExecutor`] runs them; [`PgExecutor`] does so
//! over a deadpool-postgres pool.

pub mod combine;
pub mod config;
pub mod consolidate;
pub mod executor;
pub mod lookup;
pub mod paged;
pub mod pg;
pub mod predicate;
pub mod request;
pub mod results;
pub mod rows;
pub mod schema;
pub mod scope;
pub mod searcher;
pub mod sql;
pub mod text;
pub mod token;

pub use combine::{combine, IdentifierQuery};
pub use config::{DatabaseConfig, SearchConfig};
pub use consolidate::{consolidate, flatten, Consolidate};
pub use executor::QueryExecutor;
pub use lookup::{keyword_query, relation_type_query};
pub use paged::{PagedQueryBuilder, SearchQueries, TOTAL_COLUMN};
pub use pg::{create_pool, PgExecutor};
pub use predicate::{AuthorQueryBuilder, EntityQueryBuilder, WorkQueryBuilder};
pub use request::{
    AuthorSearchRequest, LookupRequest, TextBasedRequest, TextRequest, WorkSearchRequest,
};
pub use results::{AuthorResult, WorkDetailResult, WorkResult, WorkResultAuthor};
pub use rows::{read_rows, AuthorRow, CountRow, FromSqlRow, SqlRow, WorkDetailRow, WorkRow};
pub use scope::{default_scope, resolve_scope, FieldCode};
pub use searcher::Searcher;
pub use text::{
    CompositeTextFilter, LowercaseTextFilter, StandardTextFilter, TextFilter, WhitespaceTextFilter,
};
pub use token::{Token, TokenOperator, TokenParser};
