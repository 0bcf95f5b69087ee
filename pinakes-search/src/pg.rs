//! PostgreSQL executor
//!
//! Pooled connections via deadpool-postgres. Queries are compiled for the
//! Postgres dialect and run with bound parameters; result columns are
//! converted to [`SqlValue`]s by their declared type.

use crate::config::DatabaseConfig;
use crate::executor::QueryExecutor;
use crate::rows::SqlRow;
use crate::sql::{Compiler, Dialect, Query, SqlValue};
use async_trait::async_trait;
use bytes::BytesMut;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use pinakes_core::{PinakesError, PinakesResult};
use std::error::Error;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};
use tokio_postgres::{NoTls, Row};

// ============================================================================
// POOL
// ============================================================================

/// Build a lazily connecting pool for the catalog database.
pub fn create_pool(config: &DatabaseConfig) -> PinakesResult<Pool> {
    let mut pg = tokio_postgres::Config::new();
    pg.host(&config.host)
        .port(config.port)
        .dbname(&config.dbname)
        .user(&config.user)
        .password(&config.password);

    let manager = Manager::from_config(
        pg,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );
    Pool::builder(manager)
        .max_size(config.pool_size)
        .wait_timeout(Some(config.wait_timeout))
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| {
            PinakesError::database(format!("cannot build pool for {}: {}", config.dbname, e))
        })
}

// ============================================================================
// PARAMETERS AND ROWS
// ============================================================================

/// NULL for a parameter of whatever type the server inferred.
#[derive(Debug)]
struct NullParam;

impl ToSql for NullParam {
    fn to_sql(
        &self,
        _ty: &Type,
        _out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        Ok(IsNull::Yes)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

impl SqlValue {
    /// Borrow this value as a tokio-postgres parameter.
    pub fn as_to_sql(&self) -> &(dyn ToSql + Sync) {
        match self {
            SqlValue::Null => &NullParam,
            SqlValue::Int(v) => v,
            SqlValue::BigInt(v) => v,
            SqlValue::Float(v) => v,
            SqlValue::Text(v) => v,
            SqlValue::Bool(v) => v,
        }
    }
}

fn convert_row(row: &Row) -> PinakesResult<SqlRow> {
    let mut out = SqlRow::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let name = column.name();
        let shape = |e: tokio_postgres::Error| PinakesError::row_shape(name, e.to_string());
        let ty = column.type_();
        let value = if *ty == Type::INT2 {
            SqlValue::from(row.try_get::<_, Option<i16>>(idx).map_err(shape)?.map(i32::from))
        } else if *ty == Type::INT4 {
            SqlValue::from(row.try_get::<_, Option<i32>>(idx).map_err(shape)?)
        } else if *ty == Type::INT8 {
            SqlValue::from(row.try_get::<_, Option<i64>>(idx).map_err(shape)?)
        } else if *ty == Type::FLOAT4 {
            SqlValue::from(row.try_get::<_, Option<f32>>(idx).map_err(shape)?.map(f64::from))
        } else if *ty == Type::FLOAT8 {
            SqlValue::from(row.try_get::<_, Option<f64>>(idx).map_err(shape)?)
        } else if *ty == Type::BOOL {
            SqlValue::from(row.try_get::<_, Option<bool>>(idx).map_err(shape)?)
        } else if [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME].contains(ty) {
            SqlValue::from(row.try_get::<_, Option<String>>(idx).map_err(shape)?)
        } else {
            return Err(PinakesError::row_shape(
                name,
                format!("has unsupported type {}", ty),
            ));
        };
        out.push(name, value);
    }
    Ok(out)
}

// ============================================================================
// EXECUTOR
// ============================================================================

/// Runs queries on a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgExecutor {
    pool: Pool,
}

impl PgExecutor {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn connect(config: &DatabaseConfig) -> PinakesResult<Self> {
        Ok(Self::new(create_pool(config)?))
    }
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn fetch(&self, query: &Query) -> PinakesResult<Vec<SqlRow>> {
        let compiled = Compiler::new(Dialect::Postgres).compile(query);
        let params: Vec<&(dyn ToSql + Sync)> =
            compiled.params.iter().map(SqlValue::as_to_sql).collect();

        let client = self.pool.get().await?;
        let rows = client.query(compiled.sql.as_str(), &params).await?;
        tracing::trace!(rows = rows.len(), "Fetched rows");
        rows.iter().map(convert_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_pool_is_lazy() {
        // no connection is attempted until the first checkout
        let pool = create_pool(&DatabaseConfig::default()).unwrap();
        assert_eq!(pool.status().max_size, DatabaseConfig::default().pool_size);
    }

    #[test]
    fn test_null_binds_to_any_type() {
        let null = SqlValue::Null;
        for ty in [Type::TEXT, Type::INT4, Type::INT8, Type::BOOL] {
            let mut buf = BytesMut::new();
            let written = null.as_to_sql().to_sql_checked(&ty, &mut buf).unwrap();
            assert!(matches!(written, IsNull::Yes));
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn test_text_rejects_integer_column() {
        let text = SqlValue::Text("beda".to_string());
        let mut buf = BytesMut::new();
        assert!(text.as_to_sql().to_sql_checked(&Type::INT4, &mut buf).is_err());
    }
}
