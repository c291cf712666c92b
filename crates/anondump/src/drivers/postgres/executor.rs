//! PostgreSQL query executor.
//!
//! Implements [`QueryExecutor`] over a deadpool-postgres pool. Statements are
//! prepared without declared parameter types; each bound [`SqlValue`] is then
//! encoded for the type the server inferred, so values are never rendered
//! into the SQL text.

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::types::ToSql;
use tokio_postgres::Config as PgConfig;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::core::result::ResultSet;
use crate::core::traits::{Dialect, QueryExecutor};
use crate::core::value::SqlValue;
use crate::error::{DumpError, Result};

use super::dialect::PostgresDialect;
use super::types::{BoundParam, PgValue};

/// PostgreSQL executor.
///
/// The selector issues one statement at a time, so a pool of size 1 is enough;
/// a shared pool can be passed in with [`PostgresExecutor::new`].
pub struct PostgresExecutor {
    pool: Pool,
    dialect: PostgresDialect,
}

impl PostgresExecutor {
    /// Wrap an existing pool.
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            dialect: PostgresDialect::new(),
        }
    }

    /// Create a single-connection pool from configuration and test it.
    ///
    /// Connects without TLS; callers needing TLS build their own pool and use
    /// [`PostgresExecutor::new`].
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut pg_config = PgConfig::new();
        pg_config.host(&config.host);
        pg_config.port(config.port);
        pg_config.dbname(&config.database);
        pg_config.user(&config.user);
        pg_config.password(&config.password);

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, tokio_postgres::NoTls, mgr_config);
        let pool = Pool::builder(mgr)
            .max_size(1)
            .build()
            .map_err(|e| DumpError::pool(e, "creating PostgreSQL pool"))?;

        let client = pool
            .get()
            .await
            .map_err(|e| DumpError::pool(e, "testing PostgreSQL connection"))?;
        client.simple_query("SELECT 1").await?;

        info!(
            "Connected to PostgreSQL source: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl QueryExecutor for PostgresExecutor {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    async fn query(&self, sql: &str, params: &[SqlValue<'static>]) -> Result<ResultSet> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| DumpError::pool(e, "getting connection for query"))?;

        let bound: Vec<BoundParam<'_>> = params.iter().map(BoundParam).collect();
        let refs: Vec<&(dyn ToSql + Sync)> =
            bound.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let statement = client.prepare(sql).await?;
        let rows = client.query(&statement, &refs).await?;

        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut result_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            result_rows.push(convert_pg_row(row, &columns)?);
        }

        debug!("Query returned {} rows", result_rows.len());
        Ok(ResultSet::new(columns, result_rows))
    }
}

/// Read every column of a row. A value that cannot be decoded fails the query.
fn convert_pg_row(row: &tokio_postgres::Row, columns: &[String]) -> Result<Vec<SqlValue<'static>>> {
    columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            row.try_get::<_, PgValue>(idx)
                .map(|value| value.0)
                .map_err(|source| DumpError::Decode {
                    column: column.clone(),
                    source,
                })
        })
        .collect()
}
