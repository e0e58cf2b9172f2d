use std::sync::Arc;

use diesel::sql_types::Integer;
use diesel_async::pooled_connection::deadpool::{BuildError, Pool, PoolError};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use thiserror::Error;

use crate::store::{MemoryStore, PgStore, Store};

pub type PgPool = Pool<AsyncPgConnection>;

/// `DATABASE_URL` value that selects the in-process store.
pub const MEMORY_URL: &str = "memory://";

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("failed to build connection pool: {0}")]
    Build(#[from] BuildError),
    #[error("failed to check out a connection: {0}")]
    Pool(#[from] PoolError),
    #[error("database test query failed: {0}")]
    Query(#[from] diesel::result::Error),
}

pub fn init_pg_pool(database_url: &str) -> Result<PgPool, BuildError> {
    let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    Pool::builder(config).build()
}

/// Builds the store named by `database_url`. A PostgreSQL pool is checked with a test query
/// before it is handed out.
pub async fn connect(database_url: &str) -> Result<Arc<dyn Store>, ConnectError> {
    if database_url == MEMORY_URL {
        log::warn!("using the in-memory store; nothing will survive a restart");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let pool = init_pg_pool(database_url)?;
    let mut conn = pool.get().await?;
    let test_query: i32 = diesel::select(diesel::dsl::sql::<Integer>("1"))
        .get_result(&mut conn)
        .await?;
    log::info!("database test query result: {test_query}");
    drop(conn);

    Ok(Arc::new(PgStore::new(pool)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_url_selects_the_in_process_store() {
        let store = connect(MEMORY_URL).await.unwrap();
        assert_eq!(store.count_admins().await.unwrap(), 0);
    }
}
