//! `PostgreSQL` connection pool shared by the Diesel adapters.
//!
//! Both [`crate::machinery::adapters::postgres`] and
//! [`crate::work_order::adapters::postgres`] take a [`PgPool`]; one pool
//! built by [`connect`] serves them all.

use crate::config::DatabaseSettings;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use thiserror::Error;
use tracing::info;

/// Pool of `PostgreSQL` connections.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Errors raised while opening the connection pool.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// No connection URL is configured.
    #[error("database.url is not set")]
    MissingUrl,

    /// The pool could not establish its initial connections.
    #[error("failed to open database pool: {0}")]
    Pool(#[from] PoolError),
}

/// Opens a pool sized by `settings.pool_size` against `settings.url`.
///
/// # Errors
///
/// Returns [`DatabaseError::MissingUrl`] without a URL and
/// [`DatabaseError::Pool`] when the database cannot be reached.
pub fn connect(settings: &DatabaseSettings) -> Result<PgPool, DatabaseError> {
    let url = settings
        .url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .ok_or(DatabaseError::MissingUrl)?;
    let pool = Pool::builder()
        .max_size(settings.pool_size)
        .build(ConnectionManager::<PgConnection>::new(url))?;
    info!(pool_size = settings.pool_size, "database pool opened");
    Ok(pool)
}
