//! Storage for the pet-travel CRM.
//!
//! Handlers talk to a [`Store`] trait object; two backends implement it:
//! - [`PgStore`]: PostgreSQL via sqlx, with embedded migrations.
//! - [`MemoryStore`]: process-local tables, for tests and demos.
//!
//! Both backends apply a quote update and any resulting promotion atomically.

mod error;
mod memory;
mod pg;
mod store;

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use pg::PgStore;
pub use store::{QuoteUpdated, Store};

pub const ENV_DB_URL: &str = "CRM_DATABASE_URL";

/// Unique constraint names shared by both backends so conflicts read the same.
pub const UQ_QUOTE_NUMBER: &str = "uq_quotes_quote_number";
pub const UQ_ORDER_NUMBER: &str = "uq_orders_order_number";

/// Connect to Postgres using the URL in `env_var`.
pub async fn connect_from_env(env_var: &str, max_connections: u32) -> Result<PgPool> {
    let url = std::env::var(env_var).with_context(|| format!("missing env var {env_var}"))?;
    connect(&url, max_connections).await
}

pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

/// Pool for DB-backed tests: connects via `CRM_DATABASE_URL` and migrates.
pub async fn testkit_db_pool() -> Result<PgPool> {
    let pool = connect_from_env(ENV_DB_URL, 2).await?;
    migrate(&pool).await?;
    Ok(pool)
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_quotes_table: bool,
}

/// Connectivity + schema presence.
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;

    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema = 'public' and table_name = 'quotes'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok: one == 1,
        has_quotes_table: exists,
    })
}
