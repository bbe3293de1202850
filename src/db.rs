use std::env;

use anyhow::{Context, Result};
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::catalog;

/// Connects to the Postgres instance named by `DATABASE_URL` and prepares
/// the schema and seed data.
pub async fn connect() -> Result<PgPool> {
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL env var is missing")?;
    connect_to(&database_url).await
}

/// Same as `connect` but with an explicit connection string.
pub async fn connect_to(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run database migrations")?;

    catalog::ensure_seeded(&pool)
        .await
        .context("failed to seed the genre catalog")?;

    Ok(pool)
}
