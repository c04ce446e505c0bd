use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Executor, Pool, Sqlite, SqliteConnection};
use tracing::{info, instrument};

use super::schema::{
    CURRENT_SCHEMA, DEFAULT_CATEGORIES, DEMO_USER_EMAIL, DEMO_USER_NAME, DEMO_USER_PASSWORD,
};
use crate::env::AppConfig;
use crate::error::AppError;

/// Which tables were found empty and filled during [`init_database`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedOutcome {
    pub users_seeded: bool,
    pub categories_seeded: bool,
}

/// Foreign keys are declared in the schema but not enforced: a task may keep
/// pointing at a category that has since been removed.
pub fn connect_options(database_url: &str) -> Result<SqliteConnectOptions, AppError> {
    Ok(SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(false))
}

#[instrument(skip(config), fields(database_url = %config.database_url))]
pub async fn connect(config: &AppConfig) -> Result<Pool<Sqlite>, AppError> {
    info!("Connecting to SQLite database");
    let pool = SqlitePoolOptions::new()
        .connect_with(connect_options(&config.database_url)?)
        .await?;

    Ok(pool)
}

/// Creates any missing tables, then seeds each seedable table that is empty.
///
/// Seeding is keyed on row counts alone, so a table that was emptied by hand
/// is filled again on the next call.
#[instrument(skip_all)]
pub async fn init_database(pool: &Pool<Sqlite>, config: &AppConfig) -> Result<SeedOutcome, AppError> {
    info!("Ensuring database schema");
    let mut tx = pool.begin().await?;

    (&mut *tx).execute(sqlx::raw_sql(CURRENT_SCHEMA)).await?;

    let outcome = SeedOutcome {
        users_seeded: seed_users(&mut *tx, config.password_hash_cost).await?,
        categories_seeded: seed_categories(&mut *tx).await?,
    };

    tx.commit().await?;

    info!(
        users_seeded = outcome.users_seeded,
        categories_seeded = outcome.categories_seeded,
        "Database ready"
    );
    Ok(outcome)
}

async fn count_rows(conn: &mut SqliteConnection, table: &str) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(&mut *conn)
        .await?;

    Ok(count)
}

async fn seed_users(conn: &mut SqliteConnection, hash_cost: u32) -> Result<bool, AppError> {
    if count_rows(conn, "users").await? > 0 {
        return Ok(false);
    }

    info!("Seeding demo user");
    let hashed_password = bcrypt::hash(DEMO_USER_PASSWORD, hash_cost)?;

    sqlx::query("INSERT INTO users (name, email, password) VALUES (?, ?, ?)")
        .bind(DEMO_USER_NAME)
        .bind(DEMO_USER_EMAIL)
        .bind(hashed_password)
        .execute(&mut *conn)
        .await?;

    Ok(true)
}

async fn seed_categories(conn: &mut SqliteConnection) -> Result<bool, AppError> {
    if count_rows(conn, "categories").await? > 0 {
        return Ok(false);
    }

    info!("Seeding default categories");
    for (name, color) in DEFAULT_CATEGORIES {
        sqlx::query("INSERT INTO categories (name, color) VALUES (?, ?)")
            .bind(name)
            .bind(color)
            .execute(&mut *conn)
            .await?;
    }

    Ok(true)
}
