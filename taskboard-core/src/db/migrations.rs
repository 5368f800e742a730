/// Database migration runner
///
/// This module provides utilities for running and managing database migrations
/// using sqlx's migration system, and for checking that a live database
/// carries every table, column and foreign key the entity layer relies on.
///
/// # Migration Files
///
/// Migrations are stored in the crate's `migrations/` directory, one
/// `{timestamp}_{name}.sql` file per table, applied leaf-first: users,
/// statuses, tags, tasks, task_tags.
///
/// # Example
///
/// ```no_run
/// use taskboard_core::db::pool::{create_pool, DatabaseConfig};
/// use taskboard_core::db::migrations::{run_migrations, verify_schema};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     run_migrations(&pool).await?;
///
///     let missing = verify_schema(&pool).await?;
///     assert!(missing.is_empty());
///     Ok(())
/// }
/// ```

use crate::models::schema::schema;
use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{debug, info, warn};

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Number of migrations that have been applied
    pub applied_migrations: usize,

    /// Latest applied migration version (timestamp)
    pub latest_version: Option<i64>,
}

/// Runs all pending database migrations
///
/// # Errors
///
/// Returns an error if a migration file is malformed or fails to execute.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    let migrations = sqlx::migrate!("./migrations");

    match migrations.run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}

/// Gets the current migration status
///
/// A database that was never migrated reports zero applied migrations.
pub async fn get_migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    debug!("Checking migration status");

    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public'
            AND table_name = '_sqlx_migrations'
        )",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        debug!("Migrations table does not exist yet");
        return Ok(MigrationStatus {
            applied_migrations: 0,
            latest_version: None,
        });
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT
            COUNT(*) as count,
            MAX(version) as latest_version
         FROM _sqlx_migrations
         WHERE success = true",
    )
    .fetch_one(pool)
    .await?;

    debug!(
        applied_migrations = count,
        latest_version = ?latest_version,
        "Migration status retrieved"
    );

    Ok(MigrationStatus {
        applied_migrations: count as usize,
        latest_version,
    })
}

/// Creates the database if it doesn't exist
///
/// Meant for development and test setups.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    info!("Checking if database exists");

    if !Postgres::database_exists(database_url).await? {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
        info!("Database created successfully");
    } else {
        debug!("Database already exists");
    }

    Ok(())
}

/// `table.column` pairs the entity layer needs: declared columns first, then
/// the foreign keys of every association on the table that carries them
pub fn expected_columns() -> Vec<(&'static str, &'static str)> {
    let schema = schema();
    let mut expected = Vec::new();

    for entity in schema.entities() {
        for column in entity.columns {
            expected.push((entity.table, *column));
        }
    }

    for association in schema.associations() {
        if let Some(owner) = schema.entity(association.key_owner()) {
            let pair = (owner.table, association.foreign_key);
            if !expected.contains(&pair) {
                expected.push(pair);
            }
        }
    }

    expected
}

/// Checks the live database against the entity definitions
///
/// Returns the missing `table.column` names; an empty list means the schema
/// is complete. Each missing column is logged as a warning.
pub async fn verify_schema(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    let present: Vec<(String, String)> = sqlx::query_as(
        "SELECT table_name::text, column_name::text
         FROM information_schema.columns
         WHERE table_schema = 'public'",
    )
    .fetch_all(pool)
    .await?;

    let missing: Vec<String> = expected_columns()
        .into_iter()
        .filter(|(table, column)| !present.iter().any(|(t, c)| t == table && c == column))
        .map(|(table, column)| format!("{}.{}", table, column))
        .collect();

    for name in &missing {
        warn!(column = %name, "Column missing from database");
    }
    if missing.is_empty() {
        debug!("Database schema matches entity definitions");
    }

    Ok(missing)
}
