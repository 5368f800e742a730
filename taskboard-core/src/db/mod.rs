/// Database layer for taskboard
///
/// This module provides database connection pooling and migrations. The
/// queries themselves live in [`crate::store::PgStore`].
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: Migration runner and schema verification
///
/// # Example
///
/// ```no_run
/// use taskboard_core::config::Config;
/// use taskboard_core::db::{migrations::run_migrations, pool::create_pool};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::from_env()?;
///
///     let pool = create_pool(config.pool_config()).await?;
///     run_migrations(&pool).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
