/// Configuration management
///
/// Loads configuration from environment variables (and a `.env` file, if
/// present) into a type-safe struct.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool upper bound (default: 10)
/// - `DATABASE_MIN_CONNECTIONS`: Warm connections kept open (default: 2)
/// - `DATABASE_CONNECT_TIMEOUT_SECS`: Acquire timeout (default: 30)
///
/// # Example
///
/// ```no_run
/// use taskboard_core::config::Config;
/// use taskboard_core::db::pool::create_pool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.pool_config()).await?;
/// # Ok(())
/// # }
/// ```

use crate::db::pool::DatabaseConfig;
use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseSettings,
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Minimum number of idle connections
    pub min_connections: u32,

    /// Seconds to wait for a free connection
    pub connect_timeout_seconds: u64,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` is missing
    /// - A numeric variable doesn't parse
    /// - `DATABASE_MIN_CONNECTIONS` exceeds `DATABASE_MAX_CONNECTIONS`
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let min_connections = env::var("DATABASE_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "2".to_string())
            .parse::<u32>()?;

        let connect_timeout_seconds = env::var("DATABASE_CONNECT_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()?;

        let config = Self {
            database: DatabaseSettings {
                url,
                max_connections,
                min_connections,
                connect_timeout_seconds,
            },
        };
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.database.max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be at least 1");
        }
        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!("DATABASE_MIN_CONNECTIONS must not exceed DATABASE_MAX_CONNECTIONS");
        }
        Ok(())
    }

    /// Pool configuration derived from these settings
    ///
    /// Idle timeout, max lifetime and pre-acquire testing keep the pool defaults.
    pub fn pool_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            min_connections: self.database.min_connections,
            connect_timeout_seconds: self.database.connect_timeout_seconds,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_connections: u32, min_connections: u32) -> Config {
        Config {
            database: DatabaseSettings {
                url: "postgresql://localhost/taskboard_test".to_string(),
                max_connections,
                min_connections,
                connect_timeout_seconds: 5,
            },
        }
    }

    #[test]
    fn test_pool_config() {
        let pool = config(4, 1).pool_config();

        assert_eq!(pool.url, "postgresql://localhost/taskboard_test");
        assert_eq!(pool.max_connections, 4);
        assert_eq!(pool.min_connections, 1);
        assert_eq!(pool.connect_timeout_seconds, 5);
        assert_eq!(pool.idle_timeout_seconds, Some(600));
        assert!(pool.test_before_acquire);
    }

    #[test]
    fn test_validate() {
        assert!(config(10, 2).validate().is_ok());
        assert!(config(2, 10).validate().is_err());
        assert!(config(0, 0).validate().is_err());
    }
}
