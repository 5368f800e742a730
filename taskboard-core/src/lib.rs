//! # Taskboard Core
//!
//! This crate contains the entity model of the taskboard task tracker: users,
//! tasks, statuses and tags, the validation rules attached to each of them,
//! the association graph that wires them together, and the stores they are
//! persisted to.
//!
//! ## Module Organization
//!
//! - `auth`: Password encryption
//! - `config`: Configuration management
//! - `db`: Connection pool and migrations
//! - `error`: Common error types
//! - `models`: Entity definitions, operations and the association graph
//! - `store`: Store handle trait with Postgres and in-memory implementations
//! - `validation`: Field-error maps and per-field rules
//!
//! ## Example
//!
//! ```
//! use taskboard_core::models::user::{CreateUser, User};
//! use taskboard_core::store::MemoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//!
//! let user = User::create(&store, CreateUser {
//!     first_name: "Jane".to_string(),
//!     last_name: "Doe".to_string(),
//!     email: "jane@example.com".to_string(),
//!     password: "secret".to_string(),
//! }).await?;
//!
//! assert_eq!(user.full_name(), "Doe Jane");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod store;
pub mod validation;

pub use error::{ModelError, ModelResult};
pub use validation::FieldErrors;

/// Current version of the taskboard core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
