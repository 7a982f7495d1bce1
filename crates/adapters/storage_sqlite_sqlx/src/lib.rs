//! # reefhub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `EntityStore` and `UsageRecorder` ports defined in `reefhub-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain records and database rows
//!
//! ## Dependency rule
//! Depends on `reefhub-app` (for port traits) and `reefhub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod entity_store;
mod error;
mod pool;
mod usage_store;

pub use entity_store::SqliteEntityStore;
pub use error::StorageError;
pub use pool::{Config, Database};
pub use usage_store::SqliteUsageStore;
