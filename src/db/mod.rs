//! Database layer
//!
//! SQLite-backed persistence for the registry:
//! - `pool` creates the connection pool (plus an in-memory pool for tests)
//! - `migrations` applies the embedded, versioned schema
//! - `repositories` hold the per-aggregate data access traits and their
//!   sqlx implementations

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, ping};
