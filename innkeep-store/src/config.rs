// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration of the permission store.
//!
//! `StoreConfig` can be deserialized from the application's configuration file and passed into
//! `SqliteStoreBuilder::from_config` instead of calling the builder methods one by one.
use serde::{Deserialize, Serialize};

/// Default database URL, a private in-memory SQLite database.
pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

/// Default number of pooled database connections.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 16;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite connection string, for example `sqlite://innkeep.db`.
    pub database_url: String,

    /// Upper bound of connections kept in the pool.
    pub max_connections: u32,

    /// Create the database file if it doesn't exist yet.
    pub create_database: bool,

    /// Run embedded schema migrations when the store is built.
    pub run_migrations: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            create_database: true,
            run_migrations: true,
        }
    }
}
