// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interfaces and implementations of the persistence layer for innkeep permission records.
//!
//! Permission rows are keyed by `(user_id, page)`. Writes are upserts on that pair, so there is
//! never more than one row per user and page and the last writer wins. Rows are never deleted,
//! withdrawing a grant flips `is_active`.
//!
//! Two backends are offered: an in-memory store for development and tests and an SQLite store
//! backed by a connection pool. Writes into SQLite always happen inside a transaction, see
//! [`traits::Transaction`].
pub mod config;
#[cfg(feature = "memory")]
pub mod memory;
pub mod permissions;
#[cfg(feature = "sqlite")]
pub mod sqlite;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
pub mod traits;

pub use config::StoreConfig;
#[cfg(feature = "memory")]
pub use memory::MemoryStore;
pub use permissions::PermissionStore;
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteError, SqliteStore, SqliteStoreBuilder};
pub use traits::Transaction;
