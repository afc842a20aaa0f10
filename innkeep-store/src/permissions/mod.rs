// SPDX-License-Identifier: MIT OR Apache-2.0

//! `PermissionStore` trait for persisting per-user page grants as well as concrete in-memory and
//! SQLite implementations.
#[cfg(feature = "memory")]
mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;
mod traits;

pub use traits::PermissionStore;
