// SPDX-License-Identifier: MIT OR Apache-2.0

/// Macro to run the same test logic against all store backend implementations.
///
/// The closure is executed once for each store type, both use `u64` user ids:
/// - In-memory store (`MemoryStore`)
/// - SQLite store (`SqliteStore`)
///
/// Writes need to be wrapped into `begin` and `commit` by the test body, the in-memory store
/// accepts these calls as no-ops.
///
/// ## Example
///
/// ```rust
/// # use innkeep_core::{Flags, PermissionRecord};
/// # use innkeep_store::{assert_all_stores, PermissionStore, Transaction};
/// # async fn run() {
/// assert_all_stores!(|store| async {
///     let permit = store.begin().await.unwrap();
///     let record = PermissionRecord::new(1u64, "units", Flags::deny_all());
///     store.upsert_permission(&record).await.unwrap();
///     store.commit(permit).await.unwrap();
///
///     assert_eq!(store.permission(&1u64, "units").await.unwrap(), Some(record));
/// });
/// # }
/// ```
#[macro_export]
macro_rules! assert_all_stores {
    (|$store:ident| $test_body:expr) => {
        // Test with MemoryStore.
        {
            let $store = $crate::memory::MemoryStore::<u64>::default();
            $test_body.await;
        }

        // Test with SqliteStore.
        {
            let $store = $crate::sqlite::SqliteStore::temporary().await;
            $test_body.await;
        }
    };
}
