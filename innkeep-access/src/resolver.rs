// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashMap;
use std::fmt::Debug;

use innkeep_core::{Action, Flags, PermissionRecord};
use innkeep_store::PermissionStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Where the flags of a resolved permission came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    /// An active record exists for this user and page.
    Granted,

    /// No active record exists or no user is signed in, everything is allowed.
    DefaultAllow,

    /// The store could not be queried, everything is allowed.
    LookupFailed,
}

/// Effective permission of one user on one page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub page: String,
    pub flags: Flags,
    pub origin: Origin,
}

impl Permission {
    fn granted(page: &str, flags: Flags) -> Self {
        Self {
            page: page.to_string(),
            flags,
            origin: Origin::Granted,
        }
    }

    fn allow_all(page: &str, origin: Origin) -> Self {
        Self {
            page: page.to_string(),
            flags: Flags::allow_all(),
            origin,
        }
    }

    pub fn can(&self, action: Action) -> bool {
        self.flags.get(action)
    }
}

/// Answers which actions a user may perform on a page.
///
/// Resolution is a single read against the store without any caching. Failures are never
/// returned: if the store can't be queried the answer is the same allow-all set used when no rule
/// exists.
#[derive(Clone, Debug)]
pub struct Resolver<S> {
    store: S,
}

impl<S> Resolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolves the effective flags of `user_id` on `page`.
    ///
    /// Unknown page keys are resolved like any other key. Without a user everything is allowed.
    pub async fn resolve<ID>(&self, user_id: Option<&ID>, page: &str) -> Permission
    where
        S: PermissionStore<ID>,
        ID: Debug,
    {
        let Some(user_id) = user_id else {
            debug!(page, "no acting user, allow all");
            return Permission::allow_all(page, Origin::DefaultAllow);
        };

        match self.store.permission(user_id, page).await {
            Ok(Some(record)) if record.is_active => {
                debug!(?user_id, page, flags = ?record.flags, "resolved explicit grant");
                Permission::granted(page, record.flags)
            }
            Ok(_) => {
                debug!(?user_id, page, "no active grant, allow all");
                Permission::allow_all(page, Origin::DefaultAllow)
            }
            Err(err) => {
                warn!(?user_id, page, %err, "permission lookup failed, allow all");
                Permission::allow_all(page, Origin::LookupFailed)
            }
        }
    }

    /// Fetches all active grants of a user in one call.
    ///
    /// A failing store yields an empty map, which answers allow-all for every page.
    pub async fn prefetch<ID>(&self, user_id: Option<&ID>) -> PermissionMap
    where
        S: PermissionStore<ID>,
        ID: Debug,
    {
        let Some(user_id) = user_id else {
            return PermissionMap::default();
        };

        match self.store.permissions(user_id).await {
            Ok(records) => {
                let map = PermissionMap::from_records(records);
                debug!(?user_id, grants = map.len(), "prefetched permissions");
                map
            }
            Err(err) => {
                warn!(?user_id, %err, "permission prefetch failed, allow all");
                PermissionMap::default()
            }
        }
    }
}

/// Materialised active grants of one user, keyed by page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PermissionMap {
    grants: HashMap<String, Flags>,
}

impl PermissionMap {
    /// Builds the map from stored records, inactive ones are skipped.
    pub fn from_records<ID>(records: impl IntoIterator<Item = PermissionRecord<ID>>) -> Self {
        let grants = records
            .into_iter()
            .filter(|record| record.is_active)
            .map(|record| (record.page, record.flags))
            .collect();
        Self { grants }
    }

    /// Flags for a page, allow-all when there is no grant for it.
    pub fn get(&self, page: &str) -> Flags {
        self.grants.get(page).copied().unwrap_or_default()
    }

    pub fn can(&self, page: &str, action: Action) -> bool {
        self.get(page).get(action)
    }

    /// Returns `true` if an explicit grant exists for this page.
    pub fn is_explicit(&self, page: &str) -> bool {
        self.grants.contains_key(page)
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use innkeep_core::{Action, Flags, PermissionRecord};
    use innkeep_store::{MemoryStore, PermissionStore, SqliteStore, Transaction};

    use crate::test_utils::{FaultyStore, setup_logging};

    use super::{Origin, PermissionMap, Resolver};

    async fn grant(store: &MemoryStore<u64>, record: PermissionRecord<u64>) {
        store.upsert_permission(&record).await.unwrap();
    }

    #[tokio::test]
    async fn no_record_allows_everything() {
        setup_logging();

        let resolver = Resolver::new(MemoryStore::<u64>::new());

        for page in ["units", "purchases_xml", "not_in_any_catalog"] {
            let permission = resolver.resolve(Some(&1), page).await;
            assert_eq!(permission.flags, Flags::allow_all());
            assert_eq!(permission.origin, Origin::DefaultAllow);
            assert_eq!(permission.page, page);
        }
    }

    #[tokio::test]
    async fn no_user_allows_everything() {
        let store = MemoryStore::<u64>::new();
        grant(&store, PermissionRecord::new(1, "units", Flags::deny_all())).await;

        let resolver = Resolver::new(store);
        let permission = resolver.resolve(None::<&u64>, "units").await;
        assert_eq!(permission.flags, Flags::allow_all());
        assert_eq!(permission.origin, Origin::DefaultAllow);
    }

    #[tokio::test]
    async fn active_record_is_returned_exactly() {
        let store = MemoryStore::<u64>::new();
        let units = Flags::allow_all().with(Action::Delete, false);
        let staff = Flags::deny_all().with(Action::View, true);
        grant(&store, PermissionRecord::new(1, "units", units)).await;
        grant(&store, PermissionRecord::new(1, "staff", staff)).await;
        grant(&store, PermissionRecord::new(2, "units", Flags::deny_all())).await;

        let resolver = Resolver::new(store);

        let permission = resolver.resolve(Some(&1), "units").await;
        assert_eq!(permission.flags, units);
        assert_eq!(permission.origin, Origin::Granted);
        assert!(!permission.can(Action::Delete));

        assert_eq!(resolver.resolve(Some(&1), "staff").await.flags, staff);
        assert_eq!(
            resolver.resolve(Some(&2), "units").await.flags,
            Flags::deny_all()
        );
        assert_eq!(
            resolver.resolve(Some(&2), "staff").await.flags,
            Flags::allow_all()
        );
    }

    #[tokio::test]
    async fn inactive_record_is_ignored() {
        let store = MemoryStore::<u64>::new();
        grant(&store, PermissionRecord::new(1, "units", Flags::deny_all())).await;
        store.set_active(&1, "units", false).await.unwrap();

        let resolver = Resolver::new(store);
        let permission = resolver.resolve(Some(&1), "units").await;
        assert_eq!(permission.flags, Flags::allow_all());
        assert_eq!(permission.origin, Origin::DefaultAllow);

        let map = resolver.prefetch(Some(&1)).await;
        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn lookup_failure_allows_everything() {
        setup_logging();

        let store = FaultyStore::new(MemoryStore::<u64>::new());
        store
            .inner()
            .upsert_permission(&PermissionRecord::new(1, "units", Flags::deny_all()))
            .await
            .unwrap();
        store.fail_reads(true);

        let resolver = Resolver::new(store);
        let permission = resolver.resolve(Some(&1), "units").await;
        assert_eq!(permission.flags, Flags::allow_all());
        assert_eq!(permission.origin, Origin::LookupFailed);

        let map = resolver.prefetch(Some(&1)).await;
        assert_eq!(map, PermissionMap::default());
        assert!(map.can("units", Action::Delete));
    }

    #[tokio::test]
    async fn prefetch_matches_single_lookups() {
        let store = MemoryStore::<u64>::new();
        grant(&store, PermissionRecord::new(4, "units", Flags::deny_all())).await;
        grant(
            &store,
            PermissionRecord::new(4, "products", Flags::allow_all().with(Action::Create, false)),
        )
        .await;

        let resolver = Resolver::new(store);
        let map = resolver.prefetch(Some(&4)).await;
        assert_eq!(map.len(), 2);

        for page in ["units", "products", "staff"] {
            assert_eq!(map.get(page), resolver.resolve(Some(&4), page).await.flags);
        }
        assert!(map.is_explicit("units"));
        assert!(!map.is_explicit("staff"));
    }

    #[tokio::test]
    async fn resolve_against_sqlite() {
        let store = SqliteStore::temporary().await;

        let permit = store.begin().await.unwrap();
        store
            .upsert_permission(&PermissionRecord::new(
                8u64,
                "purchases_view",
                Flags::deny_all(),
            ))
            .await
            .unwrap();
        store.commit(permit).await.unwrap();

        let resolver = Resolver::new(store);
        let permission = resolver.resolve(Some(&8u64), "purchases_view").await;
        assert_eq!(permission.flags, Flags::deny_all());
        assert_eq!(permission.origin, Origin::Granted);

        let permission = resolver.resolve(Some(&8u64), "purchases_xml").await;
        assert_eq!(permission.origin, Origin::DefaultAllow);
    }
}
