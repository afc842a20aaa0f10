// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities.
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::convert::Infallible;
use std::hash::Hash;
use std::rc::Rc;

use innkeep_core::PermissionRecord;
use innkeep_store::{MemoryStore, PermissionStore, Transaction};
use thiserror::Error;

pub fn setup_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}

/// User directory with a switchable acting user.
#[derive(Clone, Debug)]
pub struct MemoryDirectory<ID> {
    acting: Rc<RefCell<Option<ID>>>,
    super_users: Rc<RefCell<HashSet<ID>>>,
}

impl<ID> MemoryDirectory<ID>
where
    ID: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            acting: Rc::new(RefCell::new(None)),
            super_users: Rc::new(RefCell::new(HashSet::new())),
        }
    }

    pub fn sign_in(&self, user_id: ID) {
        self.acting.replace(Some(user_id));
    }

    pub fn sign_out(&self) {
        self.acting.replace(None);
    }

    pub fn promote(&self, user_id: ID) {
        self.super_users.borrow_mut().insert(user_id);
    }
}

impl<ID> Default for MemoryDirectory<ID>
where
    ID: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<ID> crate::UserDirectory<ID> for MemoryDirectory<ID>
where
    ID: Clone + Eq + Hash,
{
    type Error = Infallible;

    async fn acting_user(&self) -> Result<Option<ID>, Self::Error> {
        Ok(self.acting.borrow().clone())
    }

    async fn is_super_user(&self, user_id: &ID) -> Result<bool, Self::Error> {
        Ok(self.super_users.borrow().contains(user_id))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("permission store unavailable")]
pub struct StoreUnavailable;

/// Wraps a store and fails reads, writes or commits on demand.
///
/// Errors of the wrapped store are reported as [`StoreUnavailable`] as well. A failing commit
/// rolls the wrapped transaction back, so nothing written inside it becomes visible.
#[derive(Clone, Debug)]
pub struct FaultyStore<S> {
    inner: S,
    fail_reads: Rc<Cell<bool>>,
    fail_writes: Rc<Cell<bool>>,
    fail_commits: Rc<Cell<bool>>,
    upserts_left: Rc<Cell<Option<usize>>>,
}

impl<S> FaultyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_reads: Rc::default(),
            fail_writes: Rc::default(),
            fail_commits: Rc::default(),
            upserts_left: Rc::default(),
        }
    }

    /// The wrapped store, never fails on its own.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.set(fail);
    }

    /// Lets the next `count` upserts through and fails every one after.
    pub fn fail_upserts_after(&self, count: usize) {
        self.upserts_left.set(Some(count));
    }

    fn check(flag: &Cell<bool>) -> Result<(), StoreUnavailable> {
        if flag.get() {
            Err(StoreUnavailable)
        } else {
            Ok(())
        }
    }

    fn count_upsert(&self) -> Result<(), StoreUnavailable> {
        match self.upserts_left.get() {
            Some(0) => Err(StoreUnavailable),
            Some(left) => {
                self.upserts_left.set(Some(left - 1));
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl<ID> Default for FaultyStore<MemoryStore<ID>> {
    fn default() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl<S> Transaction for FaultyStore<S>
where
    S: Transaction,
{
    type Error = StoreUnavailable;

    type Permit = S::Permit;

    async fn begin(&self) -> Result<S::Permit, Self::Error> {
        self.inner.begin().await.map_err(unavailable)
    }

    async fn rollback(&self, permit: S::Permit) -> Result<(), Self::Error> {
        self.inner.rollback(permit).await.map_err(unavailable)
    }

    async fn commit(&self, permit: S::Permit) -> Result<(), Self::Error> {
        if self.fail_commits.get() {
            self.inner.rollback(permit).await.map_err(unavailable)?;
            return Err(StoreUnavailable);
        }

        self.inner.commit(permit).await.map_err(unavailable)
    }
}

impl<ID, S> PermissionStore<ID> for FaultyStore<S>
where
    S: PermissionStore<ID>,
{
    type Error = StoreUnavailable;

    async fn permission(
        &self,
        user_id: &ID,
        page: &str,
    ) -> Result<Option<PermissionRecord<ID>>, Self::Error> {
        Self::check(&self.fail_reads)?;
        self.inner
            .permission(user_id, page)
            .await
            .map_err(unavailable)
    }

    async fn permissions(&self, user_id: &ID) -> Result<Vec<PermissionRecord<ID>>, Self::Error> {
        Self::check(&self.fail_reads)?;
        self.inner.permissions(user_id).await.map_err(unavailable)
    }

    async fn upsert_permission(&self, record: &PermissionRecord<ID>) -> Result<bool, Self::Error> {
        Self::check(&self.fail_writes)?;
        self.count_upsert()?;
        self.inner
            .upsert_permission(record)
            .await
            .map_err(unavailable)
    }

    async fn set_active(
        &self,
        user_id: &ID,
        page: &str,
        is_active: bool,
    ) -> Result<bool, Self::Error> {
        Self::check(&self.fail_writes)?;
        self.inner
            .set_active(user_id, page, is_active)
            .await
            .map_err(unavailable)
    }
}

fn unavailable<E: std::error::Error>(err: E) -> StoreUnavailable {
    tracing::debug!(%err, "wrapped store failed");
    StoreUnavailable
}
