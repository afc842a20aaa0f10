// SPDX-License-Identifier: MIT OR Apache-2.0

use std::error::Error;
use std::fmt::Debug;

use innkeep_core::{Action, Flags, PageCatalog, PermissionRecord};
use innkeep_store::{PermissionStore, Transaction};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::directory::SuperUser;
use crate::resolver::PermissionMap;

/// Complete grant matrix of one user: every catalog page with its effective flags.
///
/// Entries keep catalog order. The matrix is the caller's in-memory copy, editor operations
/// change it before they write to the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermissionMatrix<ID> {
    user_id: ID,
    entries: Vec<(String, Flags)>,
}

impl<ID> PermissionMatrix<ID> {
    pub fn user_id(&self) -> &ID {
        &self.user_id
    }

    pub fn get(&self, page: &str) -> Option<Flags> {
        self.entries
            .iter()
            .find(|(key, _)| key == page)
            .map(|(_, flags)| *flags)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Flags)> {
        self.entries.iter().map(|(key, flags)| (key.as_str(), *flags))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Changes one flag of a page and returns the resulting flags of that page.
    ///
    /// Pages missing from the matrix are added with allow-all flags first.
    fn update(&mut self, page: &str, action: Action, value: bool) -> Flags {
        let index = match self.entries.iter().position(|(key, _)| key == page) {
            Some(index) => index,
            None => {
                self.entries.push((page.to_string(), Flags::allow_all()));
                self.entries.len() - 1
            }
        };

        let (_, flags) = &mut self.entries[index];
        flags.set(action, value);
        *flags
    }

    fn reset(&mut self, page: &str) {
        if let Some((_, flags)) = self.entries.iter_mut().find(|(key, _)| key == page) {
            *flags = Flags::allow_all();
        }
    }
}

/// Reads and changes the grants of other users.
///
/// Can only be created by a super-user, see [`require_super_user`](crate::require_super_user).
///
/// Writes are not retried and are never rolled back in the caller's matrix: when persisting fails
/// the error is returned and the caller decides how to reconcile, usually by reloading the matrix.
/// Concurrent editors overwrite each other, the last write of a page wins.
#[derive(Debug)]
pub struct PermissionEditor<ID, S> {
    store: S,
    catalog: PageCatalog,
    editor: SuperUser<ID>,
}

impl<ID, S, E> PermissionEditor<ID, S>
where
    ID: Clone + Debug,
    S: PermissionStore<ID, Error = E> + Transaction<Error = E>,
    E: Error,
{
    pub fn new(store: S, catalog: PageCatalog, editor: SuperUser<ID>) -> Self {
        Self {
            store,
            catalog,
            editor,
        }
    }

    /// Loads the effective flags of `target` for every page of the catalog.
    ///
    /// Pages without an active grant show allow-all, so the matrix is complete even for users
    /// without any rows. Rows for pages which are not in the catalog anymore are left out.
    pub async fn load_matrix(&self, target: &ID) -> Result<PermissionMatrix<ID>, EditorError<E>> {
        let records = self
            .store
            .permissions(target)
            .await
            .map_err(EditorError::Load)?;
        let grants = PermissionMap::from_records(records);

        let entries = self
            .catalog
            .keys()
            .into_iter()
            .map(|page| (page.to_string(), grants.get(page)))
            .collect();

        debug!(
            editor = ?self.editor.id(),
            user_id = ?target,
            grants = grants.len(),
            "loaded permission matrix"
        );

        Ok(PermissionMatrix {
            user_id: target.clone(),
            entries,
        })
    }

    /// Changes one flag of a page.
    ///
    /// The matrix is updated first, then the complete flag set of that page is written with the
    /// record marked active. If writing fails the matrix keeps the change.
    pub async fn set_flag(
        &self,
        matrix: &mut PermissionMatrix<ID>,
        page: &str,
        action: Action,
        value: bool,
    ) -> Result<(), EditorError<E>> {
        let flags = matrix.update(page, action, value);
        let record = PermissionRecord::new(matrix.user_id.clone(), page, flags);

        debug!(
            editor = ?self.editor.id(),
            user_id = ?record.user_id,
            page,
            %action,
            value,
            "set permission flag"
        );
        self.persist(std::slice::from_ref(&record)).await?;
        Ok(())
    }

    /// Writes every page of the matrix in one transaction.
    ///
    /// On failure the transaction is rolled back. Whether that discards the pages written before
    /// the failure depends on the store: SQLite keeps none of them, the memory store has no
    /// rollback and keeps them. Returns the number of written rows.
    pub async fn save_matrix(
        &self,
        matrix: &PermissionMatrix<ID>,
    ) -> Result<usize, EditorError<E>> {
        let records: Vec<PermissionRecord<ID>> = matrix
            .iter()
            .map(|(page, flags)| PermissionRecord::new(matrix.user_id.clone(), page, flags))
            .collect();

        debug!(
            editor = ?self.editor.id(),
            user_id = ?matrix.user_id,
            pages = records.len(),
            "save permission matrix"
        );
        self.persist(&records).await
    }

    /// Withdraws the explicit grant of a page, it falls back to allow-all.
    ///
    /// The row stays in the store and is marked inactive. Returns `false` if there was no row.
    pub async fn reset_page(
        &self,
        matrix: &mut PermissionMatrix<ID>,
        page: &str,
    ) -> Result<bool, EditorError<E>> {
        matrix.reset(page);

        let permit = self
            .store
            .begin()
            .await
            .map_err(EditorError::Transaction)?;

        let result = match self.store.set_active(&matrix.user_id, page, false).await {
            Ok(result) => result,
            Err(source) => {
                self.rollback(permit).await;
                error!(
                    user_id = ?matrix.user_id,
                    page,
                    %source,
                    "failed deactivating permission"
                );
                return Err(EditorError::Persist {
                    page: page.to_string(),
                    source,
                });
            }
        };

        self.store
            .commit(permit)
            .await
            .map_err(EditorError::Transaction)?;

        debug!(editor = ?self.editor.id(), user_id = ?matrix.user_id, page, "reset permission");
        Ok(result)
    }

    async fn persist(&self, records: &[PermissionRecord<ID>]) -> Result<usize, EditorError<E>> {
        let permit = self.store.begin().await.map_err(|err| {
            error!(%err, "failed beginning permission transaction");
            EditorError::Transaction(err)
        })?;

        for record in records {
            if let Err(source) = self.store.upsert_permission(record).await {
                self.rollback(permit).await;
                error!(
                    user_id = ?record.user_id,
                    page = %record.page,
                    %source,
                    "failed persisting permission"
                );
                return Err(EditorError::Persist {
                    page: record.page.clone(),
                    source,
                });
            }
        }

        self.store.commit(permit).await.map_err(|err| {
            error!(%err, "failed committing permission transaction");
            EditorError::Transaction(err)
        })?;

        Ok(records.len())
    }

    async fn rollback(&self, permit: <S as Transaction>::Permit) {
        if let Err(err) = self.store.rollback(permit).await {
            warn!(%err, "failed rolling back permission transaction");
        }
    }
}

/// Failures of the permission editor.
///
/// `Persist` and `Transaction` both mean that a change did not reach the store.
#[derive(Debug, Error)]
pub enum EditorError<E> {
    #[error("failed loading permissions: {0}")]
    Load(#[source] E),

    #[error("failed persisting permission for page '{page}': {source}")]
    Persist {
        page: String,
        #[source]
        source: E,
    },

    #[error("permission transaction failed: {0}")]
    Transaction(#[source] E),
}
