// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Debug;

use innkeep_core::{Action, Flags, PageCatalog};
use innkeep_store::PermissionStore;
use tracing::{debug, warn};

use crate::directory::UserDirectory;
use crate::menu::{MenuEntry, filter_visible};
use crate::resolver::{PermissionMap, Resolver};

/// Grants of the acting user, fetched once and kept for the duration of a UI session.
///
/// The session is owned by whoever renders the UI and passed to the places asking for
/// permissions. It is invalidated when the acting user changes or when the UI asks for a refresh.
///
/// Super-users are exempt from permission checks, their session answers allow-all for every page
/// without looking at any grant.
#[derive(Clone, Debug)]
pub struct PermissionSession<ID> {
    user_id: Option<ID>,
    is_super_user: bool,
    grants: Option<PermissionMap>,
}

impl<ID> Default for PermissionSession<ID> {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl<ID> PermissionSession<ID> {
    /// Session without a signed-in user.
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            is_super_user: false,
            grants: None,
        }
    }

    /// Looks up the acting user and prefetches all of their grants.
    ///
    /// A failing directory is treated like a failed permission lookup: the session stays
    /// anonymous and answers allow-all.
    pub async fn load<D, S>(directory: &D, resolver: &Resolver<S>) -> Self
    where
        D: UserDirectory<ID>,
        S: PermissionStore<ID>,
        ID: Debug,
    {
        let user_id = match directory.acting_user().await {
            Ok(user_id) => user_id,
            Err(err) => {
                warn!(%err, "acting user lookup failed, continue anonymously");
                return Self::anonymous();
            }
        };

        let mut session = Self {
            user_id,
            is_super_user: false,
            grants: None,
        };

        if let Some(user_id) = &session.user_id {
            session.is_super_user = match directory.is_super_user(user_id).await {
                Ok(is_super_user) => is_super_user,
                Err(err) => {
                    warn!(?user_id, %err, "super-user lookup failed");
                    false
                }
            };
        }

        session.refresh(resolver).await;
        session
    }

    pub fn user_id(&self) -> Option<&ID> {
        self.user_id.as_ref()
    }

    pub fn is_super_user(&self) -> bool {
        self.is_super_user
    }

    /// Returns `true` when grants were fetched and not invalidated since.
    pub fn is_loaded(&self) -> bool {
        self.is_super_user || self.grants.is_some()
    }

    /// Effective flags on a page.
    pub fn flags(&self, page: &str) -> Flags {
        if self.is_super_user {
            return Flags::allow_all();
        }

        self.grants
            .as_ref()
            .map(|grants| grants.get(page))
            .unwrap_or_default()
    }

    pub fn can(&self, page: &str, action: Action) -> bool {
        self.flags(page).get(action)
    }

    /// Navigation menu of the acting user.
    pub fn menu(&self, catalog: &PageCatalog) -> Vec<MenuEntry> {
        filter_visible(catalog.nodes(), |page| self.can(page, Action::View))
    }

    /// Drops the cached grants. Until the next refresh every page answers allow-all.
    pub fn invalidate(&mut self) {
        self.grants = None;
    }

    /// Fetches the grants of the session's user again.
    pub async fn refresh<S>(&mut self, resolver: &Resolver<S>)
    where
        S: PermissionStore<ID>,
        ID: Debug,
    {
        if self.is_super_user {
            self.grants = None;
            return;
        }

        self.grants = Some(resolver.prefetch(self.user_id.as_ref()).await);
    }

    /// Reloads the session if the acting user changed since it was loaded.
    ///
    /// Returns `true` if the session now belongs to another user.
    pub async fn switch_user<D, S>(&mut self, directory: &D, resolver: &Resolver<S>) -> bool
    where
        D: UserDirectory<ID>,
        S: PermissionStore<ID>,
        ID: Debug + PartialEq,
    {
        let acting = match directory.acting_user().await {
            Ok(acting) => acting,
            Err(err) => {
                warn!(%err, "acting user lookup failed, keep session");
                return false;
            }
        };

        if acting == self.user_id {
            return false;
        }

        debug!(from = ?self.user_id, to = ?acting, "acting user changed");
        *self = Self::load(directory, resolver).await;
        true
    }
}
