// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The four action classes a page can be guarded by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Permission to see the page and its menu entry.
    View,

    /// Permission to add new records on the page.
    Create,

    /// Permission to change existing records on the page.
    Update,

    /// Permission to remove records on the page.
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::View, Action::Create, Action::Update, Action::Delete];

    /// Column name of this action in the permission table.
    pub fn column(&self) -> &'static str {
        match self {
            Action::View => "can_view",
            Action::Create => "can_create",
            Action::Update => "can_update",
            Action::Delete => "can_delete",
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column())
    }
}

impl FromStr for Action {
    type Err = UnknownActionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "can_view" | "view" => Ok(Action::View),
            "can_create" | "create" => Ok(Action::Create),
            "can_update" | "update" => Ok(Action::Update),
            "can_delete" | "delete" => Ok(Action::Delete),
            _ => Err(UnknownActionError(value.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown permission action '{0}'")]
pub struct UnknownActionError(pub String);

/// One boolean per action class.
///
/// `Default` is the allow-all set: a page nobody wrote a rule for is fully accessible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Flags {
    pub can_view: bool,
    pub can_create: bool,
    pub can_update: bool,
    pub can_delete: bool,
}

impl Flags {
    pub const fn allow_all() -> Self {
        Self {
            can_view: true,
            can_create: true,
            can_update: true,
            can_delete: true,
        }
    }

    pub const fn deny_all() -> Self {
        Self {
            can_view: false,
            can_create: false,
            can_update: false,
            can_delete: false,
        }
    }

    pub fn get(&self, action: Action) -> bool {
        match action {
            Action::View => self.can_view,
            Action::Create => self.can_create,
            Action::Update => self.can_update,
            Action::Delete => self.can_delete,
        }
    }

    pub fn set(&mut self, action: Action, value: bool) {
        let flag = match action {
            Action::View => &mut self.can_view,
            Action::Create => &mut self.can_create,
            Action::Update => &mut self.can_update,
            Action::Delete => &mut self.can_delete,
        };
        *flag = value;
    }

    /// Returns a copy with one flag changed.
    pub fn with(mut self, action: Action, value: bool) -> Self {
        self.set(action, value);
        self
    }
}

impl Default for Flags {
    fn default() -> Self {
        Self::allow_all()
    }
}

/// Explicit grant of one user on one page key.
///
/// At most one active record exists per `(user_id, page)`; stores enforce this by upserting on
/// that pair. Records are never removed, `is_active = false` marks them as withdrawn and they are
/// ignored during resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord<ID> {
    pub user_id: ID,
    pub page: String,
    pub flags: Flags,
    pub is_active: bool,
}

impl<ID> PermissionRecord<ID> {
    /// Active record with the given flags.
    pub fn new(user_id: ID, page: impl Into<String>, flags: Flags) -> Self {
        Self {
            user_id,
            page: page.into(),
            flags,
            is_active: true,
        }
    }

    pub fn can(&self, action: Action) -> bool {
        self.flags.get(action)
    }
}
