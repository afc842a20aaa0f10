// SPDX-License-Identifier: MIT OR Apache-2.0

//! Page-level access control for the innkeep back office.
//!
//! Every page of the [`PageCatalog`](innkeep_core::PageCatalog) is guarded by four action flags
//! (view, create, update, delete) per user. The [`Resolver`] answers which flags a user holds on a
//! page, [`filter_visible`] prunes the navigation tree down to what the user may view and the
//! [`PermissionEditor`] lets a super-user change the grants of others.
//!
//! ## Default-allow
//!
//! A page without an explicit, active grant is fully accessible. The same answer is given when
//! there is no acting user or when the store can't be reached: failing to look up a permission
//! never blocks rendering. Only writes report errors, see [`EditorError`].
//!
//! ## Sessions
//!
//! Navigation is painted often and the catalog can be deep, so the grants of the acting user are
//! fetched in one batch and kept in a [`PermissionSession`] which the UI owns and refreshes when
//! the acting user changes.
mod directory;
mod editor;
mod menu;
mod resolver;
mod session;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use directory::{GuardError, SuperUser, UserDirectory, require_super_user};
pub use editor::{EditorError, PermissionEditor, PermissionMatrix};
pub use menu::{MenuEntry, filter_visible, visible_keys};
pub use resolver::{Origin, Permission, PermissionMap, Resolver};
pub use session::PermissionSession;
