// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data types shared by every part of the innkeep permission model.
//!
//! A [`PermissionRecord`] grants one user four action [`Flags`] on one page key. The
//! [`PageCatalog`] declares which page keys exist and how they are grouped into menus. Both are
//! plain data: resolving, filtering and editing live in `innkeep-access`, persistence in
//! `innkeep-store`.
pub mod catalog;
pub mod record;

pub use catalog::{CatalogError, Icon, PageCatalog, PageNode};
pub use record::{Action, Flags, PermissionRecord, UnknownActionError};
