// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static, hierarchical declaration of every page and menu group of the back office.
//!
//! The catalog is the single source of truth for which page keys exist. It is built once (in code
//! or from a JSON document shipped with the deployment) and never changes at runtime. Grants are
//! stored independently, keyed by the same page keys.
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current version of the built-in catalog.
pub const BUILTIN_CATALOG_VERSION: u32 = 1;

/// Icons a menu entry can be rendered with.
///
/// Purely presentational: nothing which decides about access ever looks at it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Dashboard,
    Building,
    Bed,
    Calendar,
    Users,
    Cart,
    FileCode,
    Receipt,
    Boxes,
    Package,
    Truck,
    Settings,
    Shield,
}

/// One addressable page or menu group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageNode {
    pub key: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PageNode>,
}

impl PageNode {
    /// Leaf page without children.
    pub fn page(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            icon: None,
            children: Vec::new(),
        }
    }

    /// Menu group with sub-pages.
    pub fn group(
        key: impl Into<String>,
        label: impl Into<String>,
        children: impl IntoIterator<Item = PageNode>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            icon: None,
            children: children.into_iter().collect(),
        }
    }

    pub fn with_icon(mut self, icon: Icon) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn is_group(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Validated catalog of pages.
///
/// Keys are non-empty and unique across the whole tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageCatalog {
    version: u32,
    pages: Vec<PageNode>,
}

/// Shape of a catalog document before validation.
#[derive(Deserialize)]
struct CatalogDocument {
    version: u32,
    pages: Vec<PageNode>,
}

impl PageCatalog {
    pub fn new(version: u32, pages: Vec<PageNode>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut stack: Vec<&PageNode> = pages.iter().collect();
        while let Some(node) = stack.pop() {
            if node.key.trim().is_empty() {
                return Err(CatalogError::EmptyKey(node.label.clone()));
            }
            if !seen.insert(node.key.as_str()) {
                return Err(CatalogError::DuplicateKey(node.key.clone()));
            }
            stack.extend(node.children.iter());
        }

        Ok(Self { version, pages })
    }

    /// Parses and validates a catalog document of the form
    /// `{ "version": 1, "pages": [{ "key": "..", "label": "..", "children": [..] }] }`.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(json)?;
        Self::new(document.version, document.pages)
    }

    /// Catalog of the innkeep back office.
    pub fn builtin() -> Self {
        let pages = vec![
            PageNode::page("dashboard", "Dashboard").with_icon(Icon::Dashboard),
            PageNode::group(
                "lodging",
                "Lodging",
                [
                    PageNode::page("units", "Units").with_icon(Icon::Building),
                    PageNode::page("rooms", "Rooms").with_icon(Icon::Bed),
                    PageNode::page("reservations", "Reservations").with_icon(Icon::Calendar),
                ],
            )
            .with_icon(Icon::Building),
            PageNode::page("staff", "Staff").with_icon(Icon::Users),
            PageNode::group(
                "purchases",
                "Purchases",
                [
                    PageNode::page("purchases_xml", "Import invoice").with_icon(Icon::FileCode),
                    PageNode::page("purchases_view", "Purchase history").with_icon(Icon::Receipt),
                ],
            )
            .with_icon(Icon::Cart),
            PageNode::group(
                "inventory",
                "Inventory",
                [
                    PageNode::page("products", "Products").with_icon(Icon::Package),
                    PageNode::page("stock_movements", "Stock movements").with_icon(Icon::Boxes),
                ],
            )
            .with_icon(Icon::Boxes),
            PageNode::page("suppliers", "Suppliers").with_icon(Icon::Truck),
            PageNode::group(
                "settings",
                "Settings",
                [
                    PageNode::page("users", "Users").with_icon(Icon::Users),
                    PageNode::page("permissions", "Permissions").with_icon(Icon::Shield),
                ],
            )
            .with_icon(Icon::Settings),
        ];

        Self {
            version: BUILTIN_CATALOG_VERSION,
            pages,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Root nodes in declaration order.
    pub fn nodes(&self) -> &[PageNode] {
        &self.pages
    }

    /// All keys of the catalog, depth-first in declaration order.
    pub fn keys(&self) -> Vec<&str> {
        fn walk<'a>(nodes: &'a [PageNode], keys: &mut Vec<&'a str>) {
            for node in nodes {
                keys.push(node.key.as_str());
                walk(&node.children, keys);
            }
        }

        let mut keys = Vec::new();
        walk(&self.pages, &mut keys);
        keys
    }

    pub fn find(&self, key: &str) -> Option<&PageNode> {
        fn walk<'a>(nodes: &'a [PageNode], key: &str) -> Option<&'a PageNode> {
            nodes.iter().find_map(|node| {
                if node.key == key {
                    Some(node)
                } else {
                    walk(&node.children, key)
                }
            })
        }

        walk(&self.pages, key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.find(key).is_some()
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("page '{0}' has an empty key")]
    EmptyKey(String),

    #[error("page key '{0}' is declared more than once")]
    DuplicateKey(String),

    #[error("invalid catalog document: {0}")]
    Json(#[from] serde_json::Error),
}
