// SPDX-License-Identifier: MIT OR Apache-2.0

use innkeep_core::{Icon, PageNode};
use serde::{Deserialize, Serialize};

/// Entry of the navigation menu as shown to one user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub key: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuEntry>,
}

/// Prunes the catalog down to the entries the user may view.
///
/// Walks the tree depth-first in declaration order. A node failing `is_visible` is dropped
/// together with its whole subtree, no matter what its children would answer. A group whose
/// children were all dropped is dropped as well. Only the key and the children of a node are
/// looked at, label and icon are copied over.
///
/// `is_visible` is expected to answer from already fetched grants (see `PermissionMap` or
/// `PermissionSession`), it is called once per visited node.
pub fn filter_visible<F>(nodes: &[PageNode], is_visible: F) -> Vec<MenuEntry>
where
    F: Fn(&str) -> bool,
{
    filter_nodes(nodes, &is_visible)
}

fn filter_nodes<F>(nodes: &[PageNode], is_visible: &F) -> Vec<MenuEntry>
where
    F: Fn(&str) -> bool,
{
    nodes
        .iter()
        .filter_map(|node| {
            if !is_visible(&node.key) {
                return None;
            }

            let children = filter_nodes(&node.children, is_visible);
            if node.is_group() && children.is_empty() {
                return None;
            }

            Some(MenuEntry {
                key: node.key.clone(),
                label: node.label.clone(),
                icon: node.icon,
                children,
            })
        })
        .collect()
}

/// Keys of all visible entries, depth-first in declaration order.
///
/// Same pruning rules as [`filter_visible`], flattened for consumers which render a plain list.
pub fn visible_keys<F>(nodes: &[PageNode], is_visible: F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    fn flatten(entries: Vec<MenuEntry>, keys: &mut Vec<String>) {
        for entry in entries {
            keys.push(entry.key);
            flatten(entry.children, keys);
        }
    }

    let mut keys = Vec::new();
    flatten(filter_visible(nodes, is_visible), &mut keys);
    keys
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;

    use innkeep_core::{Action, Flags, PageCatalog, PageNode, PermissionRecord};

    use crate::PermissionMap;

    use super::{filter_visible, visible_keys};

    fn hidden(keys: &[&str]) -> impl Fn(&str) -> bool {
        let hidden: HashSet<String> = keys.iter().map(|key| key.to_string()).collect();
        move |key: &str| !hidden.contains(key)
    }

    fn catalog() -> PageCatalog {
        PageCatalog::new(
            1,
            vec![
                PageNode::page("dashboard", "Dashboard"),
                PageNode::group(
                    "purchases",
                    "Purchases",
                    [
                        PageNode::page("purchases_xml", "Import invoice"),
                        PageNode::page("purchases_view", "Purchase history"),
                    ],
                ),
                PageNode::group(
                    "settings",
                    "Settings",
                    [PageNode::group(
                        "access",
                        "Access",
                        [PageNode::page("users", "Users")],
                    )],
                ),
                PageNode::page("suppliers", "Suppliers"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn everything_visible_keeps_the_tree() {
        let catalog = catalog();
        let keys = visible_keys(catalog.nodes(), |_| true);
        assert_eq!(keys, catalog.keys());

        let menu = filter_visible(catalog.nodes(), |_| true);
        assert_eq!(menu.len(), 4);
        assert_eq!(menu[1].label, "Purchases");
        assert_eq!(menu[1].children.len(), 2);
    }

    #[test]
    fn hidden_parent_hides_descendants() {
        let catalog = catalog();
        let keys = visible_keys(catalog.nodes(), hidden(&["purchases"]));
        assert_eq!(keys, vec!["dashboard", "settings", "access", "users", "suppliers"]);
    }

    #[test]
    fn hidden_parent_is_not_asked_about_children() {
        let catalog = catalog();
        let asked = RefCell::new(Vec::new());

        filter_visible(catalog.nodes(), |key| {
            asked.borrow_mut().push(key.to_string());
            key != "purchases"
        });

        let asked = asked.into_inner();
        assert!(asked.contains(&"purchases".to_string()));
        assert!(!asked.contains(&"purchases_xml".to_string()));
        assert!(!asked.contains(&"purchases_view".to_string()));
    }

    #[test]
    fn group_without_visible_children_is_omitted() {
        let catalog = catalog();
        let menu = filter_visible(
            catalog.nodes(),
            hidden(&["purchases_xml", "purchases_view"]),
        );
        let keys: Vec<&str> = menu.iter().map(|entry| entry.key.as_str()).collect();
        assert_eq!(keys, vec!["dashboard", "settings", "suppliers"]);

        // Pruning cascades upwards through nested groups.
        let keys = visible_keys(catalog.nodes(), hidden(&["users"]));
        assert_eq!(
            keys,
            vec!["dashboard", "purchases", "purchases_xml", "purchases_view", "suppliers"]
        );
    }

    #[test]
    fn partially_visible_group_keeps_order() {
        let catalog = catalog();
        let menu = filter_visible(catalog.nodes(), hidden(&["purchases_xml"]));
        let purchases = &menu[1];
        assert_eq!(purchases.key, "purchases");
        let children: Vec<&str> = purchases
            .children
            .iter()
            .map(|entry| entry.key.as_str())
            .collect();
        assert_eq!(children, vec!["purchases_view"]);
    }

    #[test]
    fn purchases_hidden_by_grant() {
        let catalog = PageCatalog::builtin();
        let map = PermissionMap::from_records([
            PermissionRecord::new(
                1u64,
                "purchases",
                Flags::allow_all().with(Action::View, false),
            ),
            // Explicitly visible children don't bring back a hidden parent.
            PermissionRecord::new(1u64, "purchases_xml", Flags::allow_all()),
            PermissionRecord::new(1u64, "purchases_view", Flags::allow_all()),
        ]);

        let keys = visible_keys(catalog.nodes(), |key| map.can(key, Action::View));
        for key in ["purchases", "purchases_xml", "purchases_view"] {
            assert!(!keys.contains(&key.to_string()));
        }
        assert!(keys.contains(&"units".to_string()));
        assert_eq!(keys.len(), catalog.keys().len() - 3);
    }

    #[test]
    fn serialized_for_the_ui() {
        let catalog = catalog();
        let menu = filter_visible(catalog.nodes(), hidden(&["settings", "purchases_xml"]));
        let json = serde_json::to_value(&menu).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "key": "dashboard", "label": "Dashboard" },
                {
                    "key": "purchases",
                    "label": "Purchases",
                    "children": [{ "key": "purchases_view", "label": "Purchase history" }]
                },
                { "key": "suppliers", "label": "Suppliers" }
            ])
        );
    }
}
