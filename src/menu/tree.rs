use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::menu::index::MenuIndex;
use crate::menu::types::{MenuItem, MenuNode};

impl MenuIndex {
    /// Build the navigation forest visible to the union of `role_ids`.
    ///
    /// Every granted item pulls in its ancestor chain so it stays reachable
    /// from a root. Inactive items never become nodes. An active item whose
    /// parent is not a node (unknown id or inactive parent) is promoted to a
    /// root.
    pub fn tree_for_roles<I>(&self, role_ids: I) -> Vec<MenuNode>
    where
        I: IntoIterator<Item = i64>,
    {
        let mut granted = BTreeSet::new();
        for role_id in role_ids {
            if let Some(menus) = self.granted_menus(role_id) {
                granted.extend(menus.iter().copied());
            }
        }
        if granted.is_empty() {
            return Vec::new();
        }

        let expanded = self.with_ancestors(&granted);

        let visible: HashMap<i64, &MenuItem> = expanded
            .iter()
            .filter_map(|id| self.menus.get(id))
            .filter(|item| item.is_active)
            .map(|item| (item.id, item))
            .collect();

        let mut roots: Vec<&MenuItem> = Vec::new();
        let mut children: HashMap<i64, Vec<&MenuItem>> = HashMap::new();
        for &item in visible.values() {
            match item.parent_id {
                Some(parent) if visible.contains_key(&parent) => {
                    children.entry(parent).or_default().push(item);
                }
                // No visible parent: promoted to the top level.
                _ => roots.push(item),
            }
        }

        let mut forest: Vec<MenuNode> = roots
            .into_iter()
            .map(|item| assemble(item, &children))
            .collect();
        sort_siblings(&mut forest);
        forest
    }

    /// Tree for the anonymous role, or an empty forest when none is configured.
    pub fn anonymous_tree(&self) -> Vec<MenuNode> {
        match self.anonymous_role_id() {
            Some(role_id) => self.tree_for_roles([role_id]),
            None => Vec::new(),
        }
    }

    /// Granted ids plus every ancestor reachable through `parent_id`.
    /// Ids unknown to the index are skipped.
    fn with_ancestors(&self, granted: &BTreeSet<i64>) -> HashSet<i64> {
        let mut expanded = HashSet::new();

        for &menu_id in granted {
            let mut current = Some(menu_id);
            while let Some(id) = current {
                if expanded.contains(&id) {
                    break;
                }
                let Some(item) = self.menus.get(&id) else {
                    break;
                };
                expanded.insert(id);
                current = item.parent_id;
            }
        }

        expanded
    }
}

fn assemble(item: &MenuItem, children: &HashMap<i64, Vec<&MenuItem>>) -> MenuNode {
    let mut node = MenuNode::leaf(item);
    if let Some(kids) = children.get(&item.id) {
        node.children = kids.iter().map(|kid| assemble(kid, children)).collect();
        sort_siblings(&mut node.children);
    }
    node
}

fn sort_siblings(nodes: &mut [MenuNode]) {
    nodes.sort_by(sibling_order);
}

fn sibling_order(a: &MenuNode, b: &MenuNode) -> Ordering {
    a.order_index
        .cmp(&b.order_index)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.id.cmp(&b.id))
}

/// Pre-order traversal: every node precedes its (sorted) children.
pub fn flatten(forest: &[MenuNode]) -> Vec<&MenuNode> {
    let mut flat = Vec::new();
    for root in forest {
        collect(root, &mut flat);
    }
    flat
}

fn collect<'a>(node: &'a MenuNode, flat: &mut Vec<&'a MenuNode>) {
    flat.push(node);
    for child in &node.children {
        collect(child, flat);
    }
}

/// First node whose url is the request path, or a path prefix of it.
pub fn active_item<'a>(flat: &[&'a MenuNode], path: &str) -> Option<&'a MenuNode> {
    flat.iter().copied().find(|menu| {
        path == menu.url
            || (menu.url != "/"
                && path
                    .strip_prefix(menu.url.as_str())
                    .is_some_and(|rest| rest.starts_with('/')))
    })
}
