use std::collections::{BTreeSet, HashMap, HashSet};

use crate::errors::MenuError;
use crate::menu::tree::{active_item, flatten};
use crate::menu::types::*;

pub const DEFAULT_ROLE: &str = "user";
pub const ANONYMOUS_ROLE: &str = "anonymous";
pub const ADMIN_ROLE: &str = "admin";
pub const SUPER_ADMIN_ROLE: &str = "superadmin";
pub const SYS_ADMIN_ROLE: &str = "sysadmin";

/// Role ids resolved from the well-known role names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NamedRoles {
    pub default: Option<i64>,
    pub anonymous: Option<i64>,
    pub admin: Option<i64>,
    pub super_admin: Option<i64>,
    pub sys_admin: Option<i64>,
}

/// Immutable in-memory indices derived from one snapshot.
///
/// A new generation is built wholesale on every load or rebuild and swapped
/// in atomically by [`crate::cache::MenuCache`]; an index is never mutated
/// after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuIndex {
    snapshot: Snapshot,
    /// menu_id -> menu record
    pub(crate) menus: HashMap<i64, MenuItem>,
    /// role_id -> menu ids granted directly
    pub(crate) role_menus: HashMap<i64, BTreeSet<i64>>,
    named: NamedRoles,
    super_admin_emails: HashSet<String>,
    sys_admin_emails: HashSet<String>,
}

impl MenuIndex {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let menus: HashMap<i64, MenuItem> = snapshot
            .menu_items
            .iter()
            .map(|item| (item.id, item.clone()))
            .collect();

        let mut role_menus: HashMap<i64, BTreeSet<i64>> = HashMap::new();
        for link in &snapshot.menu_in_roles {
            role_menus.entry(link.role_id).or_default().insert(link.menu_id);
        }

        // Later rows win when two roles share a name.
        let mut named = NamedRoles::default();
        for role in &snapshot.roles {
            let slot = match role.name.to_lowercase().as_str() {
                DEFAULT_ROLE => &mut named.default,
                ANONYMOUS_ROLE => &mut named.anonymous,
                ADMIN_ROLE => &mut named.admin,
                SUPER_ADMIN_ROLE => &mut named.super_admin,
                SYS_ADMIN_ROLE => &mut named.sys_admin,
                _ => continue,
            };
            *slot = Some(role.id);
        }

        let super_admin_emails = normalize_emails(&snapshot.overrides.super_admin_emails);
        let sys_admin_emails = normalize_emails(&snapshot.overrides.sys_admin_emails);

        Self {
            snapshot,
            menus,
            role_menus,
            named,
            super_admin_emails,
            sys_admin_emails,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn roles(&self) -> &[Role] {
        &self.snapshot.roles
    }

    pub fn menu_items(&self) -> &[MenuItem] {
        &self.snapshot.menu_items
    }

    pub fn named_roles(&self) -> NamedRoles {
        self.named
    }

    pub fn anonymous_role_id(&self) -> Option<i64> {
        self.named.anonymous
    }

    pub fn menu(&self, menu_id: i64) -> Option<&MenuItem> {
        self.menus.get(&menu_id)
    }

    /// Parent lookup for a menu item; replaces a stored back-pointer.
    pub fn parent_of(&self, menu_id: i64) -> Option<i64> {
        self.menus.get(&menu_id).and_then(|m| m.parent_id)
    }

    /// Menu ids granted directly to `role_id`.
    pub fn granted_menus(&self, role_id: i64) -> Option<&BTreeSet<i64>> {
        self.role_menus.get(&role_id)
    }

    /// Map a user identity to the set of role ids whose menus it may see.
    /// `user_id == None` is an anonymous visitor.
    pub fn resolve_roles(
        &self,
        user_id: Option<i64>,
        email: Option<&str>,
        is_admin: bool,
    ) -> BTreeSet<i64> {
        let mut resolved = BTreeSet::new();

        if user_id.is_none() {
            resolved.extend(self.named.anonymous);
            return resolved;
        }

        resolved.extend(self.named.default);

        if is_admin {
            resolved.extend(self.named.admin);
        }

        let email = email.unwrap_or_default().trim().to_lowercase();
        if !email.is_empty() {
            if self.super_admin_emails.contains(&email) {
                resolved.extend(self.named.super_admin);
            }
            if self.sys_admin_emails.contains(&email) {
                resolved.extend(self.named.sys_admin);
            }
        }

        if resolved.is_empty() {
            resolved.extend(self.named.default);
        }

        resolved
    }

    /// Root-first chain from the top-level ancestor down to `menu_id`.
    ///
    /// The walk stops at the first inactive item, matching where
    /// [`MenuIndex::tree_for_roles`] cuts the tree.
    pub fn breadcrumbs(&self, menu_id: i64) -> Vec<Breadcrumb> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(menu_id);

        while let Some(id) = current {
            if !seen.insert(id) {
                break;
            }
            let Some(item) = self.menus.get(&id).filter(|m| m.is_active) else {
                break;
            };
            chain.push(Breadcrumb {
                id: item.id,
                name: item.name.clone(),
                url: item.url.clone(),
            });
            current = item.parent_id;
        }

        chain.reverse();
        chain
    }

    /// Resolve roles, build the tree and locate the item matching `path`.
    pub fn navigation(
        &self,
        user_id: Option<i64>,
        email: Option<&str>,
        is_admin: bool,
        path: Option<&str>,
    ) -> Navigation {
        let roles = self.resolve_roles(user_id, email, is_admin);
        let menus = self.tree_for_roles(roles.iter().copied());

        let active_menu_id = path.and_then(|p| active_item(&flatten(&menus), p).map(|n| n.id));
        let breadcrumbs = active_menu_id
            .map(|id| self.breadcrumbs(id))
            .unwrap_or_default();

        Navigation {
            roles: roles.into_iter().collect(),
            menus,
            active_menu_id,
            breadcrumbs,
        }
    }
}

fn normalize_emails(emails: &[String]) -> HashSet<String> {
    emails
        .iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Reject menu configurations whose parent chains loop back on themselves.
pub fn validate_menu_forest(items: &[MenuItem]) -> Result<(), MenuError> {
    let parents: HashMap<i64, Option<i64>> =
        items.iter().map(|item| (item.id, item.parent_id)).collect();
    let mut acyclic: HashSet<i64> = HashSet::new();

    for item in items {
        let mut path = Vec::new();
        let mut on_path = HashSet::new();
        let mut current = Some(item.id);

        while let Some(id) = current {
            if acyclic.contains(&id) {
                break;
            }
            if !on_path.insert(id) {
                let start = path.iter().position(|p| *p == id).unwrap_or(0);
                let cycle: Vec<String> = path[start..]
                    .iter()
                    .chain(std::iter::once(&id))
                    .map(|p: &i64| p.to_string())
                    .collect();
                return Err(MenuError::CyclicMenu(cycle.join(" -> ")));
            }
            path.push(id);
            current = parents.get(&id).copied().flatten();
        }

        acyclic.extend(path);
    }

    Ok(())
}
