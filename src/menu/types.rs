use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A role as persisted in the snapshot. The name doubles as a semantic key
/// ("user", "anonymous", "admin", "superadmin", "sysadmin").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// One navigable entry. `parent_id == None` means top-level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub icon: Option<String>,
    #[serde(default)]
    pub order_index: i32,
    pub parent_id: Option<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Grants visibility of one menu item to one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MenuLink {
    pub role_id: i64,
    pub menu_id: i64,
}

/// Email allowlists that elevate a user to the super/sys admin roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overrides {
    #[serde(default)]
    pub super_admin_emails: Vec<String>,
    #[serde(default)]
    pub sys_admin_emails: Vec<String>,
}

impl Overrides {
    /// Build overrides from two comma-separated lists.
    pub fn from_lists(super_admins: &str, sys_admins: &str) -> Self {
        Self {
            super_admin_emails: split_list(super_admins),
            sys_admin_emails: split_list(sys_admins),
        }
    }

    /// Trim every entry and drop the empty ones. Case is kept as written.
    pub fn cleaned(&self) -> Self {
        Self {
            super_admin_emails: clean(&self.super_admin_emails),
            sys_admin_emails: clean(&self.sys_admin_emails),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn clean(emails: &[String]) -> Vec<String> {
    emails
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}

/// The persisted document: last rebuilt state of roles, menus, links and
/// overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub roles: Vec<Role>,
    pub menu_items: Vec<MenuItem>,
    pub menu_in_roles: Vec<MenuLink>,
    #[serde(default)]
    pub overrides: Overrides,
}

/// A node of a resolved navigation tree. Children are owned; the parent is
/// looked up through [`crate::menu::MenuIndex::parent_of`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuNode {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub icon: Option<String>,
    pub order_index: i32,
    pub parent_id: Option<i64>,
    pub is_active: bool,
    pub children: Vec<MenuNode>,
}

impl MenuNode {
    pub(crate) fn leaf(item: &MenuItem) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            url: item.url.clone(),
            icon: item.icon.clone(),
            order_index: item.order_index,
            parent_id: item.parent_id,
            is_active: item.is_active,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub id: i64,
    pub name: String,
    pub url: String,
}

/// Everything the web layer needs to render navigation for one request.
#[derive(Debug, Clone, Serialize)]
pub struct Navigation {
    pub roles: Vec<i64>,
    pub menus: Vec<MenuNode>,
    pub active_menu_id: Option<i64>,
    pub breadcrumbs: Vec<Breadcrumb>,
}
