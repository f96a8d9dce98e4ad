use menu_cache::menu::{MenuItem, Role};
use menu_cache::storage::{self, NewMenuItem};
use sea_orm::DatabaseConnection;

/// Builder for creating test roles
pub struct RoleBuilder {
    name: String,
    description: Option<String>,
}

impl RoleBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub async fn create(self, db: &DatabaseConnection) -> Role {
        storage::create_role(db, &self.name, self.description)
            .await
            .expect("Failed to create test role")
    }
}

/// Builder for creating test menu items together with their role grants
pub struct MenuItemBuilder {
    item: NewMenuItem,
    roles: Vec<i64>,
}

impl MenuItemBuilder {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            item: NewMenuItem {
                name: name.to_string(),
                url: url.to_string(),
                icon: None,
                order_index: 0,
                parent_id: None,
                is_active: true,
            },
            roles: Vec::new(),
        }
    }

    pub fn icon(mut self, icon: &str) -> Self {
        self.item.icon = Some(icon.to_string());
        self
    }

    pub fn order(mut self, order_index: i32) -> Self {
        self.item.order_index = order_index;
        self
    }

    pub fn parent(mut self, parent_id: i64) -> Self {
        self.item.parent_id = Some(parent_id);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.item.is_active = false;
        self
    }

    pub fn granted_to(mut self, role_id: i64) -> Self {
        self.roles.push(role_id);
        self
    }

    pub async fn create(self, db: &DatabaseConnection) -> MenuItem {
        let item = storage::create_menu_item(db, self.item)
            .await
            .expect("Failed to create test menu item");

        for role_id in self.roles {
            storage::grant_menu(db, role_id, item.id)
                .await
                .expect("Failed to grant test menu item");
        }

        item
    }
}
