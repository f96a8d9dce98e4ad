use crate::entities;
use crate::errors::MenuError;
use crate::menu::{MenuItem, MenuLink, Role};
use crate::settings::Database as DbCfg;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

/// Read access to the relational source of truth for roles, menu items and
/// role-menu links.
#[async_trait]
pub trait MenuSource: Send + Sync {
    /// All roles, ordered by id.
    async fn roles(&self) -> Result<Vec<Role>, MenuError>;
    /// All menu items, ordered by `(order_index, id)`.
    async fn menu_items(&self) -> Result<Vec<MenuItem>, MenuError>;
    /// All links, ordered by `(role_id, menu_id)`.
    async fn menu_links(&self) -> Result<Vec<MenuLink>, MenuError>;
}

pub async fn init(cfg: &DbCfg) -> Result<DatabaseConnection, MenuError> {
    let db = Database::connect(&cfg.url).await?;
    Ok(db)
}

#[async_trait]
impl MenuSource for DatabaseConnection {
    async fn roles(&self) -> Result<Vec<Role>, MenuError> {
        list_roles(self).await
    }

    async fn menu_items(&self) -> Result<Vec<MenuItem>, MenuError> {
        list_menu_items(self).await
    }

    async fn menu_links(&self) -> Result<Vec<MenuLink>, MenuError> {
        list_menu_links(self).await
    }
}

pub async fn list_roles(db: &DatabaseConnection) -> Result<Vec<Role>, MenuError> {
    use entities::role::{Column, Entity};

    let models = Entity::find().order_by_asc(Column::Id).all(db).await?;
    Ok(models.into_iter().map(role_from_model).collect())
}

pub async fn list_menu_items(db: &DatabaseConnection) -> Result<Vec<MenuItem>, MenuError> {
    use entities::menu_item::{Column, Entity};

    let models = Entity::find()
        .order_by_asc(Column::OrderIndex)
        .order_by_asc(Column::Id)
        .all(db)
        .await?;
    Ok(models.into_iter().map(menu_item_from_model).collect())
}

pub async fn list_menu_links(db: &DatabaseConnection) -> Result<Vec<MenuLink>, MenuError> {
    use entities::menu_in_role::{Column, Entity};

    let models = Entity::find()
        .order_by_asc(Column::RoleId)
        .order_by_asc(Column::MenuId)
        .all(db)
        .await?;
    Ok(models
        .into_iter()
        .map(|m| MenuLink {
            role_id: m.role_id,
            menu_id: m.menu_id,
        })
        .collect())
}

pub async fn get_role_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<Role>, MenuError> {
    use entities::role::{Column, Entity};

    let model = Entity::find().filter(Column::Name.eq(name)).one(db).await?;
    Ok(model.map(role_from_model))
}

pub async fn create_role(
    db: &DatabaseConnection,
    name: &str,
    description: Option<String>,
) -> Result<Role, MenuError> {
    let role = entities::role::ActiveModel {
        name: Set(name.to_string()),
        description: Set(description),
        is_active: Set(true),
        ..Default::default()
    };

    let model = role.insert(db).await?;
    Ok(role_from_model(model))
}

/// Input for [`create_menu_item`]; the id is assigned by the database.
#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub name: String,
    pub url: String,
    pub icon: Option<String>,
    pub order_index: i32,
    pub parent_id: Option<i64>,
    pub is_active: bool,
}

pub async fn create_menu_item(
    db: &DatabaseConnection,
    input: NewMenuItem,
) -> Result<MenuItem, MenuError> {
    let item = entities::menu_item::ActiveModel {
        name: Set(input.name),
        url: Set(input.url),
        icon: Set(input.icon),
        order_index: Set(input.order_index),
        parent_id: Set(input.parent_id),
        is_active: Set(input.is_active),
        ..Default::default()
    };

    let model = item.insert(db).await?;
    Ok(menu_item_from_model(model))
}

pub async fn set_menu_parent(
    db: &DatabaseConnection,
    menu_id: i64,
    parent_id: Option<i64>,
) -> Result<(), MenuError> {
    use entities::menu_item::Entity;

    if let Some(model) = Entity::find_by_id(menu_id).one(db).await? {
        let mut active: entities::menu_item::ActiveModel = model.into();
        active.parent_id = Set(parent_id);
        active.update(db).await?;
    }
    Ok(())
}

pub async fn grant_menu(
    db: &DatabaseConnection,
    role_id: i64,
    menu_id: i64,
) -> Result<(), MenuError> {
    let link = entities::menu_in_role::ActiveModel {
        role_id: Set(role_id),
        menu_id: Set(menu_id),
    };
    entities::menu_in_role::Entity::insert(link)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Create the `user` and `anonymous` roles when they are missing.
pub async fn ensure_default_roles(db: &DatabaseConnection) -> Result<u64, MenuError> {
    let mut created = 0;
    for (name, description) in [
        ("user", "Default role for every signed-in user"),
        ("anonymous", "Visitors who are not signed in"),
    ] {
        if get_role_by_name(db, name).await?.is_none() {
            create_role(db, name, Some(description.to_string())).await?;
            tracing::info!(role = name, "Created default role");
            created += 1;
        }
    }
    Ok(created)
}

fn role_from_model(m: entities::role::Model) -> Role {
    Role {
        id: m.id,
        name: m.name,
        description: m.description,
        is_active: m.is_active,
    }
}

fn menu_item_from_model(m: entities::menu_item::Model) -> MenuItem {
    MenuItem {
        id: m.id,
        name: m.name,
        url: m.url,
        icon: m.icon,
        order_index: m.order_index,
        parent_id: m.parent_id,
        is_active: m.is_active,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{Database, DatabaseConnection};
    use sea_orm_migration::MigratorTrait;
    use tempfile::NamedTempFile;

    /// Test database helper that keeps temp file alive
    struct TestDb {
        connection: DatabaseConnection,
        _temp_file: NamedTempFile,
    }

    impl TestDb {
        async fn new() -> Self {
            let temp_file = NamedTempFile::new().expect("Failed to create temp file");
            let db_path = temp_file.path().to_str().expect("Invalid temp file path");
            let db_url = format!("sqlite://{}?mode=rwc", db_path);

            let connection = Database::connect(&db_url)
                .await
                .expect("Failed to connect to test database");

            migration::Migrator::up(&connection, None)
                .await
                .expect("Failed to run migrations");

            Self {
                connection,
                _temp_file: temp_file,
            }
        }

        fn connection(&self) -> &DatabaseConnection {
            &self.connection
        }
    }

    fn new_item(name: &str, order_index: i32, parent_id: Option<i64>) -> NewMenuItem {
        NewMenuItem {
            name: name.to_string(),
            url: format!("/{}", name.to_lowercase()),
            icon: None,
            order_index,
            parent_id,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_create_and_list_roles() {
        let test_db = TestDb::new().await;
        let db = test_db.connection();

        let admin = create_role(db, "admin", None).await.expect("create admin");
        let user = create_role(db, "user", Some("Default".into()))
            .await
            .expect("create user");

        let roles = list_roles(db).await.expect("list roles");
        assert_eq!(roles.len(), 2);
        assert_eq!(roles[0].id, admin.id);
        assert_eq!(roles[1].id, user.id);
        assert_eq!(roles[1].description.as_deref(), Some("Default"));
        assert!(roles.iter().all(|r| r.is_active));
    }

    #[tokio::test]
    async fn test_menu_items_ordered_by_order_index_then_id() {
        let test_db = TestDb::new().await;
        let db = test_db.connection();

        let b = create_menu_item(db, new_item("B", 2, None)).await.unwrap();
        let a = create_menu_item(db, new_item("A", 1, None)).await.unwrap();
        let c = create_menu_item(db, new_item("C", 2, Some(a.id))).await.unwrap();

        let items = list_menu_items(db).await.expect("list items");
        let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![a.id, b.id, c.id]);
        assert_eq!(items[2].parent_id, Some(a.id));
    }

    #[tokio::test]
    async fn test_menu_links_ordered() {
        let test_db = TestDb::new().await;
        let db = test_db.connection();

        let r1 = create_role(db, "user", None).await.unwrap();
        let r2 = create_role(db, "admin", None).await.unwrap();
        let m1 = create_menu_item(db, new_item("Home", 0, None)).await.unwrap();
        let m2 = create_menu_item(db, new_item("Admin", 1, None)).await.unwrap();

        grant_menu(db, r2.id, m2.id).await.unwrap();
        grant_menu(db, r1.id, m2.id).await.unwrap();
        grant_menu(db, r1.id, m1.id).await.unwrap();

        let links = list_menu_links(db).await.unwrap();
        assert_eq!(
            links,
            vec![
                MenuLink { role_id: r1.id, menu_id: m1.id },
                MenuLink { role_id: r1.id, menu_id: m2.id },
                MenuLink { role_id: r2.id, menu_id: m2.id },
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_grant_fails() {
        let test_db = TestDb::new().await;
        let db = test_db.connection();

        let role = create_role(db, "user", None).await.unwrap();
        let menu = create_menu_item(db, new_item("Home", 0, None)).await.unwrap();
        grant_menu(db, role.id, menu.id).await.unwrap();

        assert!(grant_menu(db, role.id, menu.id).await.is_err());
    }

    #[tokio::test]
    async fn test_ensure_default_roles_is_idempotent() {
        let test_db = TestDb::new().await;
        let db = test_db.connection();

        assert_eq!(ensure_default_roles(db).await.unwrap(), 2);
        assert_eq!(ensure_default_roles(db).await.unwrap(), 0);

        assert!(get_role_by_name(db, "user").await.unwrap().is_some());
        assert!(get_role_by_name(db, "anonymous").await.unwrap().is_some());
        assert!(get_role_by_name(db, "sysadmin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_source_trait_over_connection() {
        let test_db = TestDb::new().await;
        let db = test_db.connection();

        let role = create_role(db, "user", None).await.unwrap();
        let menu = create_menu_item(db, new_item("Home", 0, None)).await.unwrap();
        grant_menu(db, role.id, menu.id).await.unwrap();

        let source: &dyn MenuSource = db;
        assert_eq!(source.roles().await.unwrap().len(), 1);
        assert_eq!(source.menu_items().await.unwrap()[0].name, "Home");
        assert_eq!(source.menu_links().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_set_menu_parent() {
        let test_db = TestDb::new().await;
        let db = test_db.connection();

        let a = create_menu_item(db, new_item("A", 0, None)).await.unwrap();
        let b = create_menu_item(db, new_item("B", 0, None)).await.unwrap();
        set_menu_parent(db, a.id, Some(b.id)).await.unwrap();

        let items = list_menu_items(db).await.unwrap();
        let a = items.iter().find(|i| i.id == a.id).unwrap();
        assert_eq!(a.parent_id, Some(b.id));
    }
}
