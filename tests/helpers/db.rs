use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tempfile::NamedTempFile;

/// Test database with automatic cleanup
pub struct TestDb {
    connection: DatabaseConnection,
    _temp_file: NamedTempFile,
}

impl TestDb {
    /// Create a new test database with migrations applied
    pub async fn new() -> Self {
        // Create temporary SQLite database file
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

    /// Get database connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }
}

/// Ids of the rows created by [`seed_scenario`].
#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    pub anonymous: i64,
    pub user: i64,
    pub admin: i64,
    pub home: i64,
    pub reports: i64,
}

/// Roles anonymous/user/admin, Home with child Reports. Anonymous sees Home,
/// user sees Home and Reports, admin sees nothing of its own.
pub async fn seed_scenario(db: &DatabaseConnection) -> Scenario {
    use super::builders::{MenuItemBuilder, RoleBuilder};

    let anonymous = RoleBuilder::new("anonymous").create(db).await;
    let user = RoleBuilder::new("user").create(db).await;
    let admin = RoleBuilder::new("admin").create(db).await;

    let home = MenuItemBuilder::new("Home", "/")
        .icon("home")
        .granted_to(anonymous.id)
        .granted_to(user.id)
        .create(db)
        .await;
    let reports = MenuItemBuilder::new("Reports", "/reports")
        .parent(home.id)
        .granted_to(user.id)
        .create(db)
        .await;

    Scenario {
        anonymous: anonymous.id,
        user: user.id,
        admin: admin.id,
        home: home.id,
        reports: reports.id,
    }
}
