#![allow(dead_code)]

pub mod builders;
pub mod db;

pub use builders::{MenuItemBuilder, RoleBuilder};
pub use db::{seed_scenario, Scenario, TestDb};

use std::path::Path;
use std::sync::Arc;

use menu_cache::cache::MenuCache;
use menu_cache::menu::Overrides;
use menu_cache::snapshot::SnapshotStore;
use sea_orm::DatabaseConnection;

/// A cache over `db` whose snapshot lives in `dir`.
pub fn cache_in(dir: &Path, db: &DatabaseConnection, seed: Overrides) -> Arc<MenuCache> {
    Arc::new(MenuCache::new(
        SnapshotStore::new(dir.join("masters").join("menu_cache.json")),
        Arc::new(db.clone()),
        seed,
    ))
}
