use std::sync::Arc;
use std::time::SystemTime;

use arc_swap::ArcSwapOption;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::errors::MenuError;
use crate::menu::{validate_menu_forest, MenuIndex, Overrides, Snapshot};
use crate::snapshot::SnapshotStore;
use crate::storage::MenuSource;

/// Process-wide menu authorization cache.
///
/// Readers get the current [`MenuIndex`] without locking; load and rebuild
/// serialise on one mutex that also records the mtime of the snapshot the
/// current index was built from. Another process rewriting the snapshot is
/// picked up by the next [`MenuCache::ensure_cache`] call.
pub struct MenuCache {
    store: SnapshotStore,
    source: Arc<dyn MenuSource>,
    seed: Overrides,
    current: ArcSwapOption<MenuIndex>,
    /// mtime of the snapshot behind `current`
    loaded: Mutex<Option<SystemTime>>,
}

/// Outcome of a rebuild, for logging and job bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RebuildStats {
    pub roles: usize,
    pub menu_items: usize,
    pub links: usize,
}

impl MenuCache {
    /// `seed` holds the admin allowlists used only when no snapshot exists
    /// yet (or the existing one cannot be read).
    pub fn new(store: SnapshotStore, source: Arc<dyn MenuSource>, seed: Overrides) -> Self {
        Self {
            store,
            source,
            seed: seed.cleaned(),
            current: ArcSwapOption::empty(),
            loaded: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// The last loaded index, if any. Never touches the disk.
    pub fn current(&self) -> Option<Arc<MenuIndex>> {
        self.current.load_full()
    }

    /// Make sure the in-memory index matches the snapshot on disk.
    ///
    /// Rebuilds from the source when the snapshot is missing or unreadable,
    /// reloads it when its mtime changed, and otherwise returns the index
    /// already in memory.
    pub async fn ensure_cache(&self) -> Result<Arc<MenuIndex>, MenuError> {
        let mut loaded = self.loaded.lock().await;

        let mtime = match self.store.mtime()? {
            Some(mtime) => mtime,
            None => {
                tracing::info!(
                    path = %self.store.path().display(),
                    "Menu snapshot missing, building from database"
                );
                return self.rebuild_locked(&mut loaded).await.map(|(index, _)| index);
            }
        };

        if let (Some(index), Some(recorded)) = (self.current(), *loaded) {
            if recorded == mtime {
                return Ok(index);
            }
        }

        match self.load_locked(&mut loaded) {
            Ok(index) => Ok(index),
            Err(err @ (MenuError::SnapshotParse { .. } | MenuError::SnapshotRead { .. })) => {
                tracing::warn!(error = %err, "Menu snapshot unusable, rebuilding");
                self.rebuild_locked(&mut loaded).await.map(|(index, _)| index)
            }
            Err(err) => Err(err),
        }
    }

    /// Read the snapshot and replace the in-memory index with it.
    pub async fn load(&self) -> Result<Arc<MenuIndex>, MenuError> {
        let mut loaded = self.loaded.lock().await;
        self.load_locked(&mut loaded)
    }

    /// Regenerate the snapshot from the source of truth and swap in the new
    /// index. The admin allowlists stored in the existing snapshot are kept.
    pub async fn rebuild(&self) -> Result<RebuildStats, MenuError> {
        let mut loaded = self.loaded.lock().await;
        self.rebuild_locked(&mut loaded).await.map(|(_, stats)| stats)
    }

    fn load_locked(&self, loaded: &mut Option<SystemTime>) -> Result<Arc<MenuIndex>, MenuError> {
        // Take the mtime first: a concurrent writer then at worst causes one
        // extra reload on the next call.
        let mtime = self.store.mtime()?;
        let snapshot = self.store.read()?;
        let index = Arc::new(MenuIndex::from_snapshot(snapshot));

        self.current.store(Some(index.clone()));
        *loaded = mtime;

        tracing::debug!(
            roles = index.roles().len(),
            menu_items = index.menu_items().len(),
            "Loaded menu snapshot"
        );
        Ok(index)
    }

    async fn rebuild_locked(
        &self,
        loaded: &mut Option<SystemTime>,
    ) -> Result<(Arc<MenuIndex>, RebuildStats), MenuError> {
        let overrides = self.preserved_overrides();

        let mut roles = self.source.roles().await?;
        let mut menu_items = self.source.menu_items().await?;
        let mut menu_in_roles = self.source.menu_links().await?;

        roles.sort_by_key(|r| r.id);
        menu_items.sort_by_key(|m| (m.order_index, m.id));
        menu_in_roles.sort();
        menu_in_roles.dedup();

        validate_menu_forest(&menu_items)?;

        let snapshot = Snapshot {
            roles,
            menu_items,
            menu_in_roles,
            overrides,
        };
        let mtime = self.store.write(&snapshot)?;

        let stats = RebuildStats {
            roles: snapshot.roles.len(),
            menu_items: snapshot.menu_items.len(),
            links: snapshot.menu_in_roles.len(),
        };
        let index = Arc::new(MenuIndex::from_snapshot(snapshot));
        self.current.store(Some(index.clone()));
        *loaded = Some(mtime);

        tracing::info!(
            roles = stats.roles,
            menu_items = stats.menu_items,
            links = stats.links,
            path = %self.store.path().display(),
            "Rebuilt menu snapshot"
        );
        Ok((index, stats))
    }

    /// Overrides from the snapshot on disk, or the configured seed when there
    /// is no readable snapshot.
    fn preserved_overrides(&self) -> Overrides {
        if !self.store.exists() {
            return self.seed.clone();
        }
        match self.store.read() {
            Ok(existing) => existing.overrides.cleaned(),
            Err(err) => {
                tracing::warn!(error = %err, "Could not read overrides from snapshot, using configured seed");
                self.seed.clone()
            }
        }
    }
}
