//! # Item Store
//!
//! The persistence seam for inventory and shopping-list records, keyed by
//! user. [`crate::db::PgStore`] backs it with PostgreSQL. [`FileStore`]
//! keeps a local JSON file and is used when no database is configured;
//! [`MemoryStore`] keeps everything in process.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::kitchen_model::{InventoryItem, NewInventoryItem, ShoppingItem};

/// Per-user inventory and shopping-list storage
///
/// Each call is an independent request. Nothing here is transactional across
/// calls.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn list_inventory(&self, user_id: Uuid) -> Result<Vec<InventoryItem>>;

    async fn add_inventory_item(&self, user_id: Uuid, item: NewInventoryItem) -> Result<InventoryItem>;

    /// Returns whether an item was removed
    async fn delete_inventory_item(&self, user_id: Uuid, item_id: Uuid) -> Result<bool>;

    /// Returns the number of items removed
    async fn batch_delete_inventory(&self, user_id: Uuid, item_ids: &[Uuid]) -> Result<u64>;

    /// Newest first
    async fn list_shopping(&self, user_id: Uuid) -> Result<Vec<ShoppingItem>>;

    async fn add_shopping_item(&self, user_id: Uuid, name: &str) -> Result<ShoppingItem>;

    /// Returns whether an item was updated
    async fn set_shopping_checked(&self, user_id: Uuid, item_id: Uuid, checked: bool) -> Result<bool>;

    /// Returns whether an item was removed
    async fn delete_shopping_item(&self, user_id: Uuid, item_id: Uuid) -> Result<bool>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserItems {
    #[serde(default)]
    inventory: Vec<InventoryItem>,
    #[serde(default)]
    shopping: Vec<ShoppingItem>,
}

impl UserItems {
    fn add_inventory(&mut self, item: NewInventoryItem) -> InventoryItem {
        let stored = item.into_item(Uuid::new_v4());
        self.inventory.insert(0, stored.clone());
        stored
    }

    fn delete_inventory(&mut self, item_ids: &[Uuid]) -> u64 {
        let before = self.inventory.len();
        self.inventory.retain(|i| !item_ids.contains(&i.id));
        (before - self.inventory.len()) as u64
    }

    fn add_shopping(&mut self, name: &str) -> ShoppingItem {
        let item = ShoppingItem::new(name);
        self.shopping.insert(0, item.clone());
        item
    }

    fn set_checked(&mut self, item_id: Uuid, checked: bool) -> bool {
        match self.shopping.iter_mut().find(|i| i.id == item_id) {
            Some(item) => {
                item.is_checked = checked;
                true
            }
            None => false,
        }
    }

    fn delete_shopping(&mut self, item_id: Uuid) -> bool {
        let before = self.shopping.len();
        self.shopping.retain(|i| i.id != item_id);
        self.shopping.len() < before
    }
}

/// In-process store; contents are lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<Uuid, UserItems>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn list_inventory(&self, user_id: Uuid) -> Result<Vec<InventoryItem>> {
        let users = self.users.lock().await;
        Ok(users
            .get(&user_id)
            .map(|u| u.inventory.clone())
            .unwrap_or_default())
    }

    async fn add_inventory_item(&self, user_id: Uuid, item: NewInventoryItem) -> Result<InventoryItem> {
        let mut users = self.users.lock().await;
        let stored = users.entry(user_id).or_default().add_inventory(item);
        debug!(user_id = %user_id, item_id = %stored.id, "Inventory item added");
        Ok(stored)
    }

    async fn delete_inventory_item(&self, user_id: Uuid, item_id: Uuid) -> Result<bool> {
        let mut users = self.users.lock().await;
        Ok(users
            .get_mut(&user_id)
            .is_some_and(|u| u.delete_inventory(&[item_id]) > 0))
    }

    async fn batch_delete_inventory(&self, user_id: Uuid, item_ids: &[Uuid]) -> Result<u64> {
        if item_ids.is_empty() {
            return Ok(0);
        }
        let mut users = self.users.lock().await;
        Ok(users
            .get_mut(&user_id)
            .map(|u| u.delete_inventory(item_ids))
            .unwrap_or(0))
    }

    async fn list_shopping(&self, user_id: Uuid) -> Result<Vec<ShoppingItem>> {
        let users = self.users.lock().await;
        Ok(users
            .get(&user_id)
            .map(|u| u.shopping.clone())
            .unwrap_or_default())
    }

    async fn add_shopping_item(&self, user_id: Uuid, name: &str) -> Result<ShoppingItem> {
        let mut users = self.users.lock().await;
        Ok(users.entry(user_id).or_default().add_shopping(name))
    }

    async fn set_shopping_checked(&self, user_id: Uuid, item_id: Uuid, checked: bool) -> Result<bool> {
        let mut users = self.users.lock().await;
        Ok(users
            .get_mut(&user_id)
            .is_some_and(|u| u.set_checked(item_id, checked)))
    }

    async fn delete_shopping_item(&self, user_id: Uuid, item_id: Uuid) -> Result<bool> {
        let mut users = self.users.lock().await;
        Ok(users
            .get_mut(&user_id)
            .is_some_and(|u| u.delete_shopping(item_id)))
    }
}

/// Local JSON file store, used when no database is configured
///
/// Every call reads the file, applies one change and writes it back, so
/// separate processes see each other's changes. A missing file is an empty
/// store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<Uuid, UserItems>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read local store {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse local store {}", self.path.display()))
    }

    fn save(&self, users: &HashMap<Uuid, UserItems>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(users).context("Failed to serialize local store")?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write local store {}", self.path.display()))
    }

    async fn read<T>(&self, user_id: Uuid, f: impl FnOnce(&UserItems) -> T) -> Result<T> {
        let _guard = self.lock.lock().await;
        let users = self.load()?;
        Ok(f(users.get(&user_id).unwrap_or(&UserItems::default())))
    }

    async fn update<T>(&self, user_id: Uuid, f: impl FnOnce(&mut UserItems) -> T) -> Result<T> {
        let _guard = self.lock.lock().await;
        let mut users = self.load()?;
        let result = f(users.entry(user_id).or_default());
        self.save(&users)?;
        Ok(result)
    }
}

#[async_trait]
impl ItemStore for FileStore {
    async fn list_inventory(&self, user_id: Uuid) -> Result<Vec<InventoryItem>> {
        self.read(user_id, |u| u.inventory.clone()).await
    }

    async fn add_inventory_item(&self, user_id: Uuid, item: NewInventoryItem) -> Result<InventoryItem> {
        let stored = self.update(user_id, |u| u.add_inventory(item)).await?;
        debug!(user_id = %user_id, item_id = %stored.id, "Inventory item added");
        Ok(stored)
    }

    async fn delete_inventory_item(&self, user_id: Uuid, item_id: Uuid) -> Result<bool> {
        Ok(self.update(user_id, |u| u.delete_inventory(&[item_id])).await? > 0)
    }

    async fn batch_delete_inventory(&self, user_id: Uuid, item_ids: &[Uuid]) -> Result<u64> {
        if item_ids.is_empty() {
            return Ok(0);
        }
        self.update(user_id, |u| u.delete_inventory(item_ids)).await
    }

    async fn list_shopping(&self, user_id: Uuid) -> Result<Vec<ShoppingItem>> {
        self.read(user_id, |u| u.shopping.clone()).await
    }

    async fn add_shopping_item(&self, user_id: Uuid, name: &str) -> Result<ShoppingItem> {
        self.update(user_id, |u| u.add_shopping(name)).await
    }

    async fn set_shopping_checked(&self, user_id: Uuid, item_id: Uuid, checked: bool) -> Result<bool> {
        self.update(user_id, |u| u.set_checked(item_id, checked)).await
    }

    async fn delete_shopping_item(&self, user_id: Uuid, item_id: Uuid) -> Result<bool> {
        self.update(user_id, |u| u.delete_shopping(item_id)).await
    }
}

/// Snapshot of a user's inventory taken immediately before a reconciliation pass
pub async fn inventory_snapshot(store: &dyn ItemStore, user_id: Uuid) -> Result<Vec<InventoryItem>> {
    store
        .list_inventory(user_id)
        .await
        .context("Failed to load inventory snapshot")
}
