use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::entity::{
    Category, CollectionGroup, CollectionUpdate, ItemUpdate, LastSelected, Space, SpaceUpdate,
    TabItem, UserSettings,
};
use crate::error::{PlaytabError, Result};
use crate::storage::{keys, KvStore, StorageConfig};

/// The single store handle carrying every repository operation.
///
/// Each operation reads the whole relevant list from the KV store, mutates
/// it in memory, and writes the whole list back. There is no per-list
/// locking or versioning: two callers racing on the same list can lose one
/// write, an accepted limitation of the read-modify-write pattern. Cascade
/// deletes are multi-step and have no rollback; a failure between steps
/// leaves orphans that a later delete or reseed can clean up.
pub struct Vault {
    kv: Box<dyn KvStore>,
}

impl Vault {
    /// Open a vault over the configured backend.
    pub fn open(config: &StorageConfig) -> Result<Self> {
        Ok(Self { kv: config.open()? })
    }

    /// Wrap an already-constructed backend.
    pub fn with_store(kv: Box<dyn KvStore>) -> Self {
        Self { kv }
    }

    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        match self.kv.get(key)? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    fn write_list<T: Serialize>(&self, key: &str, list: &[T]) -> Result<()> {
        self.kv.set(key, serde_json::to_value(list)?)
    }

    // ========== Category Methods ==========

    /// List all categories, in stored order.
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        self.read_list(keys::CATEGORIES)
    }

    pub fn save_categories(&self, categories: &[Category]) -> Result<()> {
        self.write_list(keys::CATEGORIES, categories)
    }

    pub fn create_category(&self, category: Category) -> Result<()> {
        let mut categories = self.list_categories()?;
        categories.push(category);
        self.save_categories(&categories)
    }

    /// Replace a category by id. No-op when the id is not found.
    pub fn update_category(&self, updated: Category) -> Result<()> {
        let mut categories = self.list_categories()?;
        if let Some(existing) = categories.iter_mut().find(|c| c.id == updated.id) {
            *existing = updated;
            self.save_categories(&categories)?;
        }
        Ok(())
    }

    pub fn get_category(&self, id: &str) -> Result<Option<Category>> {
        let categories = self.list_categories()?;
        Ok(categories.into_iter().find(|c| c.id == id))
    }

    /// Delete a category and cascade to its spaces and their collections.
    ///
    /// Writes land in order: categories, then spaces, then collections,
    /// each as a full list write. A failure between writes leaves a
    /// transiently inconsistent but recoverable state.
    pub fn delete_category(&self, category_id: &str) -> Result<()> {
        let categories = self.list_categories()?;
        let remaining: Vec<Category> = categories
            .into_iter()
            .filter(|c| c.id != category_id)
            .collect();
        self.save_categories(&remaining)?;

        let spaces = self.list_spaces()?;
        let deleted_space_ids: Vec<String> = spaces
            .iter()
            .filter(|s| s.category_id == category_id)
            .map(|s| s.id.clone())
            .collect();
        let remaining_spaces: Vec<Space> = spaces
            .into_iter()
            .filter(|s| s.category_id != category_id)
            .collect();
        self.save_spaces(&remaining_spaces)?;

        if !deleted_space_ids.is_empty() {
            let collections = self.list_collections()?;
            let remaining_collections: Vec<CollectionGroup> = collections
                .into_iter()
                .filter(|c| !deleted_space_ids.contains(&c.space_id))
                .collect();
            self.save_collections(&remaining_collections)?;
        }

        tracing::debug!(
            category_id,
            cascaded_spaces = deleted_space_ids.len(),
            "deleted category"
        );
        Ok(())
    }

    /// Rewrite `order` to match the position in `ids`. Unknown ids are
    /// dropped; categories missing from `ids` are dropped too.
    pub fn reorder_categories(&self, ids: &[String]) -> Result<()> {
        let categories = self.list_categories()?;
        let reordered: Vec<Category> = ids
            .iter()
            .enumerate()
            .filter_map(|(index, id)| {
                categories.iter().find(|c| &c.id == id).map(|c| Category {
                    order: index as u32,
                    ..c.clone()
                })
            })
            .collect();
        self.save_categories(&reordered)
    }

    // ========== Space Methods ==========

    pub fn list_spaces(&self) -> Result<Vec<Space>> {
        self.read_list(keys::SPACES)
    }

    pub fn save_spaces(&self, spaces: &[Space]) -> Result<()> {
        self.write_list(keys::SPACES, spaces)
    }

    pub fn create_space(&self, space: Space) -> Result<()> {
        let mut spaces = self.list_spaces()?;
        spaces.push(space);
        self.save_spaces(&spaces)
    }

    /// Merge-update a space. Unspecified fields are retained; no-op when
    /// the id is not found.
    pub fn update_space(&self, space_id: &str, updates: SpaceUpdate) -> Result<()> {
        let mut spaces = self.list_spaces()?;
        if let Some(space) = spaces.iter_mut().find(|s| s.id == space_id) {
            if let Some(name) = updates.name {
                space.name = name;
            }
            if let Some(category_id) = updates.category_id {
                space.category_id = category_id;
            }
            if let Some(order) = updates.order {
                space.order = order;
            }
            self.save_spaces(&spaces)?;
        }
        Ok(())
    }

    /// Delete a space and cascade to its collections (one level).
    pub fn delete_space(&self, space_id: &str) -> Result<()> {
        let spaces = self.list_spaces()?;
        let remaining: Vec<Space> = spaces.into_iter().filter(|s| s.id != space_id).collect();
        self.save_spaces(&remaining)?;

        let collections = self.list_collections()?;
        let remaining_collections: Vec<CollectionGroup> = collections
            .into_iter()
            .filter(|c| c.space_id != space_id)
            .collect();
        self.save_collections(&remaining_collections)?;

        tracing::debug!(space_id, "deleted space");
        Ok(())
    }

    /// Spaces under a category, stable-sorted by `order`.
    pub fn spaces_by_category(&self, category_id: &str) -> Result<Vec<Space>> {
        let mut spaces: Vec<Space> = self
            .list_spaces()?
            .into_iter()
            .filter(|s| s.category_id == category_id)
            .collect();
        spaces.sort_by_key(|s| s.order);
        Ok(spaces)
    }

    // ========== Collection Methods ==========

    pub fn list_collections(&self) -> Result<Vec<CollectionGroup>> {
        self.read_list(keys::COLLECTIONS)
    }

    pub fn save_collections(&self, collections: &[CollectionGroup]) -> Result<()> {
        self.write_list(keys::COLLECTIONS, collections)
    }

    pub fn get_collection(&self, id: &str) -> Result<Option<CollectionGroup>> {
        let collections = self.list_collections()?;
        Ok(collections.into_iter().find(|c| c.id == id))
    }

    pub fn create_collection(&self, collection: CollectionGroup) -> Result<()> {
        let mut collections = self.list_collections()?;
        collections.push(collection);
        self.save_collections(&collections)
    }

    /// Merge-update a collection. Unspecified fields are retained; no-op
    /// when the id is not found.
    pub fn update_collection(&self, id: &str, updates: CollectionUpdate) -> Result<()> {
        let mut collections = self.list_collections()?;
        if let Some(collection) = collections.iter_mut().find(|c| c.id == id) {
            if let Some(title) = updates.title {
                collection.title = title;
            }
            if let Some(space_id) = updates.space_id {
                collection.space_id = space_id;
            }
            if let Some(is_open) = updates.is_open {
                collection.is_open = is_open;
            }
            self.save_collections(&collections)?;
        }
        Ok(())
    }

    /// Delete a collection. Items are embedded, so no further cascade.
    pub fn delete_collection(&self, id: &str) -> Result<()> {
        let collections = self.list_collections()?;
        let remaining: Vec<CollectionGroup> =
            collections.into_iter().filter(|c| c.id != id).collect();
        self.save_collections(&remaining)
    }

    /// Flip the expand/collapse flag and return the new state.
    pub fn toggle_open(&self, id: &str) -> Result<bool> {
        let mut collections = self.list_collections()?;
        let collection = collections
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| PlaytabError::NotFound(format!("collection {id}")))?;

        collection.is_open = !collection.is_open;
        let is_open = collection.is_open;
        self.save_collections(&collections)?;
        Ok(is_open)
    }

    // ========== Item Methods ==========

    pub fn add_item(&self, collection_id: &str, item: TabItem) -> Result<()> {
        let mut collections = self.list_collections()?;
        let collection = collections
            .iter_mut()
            .find(|c| c.id == collection_id)
            .ok_or_else(|| PlaytabError::NotFound(format!("collection {collection_id}")))?;

        collection.items.push(item);
        self.save_collections(&collections)
    }

    /// Remove an item by id. Removing an absent item is a no-op, not an
    /// error; an absent collection is.
    pub fn remove_item(&self, collection_id: &str, item_id: &str) -> Result<()> {
        let mut collections = self.list_collections()?;
        let collection = collections
            .iter_mut()
            .find(|c| c.id == collection_id)
            .ok_or_else(|| PlaytabError::NotFound(format!("collection {collection_id}")))?;

        collection.items.retain(|i| i.id != item_id);
        self.save_collections(&collections)
    }

    /// Merge-update an item. Unspecified fields are retained.
    pub fn update_item(
        &self,
        collection_id: &str,
        item_id: &str,
        updates: ItemUpdate,
    ) -> Result<()> {
        let mut collections = self.list_collections()?;
        let collection = collections
            .iter_mut()
            .find(|c| c.id == collection_id)
            .ok_or_else(|| PlaytabError::NotFound(format!("collection {collection_id}")))?;

        let item = collection
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| PlaytabError::NotFound(format!("item {item_id}")))?;

        if let Some(title) = updates.title {
            item.title = title;
        }
        if let Some(url) = updates.url {
            item.url = Some(url);
        }
        if let Some(favicon) = updates.favicon {
            item.favicon = Some(favicon);
        }
        if let Some(description) = updates.description {
            item.description = Some(description);
        }
        if let Some(auto_url) = updates.preview_image_auto_url {
            item.preview_image_auto_url = Some(auto_url);
        }
        if let Some(data_url) = updates.preview_image_user_data_url {
            item.preview_image_user_data_url = Some(data_url);
        }

        self.save_collections(&collections)
    }

    // ========== Settings Methods ==========

    pub fn user_settings(&self) -> Result<Option<UserSettings>> {
        match self.kv.get(keys::SETTINGS)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Stored settings, or the supplied defaults when none were saved yet.
    pub fn user_settings_or(&self, defaults: UserSettings) -> Result<UserSettings> {
        Ok(self.user_settings()?.unwrap_or(defaults))
    }

    pub fn set_user_settings(&self, settings: &UserSettings) -> Result<()> {
        self.kv.set(keys::SETTINGS, serde_json::to_value(settings)?)
    }

    // ========== Selection Memory ==========

    pub fn save_last_selected(&self, selection: &LastSelected) -> Result<()> {
        self.kv
            .set(keys::LAST_SELECTED, serde_json::to_value(selection)?)
    }

    pub fn last_selected(&self) -> Result<Option<LastSelected>> {
        match self.kv.get(keys::LAST_SELECTED)? {
            Some(Value::Null) | None => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    /// Resolve the remembered selection against current data.
    ///
    /// When the remembered category no longer exists, falls back to the
    /// first category by list order; when the remembered space no longer
    /// exists under the chosen category, falls back to its first space by
    /// `order`. Fields stay `None` when nothing is available.
    pub fn resolve_selection(&self) -> Result<LastSelected> {
        let remembered = self.last_selected()?.unwrap_or_default();
        let categories = self.list_categories()?;

        let category_id = remembered
            .category_id
            .filter(|id| categories.iter().any(|c| &c.id == id))
            .or_else(|| categories.first().map(|c| c.id.clone()));

        let space_id = match &category_id {
            Some(category_id) => {
                let spaces = self.spaces_by_category(category_id)?;
                remembered
                    .space_id
                    .filter(|id| spaces.iter().any(|s| &s.id == id))
                    .or_else(|| spaces.first().map(|s| s.id.clone()))
            }
            None => None,
        };

        Ok(LastSelected {
            category_id,
            space_id,
        })
    }

    // ========== First-Run Seeding ==========

    pub fn is_initialized(&self) -> Result<bool> {
        match self.kv.get(keys::INITIALIZED)? {
            Some(Value::Bool(flag)) => Ok(flag),
            _ => Ok(false),
        }
    }

    /// Seed the default categories exactly once. Safe to call on every
    /// startup.
    pub fn initialize(&self) -> Result<()> {
        if self.is_initialized()? {
            return Ok(());
        }

        if self.list_categories()?.is_empty() {
            self.save_categories(&[
                Category {
                    id: "cat-reading".to_string(),
                    name: "Reading".to_string(),
                    color: "#3B82F6".to_string(),
                    order: 0,
                },
                Category {
                    id: "cat-work".to_string(),
                    name: "Work".to_string(),
                    color: "#EF4444".to_string(),
                    order: 1,
                },
            ])?;
        }

        self.kv.set(keys::INITIALIZED, Value::Bool(true))?;
        tracing::info!("seeded default categories");
        Ok(())
    }
}
