//! Cloud sync reconciler.
//!
//! Optional bidirectional push/pull of collections and settings against an
//! account-scoped remote row store. Every remote read and write is scoped
//! to the authenticated user; conflicts resolve last-write-wins at the row
//! level.

mod memory;
mod rest;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{CollectionGroup, TabItem, UserSettings};
use crate::error::{PlaytabError, Result};

pub use memory::MemoryRemote;
pub use rest::RestRemote;

/// Remote row for one collection, scoped by user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub items: Vec<TabItem>,
    pub is_open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CollectionRow {
    pub fn from_group(user_id: &str, group: &CollectionGroup) -> Self {
        Self {
            id: group.id.clone(),
            user_id: user_id.to_string(),
            title: group.title.clone(),
            items: group.items.clone(),
            is_open: group.is_open,
            created_at: None,
            updated_at: None,
        }
    }

    /// The local shape drops the account scoping and row timestamps.
    /// `space_id` is not synced; the caller reattaches rows to a space.
    pub fn into_group(self) -> CollectionGroup {
        CollectionGroup {
            id: self.id,
            title: self.title,
            space_id: String::new(),
            items: self.items,
            is_open: self.is_open,
        }
    }
}

/// Remote settings singleton, one row per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsRow {
    pub user_id: String,
    pub settings: UserSettings,
}

/// Invoked with a fresh copy of the user's remote collections whenever
/// they change.
pub type CollectionsCallback = Box<dyn Fn(Vec<CollectionGroup>) + Send + Sync>;

/// Handle for a live-update subscription. Delivery stops on
/// [`unsubscribe`](Subscription::unsubscribe) or drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Account-scoped remote store for collections and settings.
///
/// Calls made without an authenticated session fail with
/// [`PlaytabError::AuthRequired`].
pub trait RemoteStore: Send + Sync {
    /// The authenticated user id, if any.
    fn current_user(&self) -> Result<Option<String>>;

    /// Full upsert keyed by collection id, scoped to the current user.
    fn push_collections(&self, collections: &[CollectionGroup]) -> Result<()>;

    /// All of the current user's collections, oldest first.
    fn pull_collections(&self) -> Result<Vec<CollectionGroup>>;

    fn delete_collection(&self, collection_id: &str) -> Result<()>;

    /// Upsert the settings singleton keyed by user.
    fn push_settings(&self, settings: &UserSettings) -> Result<()>;

    /// `None` when the user has never synced settings.
    fn pull_settings(&self) -> Result<Option<UserSettings>>;

    /// Re-fetches and invokes `callback` whenever the user's remote
    /// collections change. A convenience over the pull path, not a
    /// separate data path.
    fn subscribe_collections(
        &self,
        user_id: &str,
        callback: CollectionsCallback,
    ) -> Result<Subscription>;
}

/// The remote copy fetched during the pull phase. The reconciler does not
/// write it back to local storage; persisting it is the caller's decision.
#[derive(Debug, Clone, Default)]
pub struct PulledData {
    pub collections: Vec<CollectionGroup>,
    pub settings: Option<UserSettings>,
}

/// Structured outcome of a sync run. Errors never escape as `Err` past
/// the reconciler boundary.
#[derive(Debug, Default)]
pub struct SyncResult {
    pub success: bool,
    pub local_to_cloud: bool,
    pub cloud_to_local: bool,
    pub error: Option<String>,
    pub pulled: Option<PulledData>,
}

impl SyncResult {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Push local collections and settings to the remote, then pull both back.
///
/// The pulled copy is returned in [`SyncResult::pulled`]; reconciling it
/// into local storage is left to the caller.
pub fn perform_bidirectional_sync(
    remote: &dyn RemoteStore,
    local_collections: &[CollectionGroup],
    local_settings: Option<&UserSettings>,
) -> SyncResult {
    match sync_once(remote, local_collections, local_settings) {
        Ok(pulled) => SyncResult {
            success: true,
            local_to_cloud: true,
            cloud_to_local: true,
            error: None,
            pulled: Some(pulled),
        },
        Err(PlaytabError::AuthRequired) => SyncResult::failure("User not authenticated"),
        Err(e) => SyncResult::failure(e.to_string()),
    }
}

fn sync_once(
    remote: &dyn RemoteStore,
    local_collections: &[CollectionGroup],
    local_settings: Option<&UserSettings>,
) -> Result<PulledData> {
    let user = remote.current_user()?.ok_or(PlaytabError::AuthRequired)?;
    tracing::info!(user_id = %user, collections = local_collections.len(), "sync: push");

    remote.push_collections(local_collections)?;
    if let Some(settings) = local_settings {
        remote.push_settings(settings)?;
    }

    tracing::info!(user_id = %user, "sync: pull");
    let collections = remote.pull_collections()?;
    let settings = remote.pull_settings()?;

    Ok(PulledData {
        collections,
        settings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(id: &str, title: &str) -> CollectionGroup {
        CollectionGroup {
            id: id.to_string(),
            title: title.to_string(),
            space_id: "s1".to_string(),
            items: Vec::new(),
            is_open: true,
        }
    }

    #[test]
    fn test_sync_without_session_returns_structured_failure() {
        let remote = MemoryRemote::new();
        let result = perform_bidirectional_sync(&remote, &[collection("k1", "A")], None);

        assert!(!result.success);
        assert!(!result.local_to_cloud);
        assert!(!result.cloud_to_local);
        assert_eq!(result.error.as_deref(), Some("User not authenticated"));
        assert!(result.pulled.is_none());
    }

    #[test]
    fn test_sync_pushes_then_returns_pulled_copy() {
        let remote = MemoryRemote::new();
        remote.sign_in("user-1");

        let settings = UserSettings::default();
        let result =
            perform_bidirectional_sync(&remote, &[collection("k1", "A")], Some(&settings));

        assert!(result.success);
        assert!(result.local_to_cloud);
        assert!(result.cloud_to_local);

        let pulled = result.pulled.unwrap();
        assert_eq!(pulled.collections.len(), 1);
        assert_eq!(pulled.collections[0].id, "k1");
        assert_eq!(pulled.settings, Some(settings));
    }

    #[test]
    fn test_sync_upsert_overwrites_by_id() {
        let remote = MemoryRemote::new();
        remote.sign_in("user-1");

        perform_bidirectional_sync(&remote, &[collection("k1", "old title")], None);
        let result = perform_bidirectional_sync(&remote, &[collection("k1", "new title")], None);

        let pulled = result.pulled.unwrap();
        assert_eq!(pulled.collections.len(), 1);
        assert_eq!(pulled.collections[0].title, "new title");
    }
}
