//! Browser tab source collaborator.
//!
//! The tab APIs themselves live in the excluded extension layer; this
//! module defines the contract the core consumes plus the capture and
//! duplicate-cleanup flows built on it.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::entity::{TabItem, UserSettings};
use crate::error::Result;
use crate::storage::Vault;

/// A live browser tab, shaped like [`TabItem`] minus persistence fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSnapshot {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub favicon: Option<String>,
}

/// Contract for the host's tab API.
pub trait TabSource {
    fn list_tabs(&self) -> Result<Vec<TabSnapshot>>;
    fn activate_tab(&self, tab_id: &str) -> Result<()>;
    fn close_tab(&self, tab_id: &str) -> Result<()>;
}

impl TabItem {
    /// Stamp a snapshot with a fresh id and capture time.
    pub fn from_snapshot(snapshot: &TabSnapshot) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: snapshot.title.clone(),
            url: snapshot.url.clone(),
            favicon: snapshot.favicon.clone(),
            description: None,
            created_at: Some(Utc::now()),
            preview_image_auto_url: None,
            preview_image_user_data_url: None,
        }
    }
}

/// Save an open tab into a collection, closing the source tab when the
/// user's `auto_close_tab` preference is set. Returns the stored item.
pub fn capture_tab(
    vault: &Vault,
    source: &dyn TabSource,
    collection_id: &str,
    snapshot: &TabSnapshot,
    settings: &UserSettings,
) -> Result<TabItem> {
    let item = TabItem::from_snapshot(snapshot);
    vault.add_item(collection_id, item.clone())?;

    if settings.auto_close_tab {
        source.close_tab(&snapshot.id)?;
    }

    Ok(item)
}

/// Group open tabs by URL, keeping only URLs with more than one tab.
pub fn find_duplicate_tabs(tabs: &[TabSnapshot]) -> HashMap<String, Vec<TabSnapshot>> {
    let mut by_url: HashMap<String, Vec<TabSnapshot>> = HashMap::new();
    for tab in tabs {
        if let Some(url) = &tab.url {
            by_url.entry(url.clone()).or_default().push(tab.clone());
        }
    }

    by_url.retain(|_, tabs| tabs.len() > 1);
    by_url
}

/// Close every duplicate of each URL, keeping the first tab per group.
/// Returns the number of tabs closed.
pub fn close_duplicate_tabs(source: &dyn TabSource) -> Result<usize> {
    let tabs = source.list_tabs()?;
    let duplicates = find_duplicate_tabs(&tabs);

    let mut closed = 0;
    for (_, group) in duplicates {
        for tab in group.iter().skip(1) {
            source.close_tab(&tab.id)?;
            closed += 1;
        }
    }
    Ok(closed)
}
