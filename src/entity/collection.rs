use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A saved browser tab. Leaf value type, embedded inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabItem {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Scraped from the page's og:image / twitter:image, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_image_auto_url: Option<String>,
    /// User-uploaded preview, stored as a data URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_image_user_data_url: Option<String>,
}

impl TabItem {
    pub fn new(title: impl Into<String>, url: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            url,
            favicon: None,
            description: None,
            created_at: Some(Utc::now()),
            preview_image_auto_url: None,
            preview_image_user_data_url: None,
        }
    }
}

/// Named group of saved tabs under a [`Space`](super::Space).
///
/// Items are embedded, not separately stored; deleting a collection needs
/// no further cascade. `is_open` is persisted view state and defaults to
/// true at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionGroup {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub space_id: String,
    #[serde(default)]
    pub items: Vec<TabItem>,
    #[serde(default = "default_open")]
    pub is_open: bool,
}

fn default_open() -> bool {
    true
}

impl CollectionGroup {
    pub fn new(title: impl Into<String>, space_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            space_id: space_id.into(),
            items: Vec::new(),
            is_open: true,
        }
    }
}

/// Partial update for a collection. `None` fields are retained as-is.
#[derive(Debug, Default, Clone)]
pub struct CollectionUpdate {
    pub title: Option<String>,
    pub space_id: Option<String>,
    pub is_open: Option<bool>,
}

/// Partial update for an item inside a collection.
#[derive(Debug, Default, Clone)]
pub struct ItemUpdate {
    pub title: Option<String>,
    pub url: Option<String>,
    pub favicon: Option<String>,
    pub description: Option<String>,
    pub preview_image_auto_url: Option<String>,
    pub preview_image_user_data_url: Option<String>,
}
