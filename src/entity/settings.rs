use serde::{Deserialize, Serialize};

/// Flat user-preferences record. Singleton per installation/account;
/// callers read-modify-write the whole record to toggle a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub is_dark_mode: bool,
    pub open_cards_on_same_tab: bool,
    pub auto_close_tab: bool,
    pub remove_duplicate_tabs: bool,
    pub enable_shortcuts: bool,
    pub enable_tab_groups: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            is_dark_mode: false,
            open_cards_on_same_tab: false,
            auto_close_tab: true,
            remove_duplicate_tabs: false,
            enable_shortcuts: true,
            enable_tab_groups: false,
        }
    }
}

/// The most recent navigation state, persisted across sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastSelected {
    pub category_id: Option<String>,
    pub space_id: Option<String>,
}

impl LastSelected {
    pub fn new(category_id: impl Into<String>, space_id: impl Into<String>) -> Self {
        Self {
            category_id: Some(category_id.into()),
            space_id: Some(space_id.into()),
        }
    }
}
