use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Second-level grouping under a [`Category`](super::Category).
///
/// `category_id` is a required foreign key; referential integrity is
/// maintained procedurally by cascade delete, not checked at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub id: String,
    pub name: String,
    pub category_id: String,
    pub order: u32,
}

impl Space {
    pub fn new(name: impl Into<String>, category_id: impl Into<String>, order: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            category_id: category_id.into(),
            order,
        }
    }
}

/// Partial update for a space. `None` fields are retained as-is.
#[derive(Debug, Default, Clone)]
pub struct SpaceUpdate {
    pub name: Option<String>,
    pub category_id: Option<String>,
    pub order: Option<u32>,
}
