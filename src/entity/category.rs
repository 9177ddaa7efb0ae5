use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Top-level grouping. Owns zero or more [`Space`](super::Space)s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
    pub order: u32,
}

impl Category {
    pub fn new(name: impl Into<String>, color: impl Into<String>, order: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            color: color.into(),
            order,
        }
    }
}
