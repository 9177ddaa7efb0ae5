//! Import/export engine.
//!
//! Serializes the collection tree to a versioned, portable JSON document
//! and merges an imported document back using one of three strategies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{CollectionGroup, UserSettings};
use crate::error::{PlaytabError, Result};

pub const EXPORT_VERSION: &str = "1.0.0";

/// The portable export document.
///
/// `version` is a semantic marker for future format evolution; it is not
/// validated beyond presence on import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub collections: Vec<CollectionGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<UserSettings>,
}

/// Serialize collections (and optionally settings) to pretty-printed JSON.
pub fn export_to_json(
    collections: &[CollectionGroup],
    settings: Option<&UserSettings>,
) -> Result<String> {
    let data = ExportData {
        version: EXPORT_VERSION.to_string(),
        export_date: Utc::now(),
        collections: collections.to_vec(),
        settings: settings.copied(),
    };
    Ok(serde_json::to_string_pretty(&data)?)
}

/// Parse an import document.
///
/// Fails with [`PlaytabError::Parse`] when the text is not valid JSON,
/// `version` is absent, or `collections` is not an array.
pub fn parse_import_json(json: &str) -> Result<ExportData> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| PlaytabError::Parse(e.to_string()))?;

    let has_version = value.get("version").map_or(false, |v| !v.is_null());
    let has_collections = value.get("collections").map_or(false, |v| v.is_array());
    if !has_version || !has_collections {
        return Err(PlaytabError::Parse(
            "Invalid export file format".to_string(),
        ));
    }

    serde_json::from_value(value).map_err(|e| PlaytabError::Parse(e.to_string()))
}

/// Structural check on a parsed document. Advisory: returns human-readable
/// problems and leaves the import decision to the caller.
pub fn validate_import(data: &ExportData) -> Vec<String> {
    let mut errors = Vec::new();

    if data.version.is_empty() {
        errors.push("Missing version information".to_string());
    }

    for (index, collection) in data.collections.iter().enumerate() {
        if collection.id.is_empty() {
            errors.push(format!("Collection at index {index} is missing an ID"));
        }
        if collection.title.is_empty() {
            errors.push(format!("Collection at index {index} is missing a title"));
        }
    }

    errors
}

/// How an imported document combines with existing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Discard existing data, keep the imported document verbatim.
    Replace,
    /// Concatenate existing then imported. No deduplication; duplicate ids
    /// are possible.
    Append,
    /// Id is the merge key: matching existing entries are replaced in
    /// place (last-writer-wins), unmatched imported entries appended.
    Merge,
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeStrategy::Replace => write!(f, "replace"),
            MergeStrategy::Append => write!(f, "append"),
            MergeStrategy::Merge => write!(f, "merge"),
        }
    }
}

impl std::str::FromStr for MergeStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "replace" => Ok(MergeStrategy::Replace),
            "append" => Ok(MergeStrategy::Append),
            "merge" => Ok(MergeStrategy::Merge),
            _ => Err(format!("Invalid merge strategy: {}", s)),
        }
    }
}

/// Merge imported collections into existing ones. Pure function; the
/// caller persists the result.
pub fn merge_collections(
    existing: Vec<CollectionGroup>,
    imported: Vec<CollectionGroup>,
    strategy: MergeStrategy,
) -> Vec<CollectionGroup> {
    match strategy {
        MergeStrategy::Replace => imported,
        MergeStrategy::Append => {
            let mut merged = existing;
            merged.extend(imported);
            merged
        }
        MergeStrategy::Merge => {
            let mut merged = existing;
            for incoming in imported {
                match merged.iter_mut().find(|c| c.id == incoming.id) {
                    Some(slot) => *slot = incoming,
                    None => merged.push(incoming),
                }
            }
            merged
        }
    }
}
