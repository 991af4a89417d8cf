use serde::{Deserialize, Serialize};
use std::fmt;

/// Metadata for one reward in the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardCatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Static mapping of valid reward identifiers to metadata.
/// Loaded once at startup and read-only at runtime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardCatalog {
    pub version: String,
    pub last_updated: String,
    pub rewards: Vec<RewardCatalogEntry>,
}

impl RewardCatalog {
    /// Parse a catalog from its JSON document, rejecting empty and duplicate ids.
    pub fn from_json(json: &str) -> Result<Self, CatalogParseError> {
        let catalog: RewardCatalog = serde_json::from_str(json)?;
        for (i, entry) in catalog.rewards.iter().enumerate() {
            if entry.id.trim().is_empty() {
                return Err(CatalogParseError::EmptyId { index: i });
            }
            if catalog.rewards[..i].iter().any(|e| e.id == entry.id) {
                return Err(CatalogParseError::DuplicateId {
                    id: entry.id.clone(),
                });
            }
        }
        Ok(catalog)
    }

    pub fn is_valid(&self, reward_id: &str) -> bool {
        self.describe(reward_id).is_some()
    }

    pub fn describe(&self, reward_id: &str) -> Option<&RewardCatalogEntry> {
        self.rewards.iter().find(|e| e.id == reward_id)
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }
}

/// Error parsing a reward catalog document.
#[derive(Debug)]
pub enum CatalogParseError {
    Json(serde_json::Error),
    EmptyId { index: usize },
    DuplicateId { id: String },
}

impl fmt::Display for CatalogParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogParseError::Json(e) => write!(f, "invalid catalog JSON: {}", e),
            CatalogParseError::EmptyId { index } => {
                write!(f, "catalog entry {} has an empty id", index)
            }
            CatalogParseError::DuplicateId { id } => {
                write!(f, "catalog contains duplicate reward id {:?}", id)
            }
        }
    }
}

impl std::error::Error for CatalogParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogParseError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CatalogParseError {
    fn from(e: serde_json::Error) -> Self {
        CatalogParseError::Json(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG_JSON: &str = r#"{
        "version": "1.0",
        "lastUpdated": "2026-01-15",
        "rewards": [
            {"id": "first_capture", "name": "First Capture", "description": "Capture your first objective", "category": "combat"},
            {"id": "perfect_game", "name": "Perfect Game", "description": "Win without taking damage"}
        ]
    }"#;

    #[test]
    fn parses_and_validates_ids() {
        let catalog = RewardCatalog::from_json(CATALOG_JSON).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.is_valid("first_capture"));
        assert!(!catalog.is_valid("bogus_id"));
        assert_eq!(
            catalog.describe("perfect_game").map(|e| e.name.as_str()),
            Some("Perfect Game")
        );
    }

    #[test]
    fn rejects_duplicate_ids() {
        let json = r#"{
            "version": "1.0",
            "lastUpdated": "2026-01-15",
            "rewards": [
                {"id": "a", "name": "A"},
                {"id": "a", "name": "A again"}
            ]
        }"#;
        let err = RewardCatalog::from_json(json).unwrap_err();
        assert!(matches!(err, CatalogParseError::DuplicateId { .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            RewardCatalog::from_json("not json"),
            Err(CatalogParseError::Json(_))
        ));
    }
}
