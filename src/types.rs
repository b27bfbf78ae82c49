//! Core types for media-bundle

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// One downloaded media unit
///
/// `media` points at the file the downloader produced. Its name does not need
/// to match `title`; the placement step decides the final filename.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Display title, used as the filename stem after sanitization
    pub title: String,
    /// Already-downloaded media file
    pub media: PathBuf,
}

impl Item {
    /// Create a new item
    pub fn new(title: impl Into<String>, media: impl Into<PathBuf>) -> Self {
        Self {
            title: title.into(),
            media: media.into(),
        }
    }
}

/// A user's full set of collections, keyed by collection name
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBundle {
    /// User identifier, also the name of the user's folder and archive
    pub user_id: String,
    /// Collection name to its items
    #[serde(default)]
    pub collections: HashMap<String, Vec<Item>>,
}

impl UserBundle {
    /// Create an empty bundle for `user_id`
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            collections: HashMap::new(),
        }
    }

    /// Add (or replace) a collection
    pub fn with_collection(mut self, name: impl Into<String>, items: Vec<Item>) -> Self {
        self.collections.insert(name.into(), items);
        self
    }

    /// Total number of items across all collections
    pub fn item_count(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }
}

/// Where an item ended up after placement
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedItem {
    /// Title of the placed item
    pub title: String,
    /// Final path inside the collection folder
    pub path: PathBuf,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_bundle_builder() {
        let bundle = UserBundle::new("u1")
            .with_collection(
                "Road Trip",
                vec![Item::new("Song A", "/dl/a.mp3"), Item::new("Song B", "/dl/b.mp3")],
            )
            .with_collection("Empty", vec![]);

        assert_eq!(bundle.user_id, "u1");
        assert_eq!(bundle.collections.len(), 2);
        assert_eq!(bundle.item_count(), 2);
    }

    #[test]
    fn test_user_bundle_deserialize_without_collections() {
        let bundle: UserBundle = serde_json::from_str(r#"{"user_id": "u2"}"#).unwrap();
        assert_eq!(bundle, UserBundle::new("u2"));
    }
}
