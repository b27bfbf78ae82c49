//! Configuration types for media-bundle

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for [`BundleBuilder`](crate::BundleBuilder)
///
/// Every field has a serde default, so an empty JSON object deserializes to
/// [`BundleConfig::default()`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BundleConfig {
    /// Shared downloads directory holding every user's tree (default: "./tmp")
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Maximum number of collections materialized at once (default: 4)
    #[serde(default = "default_max_concurrent_collections")]
    pub max_concurrent_collections: usize,

    /// What to do when an item's destination file already exists
    #[serde(default)]
    pub file_collision: FileCollisionAction,

    /// Extension used when an item's media file has none (default: "mp3")
    #[serde(default = "default_extension")]
    pub default_extension: String,

    /// Size of the buffer used to stream file contents into the archive (default: 64 KiB)
    #[serde(default = "default_copy_buffer_size")]
    pub copy_buffer_size: usize,

    /// Deflate level 0-9 (None = library default)
    #[serde(default)]
    pub compression_level: Option<i32>,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            max_concurrent_collections: default_max_concurrent_collections(),
            file_collision: FileCollisionAction::default(),
            default_extension: default_extension(),
            copy_buffer_size: default_copy_buffer_size(),
            compression_level: None,
        }
    }
}

impl BundleConfig {
    /// Create a config rooted at `base_dir` with every other setting at its default
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Default::default()
        }
    }

    /// Check settings that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_collections == 0 {
            return Err(config_error(
                "max_concurrent_collections must be at least 1",
                "max_concurrent_collections",
            ));
        }

        if self.copy_buffer_size == 0 {
            return Err(config_error(
                "copy_buffer_size must be at least 1 byte",
                "copy_buffer_size",
            ));
        }

        let ext = self.default_extension.trim_start_matches('.');
        if ext.is_empty() || ext.contains(['/', '\\', '.']) {
            return Err(config_error(
                format!(
                    "default_extension {:?} must be a single non-empty extension",
                    self.default_extension
                ),
                "default_extension",
            ));
        }

        if let Some(level) = self.compression_level
            && !(0..=9).contains(&level)
        {
            return Err(config_error(
                format!("compression_level {level} is outside 0..=9"),
                "compression_level",
            ));
        }

        Ok(())
    }
}

fn config_error(message: impl Into<String>, key: &str) -> Error {
    Error::Config {
        message: message.into(),
        key: Some(key.to_string()),
    }
}

/// File collision handling strategy when placing items
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCollisionAction {
    /// Replace the existing file (default, keeps rebuilds idempotent)
    #[default]
    Overwrite,
    /// Append (1), (2), etc. to the filename
    Rename,
    /// Refuse to place the item
    Skip,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("./tmp")
}

fn default_max_concurrent_collections() -> usize {
    4
}

fn default_extension() -> String {
    "mp3".to_string()
}

fn default_copy_buffer_size() -> usize {
    64 * 1024
}
