//! Path resolution for user roots, collection folders and archives
//!
//! All functions here are pure: they validate identifiers and join them onto
//! the configured base directory without touching the filesystem.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Extension of the produced archive file
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Computes canonical on-disk locations from a single base directory
#[derive(Clone, Debug)]
pub struct PathResolver {
    base_dir: PathBuf,
}

impl PathResolver {
    /// Create a resolver rooted at `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// The shared base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// `<base>/<user_id>`
    pub fn user_root(&self, user_id: &str) -> Result<PathBuf> {
        validate_identifier("user id", user_id)?;
        Ok(self.base_dir.join(user_id))
    }

    /// `<base>/<user_id>/<name>`
    pub fn collection_path(&self, user_id: &str, name: &str) -> Result<PathBuf> {
        let root = self.user_root(user_id)?;
        validate_identifier("collection name", name)?;
        Ok(root.join(name))
    }

    /// `<base>/<user_id>.zip`
    pub fn archive_path(&self, user_id: &str) -> Result<PathBuf> {
        validate_identifier("user id", user_id)?;
        Ok(self
            .base_dir
            .join(format!("{user_id}.{ARCHIVE_EXTENSION}")))
    }
}

/// Reject identifiers that could escape the base directory
///
/// `kind` only labels the error ("user id", "collection name").
pub fn validate_identifier(kind: &'static str, value: &str) -> Result<()> {
    let reject = |reason: &str| {
        Err(Error::InvalidIdentifier {
            kind,
            value: value.to_string(),
            reason: reason.to_string(),
        })
    };

    if value.trim().is_empty() {
        return reject("must not be empty");
    }
    // "..." and longer collapse to ".." or "." on Windows
    if value.chars().all(|c| c == '.') {
        return reject("must not consist only of dots");
    }
    if value.contains(['/', '\\']) {
        return reject("must not contain path separators");
    }
    if value.chars().any(char::is_control) {
        return reject("must not contain control characters");
    }
    // "C:" style prefixes would be absolute on Windows
    if value.contains(':') && cfg!(windows) {
        return reject("must not contain a drive prefix");
    }

    Ok(())
}
