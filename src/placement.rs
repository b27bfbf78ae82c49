//! Placing downloaded item files into collection folders
//!
//! The downloader leaves media files wherever it likes; an [`ItemPlacer`]
//! gets each one to its planned destination inside the collection folder.
//! [`BundleBuilder`](crate::BundleBuilder) takes any implementation, so
//! callers can plug in their own (e.g. hard-linking or fetching from object
//! storage).

use crate::config::FileCollisionAction;
use crate::error::{Error, Result};
use crate::types::Item;
use crate::utils::get_unique_path;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Puts an item's media file at a destination path
#[async_trait]
pub trait ItemPlacer: Send + Sync {
    /// Place `item` at `destination`, returning the path actually used
    ///
    /// The returned path may differ from `destination` when the placer
    /// resolves a collision by renaming.
    async fn place(&self, item: &Item, destination: &Path) -> Result<PathBuf>;

    /// Short name for logging
    fn name(&self) -> &'static str;
}

/// Moves the downloaded file into place (the default placer)
///
/// Falls back to copy + delete when source and destination are on different
/// filesystems. If the source cannot be deleted after such a copy, the item
/// still counts as placed and the source file is left behind.
#[derive(Clone, Copy, Debug, Default)]
pub struct MovePlacer {
    collision: FileCollisionAction,
}

impl MovePlacer {
    /// Create a placer that applies `collision` when the destination exists
    pub fn new(collision: FileCollisionAction) -> Self {
        Self { collision }
    }
}

#[async_trait]
impl ItemPlacer for MovePlacer {
    async fn place(&self, item: &Item, destination: &Path) -> Result<PathBuf> {
        let Some(target) = resolve_target(item, destination, self.collision).await? else {
            return Ok(destination.to_path_buf());
        };

        match tokio::fs::rename(&item.media, &target).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::CrossesDevices => {
                debug!(source = ?item.media, ?target, "rename crosses devices, copying instead");
                tokio::fs::copy(&item.media, &target).await?;
                if let Err(e) = tokio::fs::remove_file(&item.media).await {
                    warn!(source = ?item.media, error = %e, "copied item but could not remove source");
                }
            }
            Err(e) => return Err(e.into()),
        }

        debug!(title = %item.title, ?target, "moved item");
        Ok(target)
    }

    fn name(&self) -> &'static str {
        "move"
    }
}

/// Copies the downloaded file into place, leaving the source untouched
#[derive(Clone, Copy, Debug, Default)]
pub struct CopyPlacer {
    collision: FileCollisionAction,
}

impl CopyPlacer {
    /// Create a placer that applies `collision` when the destination exists
    pub fn new(collision: FileCollisionAction) -> Self {
        Self { collision }
    }
}

#[async_trait]
impl ItemPlacer for CopyPlacer {
    async fn place(&self, item: &Item, destination: &Path) -> Result<PathBuf> {
        let Some(target) = resolve_target(item, destination, self.collision).await? else {
            return Ok(destination.to_path_buf());
        };

        tokio::fs::copy(&item.media, &target).await?;
        debug!(title = %item.title, ?target, "copied item");
        Ok(target)
    }

    fn name(&self) -> &'static str {
        "copy"
    }
}

/// Work out where the file should go
///
/// Returns `None` when the item needs no work: the media file already is the
/// destination (a pre-placed item), or the media file is gone and the
/// destination holds a regular file (moved there by an earlier attempt).
async fn resolve_target(
    item: &Item,
    destination: &Path,
    collision: FileCollisionAction,
) -> Result<Option<PathBuf>> {
    let source_meta = match tokio::fs::metadata(&item.media).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            if is_regular_file(destination).await {
                debug!(title = %item.title, ?destination, "source gone, item already placed");
                return Ok(None);
            }
            return Err(Error::InvalidPath {
                path: item.media.clone(),
                reason: "source file does not exist".to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    if !source_meta.is_file() {
        return Err(Error::InvalidPath {
            path: item.media.clone(),
            reason: "source is not a regular file".to_string(),
        });
    }

    if is_same_file(&item.media, destination).await {
        debug!(title = %item.title, ?destination, "item already in place");
        return Ok(None);
    }

    get_unique_path(destination, collision).map(Some)
}

async fn is_regular_file(path: &Path) -> bool {
    tokio::fs::symlink_metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file())
}

async fn is_same_file(a: &Path, b: &Path) -> bool {
    match (
        tokio::fs::canonicalize(a).await,
        tokio::fs::canonicalize(b).await,
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
