//! Folder materialization for user roots and collection folders

use crate::error::{Error, Result};
use crate::paths::PathResolver;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Ensures the on-disk folder layout for a bundle exists
///
/// Both operations are idempotent and create any missing parent directories.
/// Moving item files into the folders is not done here; see
/// [`ItemPlacer`](crate::placement::ItemPlacer).
#[derive(Clone, Debug)]
pub struct FolderMaterializer {
    resolver: PathResolver,
}

impl FolderMaterializer {
    /// Create a materializer that resolves paths with `resolver`
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    /// Ensure `<base>/<user_id>` exists, returning its path
    pub async fn ensure_user_root(&self, user_id: &str) -> Result<PathBuf> {
        let path = self.resolver.user_root(user_id)?;
        ensure_dir(&path).await?;
        debug!(user_id, ?path, "user root ready");
        Ok(path)
    }

    /// Ensure `<base>/<user_id>/<name>` exists, returning its path
    pub async fn ensure_collection_folder(&self, user_id: &str, name: &str) -> Result<PathBuf> {
        let path = self.resolver.collection_path(user_id, name)?;
        ensure_dir(&path).await?;
        debug!(user_id, collection = name, ?path, "collection folder ready");
        Ok(path)
    }
}

async fn ensure_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| Error::FolderCreationFailed {
            path: path.to_path_buf(),
            source,
        })
}
