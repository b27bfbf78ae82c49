//! Bundle orchestration
//!
//! [`BundleBuilder::build_bundle`] runs the whole pipeline for one user:
//!
//! 1. validate the user id and every collection name,
//! 2. create the user root,
//! 3. materialize collections (folder + every item placed), a bounded number
//!    at a time,
//! 4. archive the user root once every collection is done.
//!
//! The first failure aborts the bundle and no archive is produced.

use crate::archive::{ArchiveOptions, TreeArchiver};
use crate::config::BundleConfig;
use crate::error::{Error, Result};
use crate::materialize::FolderMaterializer;
use crate::paths::{PathResolver, validate_identifier};
use crate::placement::{ItemPlacer, MovePlacer};
use crate::types::{Item, PlacedItem, UserBundle};
use crate::utils::plan_filenames;
use futures::stream::{self, TryStreamExt};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};


/// Builds per-user archives from downloaded collections
///
/// Cheap to clone; builds for different users can run concurrently on the
/// same base directory because their subtrees never overlap.
#[derive(Clone)]
pub struct BundleBuilder {
    config: Arc<BundleConfig>,
    resolver: PathResolver,
    materializer: FolderMaterializer,
    placer: Arc<dyn ItemPlacer>,
    archiver: TreeArchiver,
}

impl std::fmt::Debug for BundleBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleBuilder")
            .field("config", &self.config)
            .field("placer", &self.placer.name())
            .finish_non_exhaustive()
    }
}

impl BundleBuilder {
    /// Create a builder that moves item files into place
    pub fn new(config: BundleConfig) -> Result<Self> {
        let placer = Arc::new(MovePlacer::new(config.file_collision));
        Self::with_placer(config, placer)
    }

    /// Create a builder with a custom placement collaborator
    pub fn with_placer(config: BundleConfig, placer: Arc<dyn ItemPlacer>) -> Result<Self> {
        config.validate()?;

        let resolver = PathResolver::new(config.base_dir.clone());
        let materializer = FolderMaterializer::new(resolver.clone());
        let archiver = TreeArchiver::new(ArchiveOptions::from(&config));

        Ok(Self {
            config: Arc::new(config),
            resolver,
            materializer,
            placer,
            archiver,
        })
    }

    /// The configuration this builder was created with
    pub fn config(&self) -> &BundleConfig {
        &self.config
    }

    /// Path resolver for this builder's base directory
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Build the bundle described by `bundle`
    pub async fn build(&self, bundle: &UserBundle) -> Result<PathBuf> {
        self.build_bundle(&bundle.user_id, &bundle.collections).await
    }

    /// Materialize every collection for `user_id` and archive the result
    ///
    /// Returns the path of `<base>/<user_id>.zip`. On error no archive is left
    /// at that path; folders created so far stay on disk for a later cleanup.
    /// Retrying with the same input is safe: folder creation is idempotent,
    /// items moved by an earlier attempt are found at their planned
    /// destination, and the archive is rewritten from scratch.
    pub async fn build_bundle(
        &self,
        user_id: &str,
        collections: &HashMap<String, Vec<Item>>,
    ) -> Result<PathBuf> {
        validate_identifier("user id", user_id)?;
        for name in collections.keys() {
            validate_identifier("collection name", name)?;
        }
        let archive_path = self.resolver.archive_path(user_id)?;

        info!(
            user_id,
            collections = collections.len(),
            items = collections.values().map(Vec::len).sum::<usize>(),
            placer = self.placer.name(),
            "building bundle"
        );

        remove_stale_archive(&archive_path).await?;
        let user_root = self.materializer.ensure_user_root(user_id).await?;

        let jobs: Vec<Result<_>> = collections
            .iter()
            .map(|(name, items)| Ok(self.materialize_collection(user_id, name, items)))
            .collect();
        let placed: usize = stream::iter(jobs)
            .try_buffer_unordered(self.config.max_concurrent_collections.max(1))
            .try_fold(0, |total, placed| async move { Ok::<_, Error>(total + placed.len()) })
            .await
            .inspect_err(|e| warn!(user_id, error = %e, "bundle materialization failed"))?;

        debug!(user_id, placed, "all collections materialized, archiving");

        let archiver = self.archiver.clone();
        let source = user_root.clone();
        let target = archive_path.clone();
        let summary = spawn_blocking(move || archiver.archive(&source, &target))
            .await
            .map_err(|e| Error::ArchiveWriteFailed {
                path: archive_path.clone(),
                reason: format!("archive task panicked: {e}"),
            })??;

        info!(
            user_id,
            ?archive_path,
            files = summary.files,
            bytes = summary.bytes,
            "bundle ready"
        );

        Ok(archive_path)
    }

    /// Create one collection folder and place all of its items
    async fn materialize_collection(
        &self,
        user_id: &str,
        name: &str,
        items: &[Item],
    ) -> Result<Vec<PlacedItem>> {
        let folder = self
            .materializer
            .ensure_collection_folder(user_id, name)
            .await?;
        let filenames = plan_filenames(items, &folder, &self.config.default_extension);

        let mut placed = Vec::with_capacity(items.len());
        for (item, filename) in items.iter().zip(filenames) {
            let destination = folder.join(&filename);
            let path = self
                .placer
                .place(item, &destination)
                .await
                .map_err(|e| Error::ItemPlacementFailed {
                    collection: name.to_string(),
                    title: item.title.clone(),
                    source: Box::new(e),
                })?;
            placed.push(PlacedItem {
                title: item.title.clone(),
                path,
            });
        }

        debug!(user_id, collection = name, items = placed.len(), "collection materialized");
        Ok(placed)
    }
}

/// Drop an archive left by an earlier build so a failed rebuild cannot be
/// mistaken for a fresh one
async fn remove_stale_archive(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(?path, "removed previous archive");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::ArchiveWriteFailed {
            path: path.to_path_buf(),
            reason: format!("cannot remove previous archive: {e}"),
        }),
    }
}
