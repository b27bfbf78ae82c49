//! # media-bundle
//!
//! Turns a user's downloaded media collections into a single ZIP archive.
//!
//! Given a user id and a map of collection name to [`Item`]s (each pointing at
//! an already-downloaded file), the crate:
//!
//! - creates `<base>/<user>/<collection>/` for every collection,
//! - places every item's file there as `<sanitized title>.<ext>`,
//! - walks `<base>/<user>` in lexical order and streams it into
//!   `<base>/<user>.zip`, with entries rooted at `<user>/`.
//!
//! Downloading, fetching playlist metadata and serving the archive are left to
//! the caller. Nothing is ever shelled out, and every failure is returned as
//! an [`Error`] rather than terminating the process.
//!
//! ## Quick Start
//!
//! ```no_run
//! use media_bundle::{BundleBuilder, BundleConfig, Item, UserBundle};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let builder = BundleBuilder::new(BundleConfig::with_base_dir("/var/lib/bundles"))?;
//!
//!     let bundle = UserBundle::new("u1").with_collection(
//!         "Road Trip",
//!         vec![
//!             Item::new("Song A", "/downloads/abc.mp3"),
//!             Item::new("Song B", "/downloads/def.mp3"),
//!         ],
//!     );
//!
//!     let archive = builder.build(&bundle).await?;
//!     println!("archive ready at {}", archive.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Directory tree to ZIP archive
pub mod archive;
/// Bundle orchestration
pub mod bundle;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Folder materialization
pub mod materialize;
/// Path resolution and identifier validation
pub mod paths;
/// Item placement collaborators
pub mod placement;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use archive::{ArchiveOptions, ArchiveSummary, TreeArchiver, archive_tree};
pub use bundle::BundleBuilder;
pub use config::{BundleConfig, FileCollisionAction};
pub use error::{Error, Result};
pub use materialize::FolderMaterializer;
pub use paths::PathResolver;
pub use placement::{CopyPlacer, ItemPlacer, MovePlacer};
pub use types::{Item, PlacedItem, UserBundle};
