//! Error types for media-bundle
//!
//! Every fallible operation in the crate returns [`Result`]. Errors carry the
//! path or identifier they relate to, and I/O failures keep the original
//! [`std::io::Error`] as their source so callers can inspect the raw kind.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for media-bundle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-bundle
#[derive(Debug, Error)]
pub enum Error {
    /// A user identifier or collection name would escape the base directory
    #[error("invalid {kind} {value:?}: {reason}")]
    InvalidIdentifier {
        /// What was being validated ("user id", "collection name")
        kind: &'static str,
        /// The rejected value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// Creating a directory failed
    #[error("failed to create folder {path}: {source}")]
    FolderCreationFailed {
        /// The directory that could not be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The item placement collaborator failed for one item
    #[error("failed to place item {title:?} in collection {collection:?}: {source}")]
    ItemPlacementFailed {
        /// Collection the item belongs to
        collection: String,
        /// Title of the item
        title: String,
        /// What the placer reported
        #[source]
        source: Box<Error>,
    },

    /// Walking the source tree or writing an entry failed
    #[error("failed to write archive {path}: {reason}")]
    ArchiveWriteFailed {
        /// The archive being written
        path: PathBuf,
        /// The reason the write failed
        reason: String,
    },

    /// Writing the central directory or publishing the archive failed
    #[error("failed to finalize archive {path}: {reason}")]
    ArchiveFinalizeFailed {
        /// The archive being finalized
        path: PathBuf,
        /// The reason finalization failed
        reason: String,
    },

    /// Destination already exists and the collision action forbids replacing it
    #[error("file collision at {path}: {reason}")]
    FileCollision {
        /// The path where the collision occurred
        path: PathBuf,
        /// The reason for the collision
        reason: String,
    },

    /// A path could not be used (missing source, no file name, ...)
    #[error("invalid path {path}: {reason}")]
    InvalidPath {
        /// The offending path
        path: PathBuf,
        /// The reason the path is invalid
        reason: String,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "copy_buffer_size")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Machine-readable error code, stable across releases
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidIdentifier { .. } => "invalid_identifier",
            Error::FolderCreationFailed { .. } => "folder_creation_failed",
            Error::ItemPlacementFailed { .. } => "item_placement_failed",
            Error::ArchiveWriteFailed { .. } => "archive_write_failed",
            Error::ArchiveFinalizeFailed { .. } => "archive_finalize_failed",
            Error::FileCollision { .. } => "file_collision",
            Error::InvalidPath { .. } => "invalid_path",
            Error::Config { .. } => "config_error",
            Error::Io(_) => "io_error",
        }
    }

    /// Whether retrying the whole bundle could plausibly succeed
    ///
    /// Invalid input and configuration errors will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Error::InvalidIdentifier { .. } | Error::Config { .. }
        )
    }
}
