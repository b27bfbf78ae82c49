//! Directory tree to ZIP archive
//!
//! [`archive_tree`] walks a directory with [`TreeWalker`] and streams every
//! entry into a ZIP file. The archive is assembled under a `.part` name next
//! to the target and only renamed into place once the central directory has
//! been written, so the target path never holds a half-written archive.

mod walker;


pub use walker::{EntryKind, TreeEntry, TreeWalker};

use crate::config::BundleConfig;
use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Suffix of the staging file an archive is written to before publishing
const STAGING_SUFFIX: &str = "part";

/// Permissions recorded for directory entries
const DIR_PERMISSIONS: u32 = 0o755;

/// Permissions recorded for file entries
const FILE_PERMISSIONS: u32 = 0o644;

/// Knobs for writing an archive
#[derive(Clone, Debug)]
pub struct ArchiveOptions {
    /// Bytes read from a source file per write into the archive
    pub copy_buffer_size: usize,
    /// Deflate level (None = library default)
    pub compression_level: Option<i32>,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            copy_buffer_size: 64 * 1024,
            compression_level: None,
        }
    }
}

impl From<&BundleConfig> for ArchiveOptions {
    fn from(config: &BundleConfig) -> Self {
        Self {
            copy_buffer_size: config.copy_buffer_size.max(1),
            compression_level: config.compression_level,
        }
    }
}

/// What ended up in a finished archive
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Directory entries written, including the root
    pub directories: usize,
    /// File entries written
    pub files: usize,
    /// Uncompressed bytes copied into file entries
    pub bytes: u64,
}

/// Serializes a directory subtree into a single ZIP file
#[derive(Clone, Debug, Default)]
pub struct TreeArchiver {
    options: ArchiveOptions,
}

impl TreeArchiver {
    /// Create an archiver with the given options
    pub fn new(options: ArchiveOptions) -> Self {
        Self { options }
    }

    /// Archive `source_dir` into `target`
    ///
    /// See [`archive_tree`].
    pub fn archive(&self, source_dir: &Path, target: &Path) -> Result<ArchiveSummary> {
        archive_tree(source_dir, target, &self.options)
    }
}

/// Archive `source_dir` into a ZIP file at `target`
///
/// Entry names are `/`-separated and start with the base name of
/// `source_dir`. Directories are written before their contents, in lexical
/// order. On any error nothing is left at `target`, including an archive from
/// an earlier run.
pub fn archive_tree(
    source_dir: &Path,
    target: &Path,
    options: &ArchiveOptions,
) -> Result<ArchiveSummary> {
    if target.starts_with(source_dir) {
        return Err(Error::ArchiveWriteFailed {
            path: target.to_path_buf(),
            reason: format!("target is inside {}", source_dir.display()),
        });
    }

    let walker = TreeWalker::new(source_dir).map_err(|e| write_failed(target, e))?;
    debug!(?source_dir, ?target, root = walker.root_name(), "archiving tree");
    write_entries(walker, target, options)
}

/// Write a sequence of entries into a ZIP file at `target`
///
/// Entries are consumed lazily; the first `Err` aborts the archive.
pub fn write_entries<I>(entries: I, target: &Path, options: &ArchiveOptions) -> Result<ArchiveSummary>
where
    I: IntoIterator<Item = Result<TreeEntry>>,
{
    let staging = staging_path(target);

    let result = write_staging(entries, &staging, target, options).and_then(|summary| {
        std::fs::rename(&staging, target).map_err(|e| Error::ArchiveFinalizeFailed {
            path: target.to_path_buf(),
            reason: format!("failed to move archive into place: {e}"),
        })?;
        Ok(summary)
    });

    match result {
        Ok(summary) => {
            info!(
                ?target,
                directories = summary.directories,
                files = summary.files,
                bytes = summary.bytes,
                "archive written"
            );
            Ok(summary)
        }
        Err(e) => {
            warn!(?target, error = %e, "archive failed, removing partial output");
            remove_if_exists(&staging);
            remove_if_exists(target);
            Err(e)
        }
    }
}

fn write_staging<I>(
    entries: I,
    staging: &Path,
    target: &Path,
    options: &ArchiveOptions,
) -> Result<ArchiveSummary>
where
    I: IntoIterator<Item = Result<TreeEntry>>,
{
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_failed(target, e))?;
    }

    let file = File::create(staging).map_err(|e| write_failed(target, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let mut buffer = vec![0u8; options.copy_buffer_size.max(1)];
    let mut summary = ArchiveSummary::default();

    for entry in entries {
        let entry = entry.map_err(|e| write_failed(target, e))?;
        match entry.kind {
            EntryKind::Directory => {
                zip.add_directory(entry.name.as_str(), dir_options())
                    .map_err(|e| write_failed(target, e))?;
                summary.directories += 1;
            }
            EntryKind::File => {
                zip.start_file(entry.name.as_str(), file_options(options, entry.len))
                    .map_err(|e| write_failed(target, e))?;
                let copied = stream_file(&entry.source, &mut zip, &mut buffer)
                    .map_err(|e| write_failed(target, format!("{}: {e}", entry.source.display())))?;
                summary.files += 1;
                summary.bytes += copied;
            }
        }
        debug!(name = %entry.name, "wrote entry");
    }

    let writer = zip.finish().map_err(|e| finalize_failed(target, e))?;
    let file = writer
        .into_inner()
        .map_err(|e| finalize_failed(target, e.error()))?;
    file.sync_all().map_err(|e| finalize_failed(target, e))?;

    Ok(summary)
}

/// Copy a file into the current archive entry through `buffer`
fn stream_file<W: Write>(source: &Path, out: &mut W, buffer: &mut [u8]) -> std::io::Result<u64> {
    let mut file = File::open(source)?;
    let mut total = 0u64;
    loop {
        let n = match file.read(buffer) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        out.write_all(&buffer[..n])?;
        total += n as u64;
    }
}

fn dir_options() -> FileOptions {
    FileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(DIR_PERMISSIONS)
}

fn file_options(options: &ArchiveOptions, len: u64) -> FileOptions {
    FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(options.compression_level)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(FILE_PERMISSIONS)
        .large_file(len >= u64::from(u32::MAX))
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".");
    name.push(STAGING_SUFFIX);
    PathBuf::from(name)
}

fn remove_if_exists(path: &Path) {
    if let Err(e) = std::fs::remove_file(path)
        && e.kind() != ErrorKind::NotFound
    {
        warn!(?path, error = %e, "failed to remove partial archive");
    }
}

fn write_failed(target: &Path, reason: impl std::fmt::Display) -> Error {
    Error::ArchiveWriteFailed {
        path: target.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn finalize_failed(target: &Path, reason: impl std::fmt::Display) -> Error {
    Error::ArchiveFinalizeFailed {
        path: target.to_path_buf(),
        reason: reason.to_string(),
    }
}
