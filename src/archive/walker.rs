//! Lazy, deterministic directory traversal feeding the archive writer

use crate::error::{Error, Result};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Whether an entry is a directory or a regular file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// Directory entry (name ends with `/`, no content)
    Directory,
    /// Regular file entry, content read from `source`
    File,
}

/// One entry to be written into the archive
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    /// `/`-separated name inside the archive, prefixed by the root segment
    pub name: String,
    /// Directory or file
    pub kind: EntryKind,
    /// Where the entry lives on disk
    pub source: PathBuf,
    /// File size in bytes when the entry was visited (0 for directories)
    pub len: u64,
}

impl TreeEntry {
    /// Whether this is a directory entry
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Walks a directory tree in lexical order, one entry at a time
///
/// Directories are yielded before their children. The walk is finite and
/// cannot be restarted; errors are yielded in place of the entry that failed
/// and the caller is expected to stop.
///
/// Two entries that normalize to the same name (`AC\DC.mp3` next to
/// `AC_DC.mp3`) are an error rather than a silently shadowed entry.
pub struct TreeWalker {
    root: PathBuf,
    root_name: String,
    inner: walkdir::IntoIter,
    // names emitted so far, without the trailing `/` of directories
    seen: HashSet<String>,
}

impl TreeWalker {
    /// Start walking `root`, which must be an existing directory
    pub fn new(root: &Path) -> Result<Self> {
        let meta = std::fs::metadata(root).map_err(|e| Error::InvalidPath {
            path: root.to_path_buf(),
            reason: format!("cannot read source directory: {e}"),
        })?;
        if !meta.is_dir() {
            return Err(Error::InvalidPath {
                path: root.to_path_buf(),
                reason: "source is not a directory".to_string(),
            });
        }

        let root_name = root_segment(root)?;
        let inner = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        Ok(Self {
            root: root.to_path_buf(),
            root_name,
            inner,
            seen: HashSet::new(),
        })
    }

    /// Name of the archive's top-level directory
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    fn entry_name(&self, path: &Path) -> Result<String> {
        let relative = path.strip_prefix(&self.root).map_err(|_| Error::InvalidPath {
            path: path.to_path_buf(),
            reason: format!("not inside {}", self.root.display()),
        })?;

        let mut name = self.root_name.clone();
        for component in relative.components() {
            let Component::Normal(part) = component else {
                return Err(Error::InvalidPath {
                    path: path.to_path_buf(),
                    reason: "unexpected path component".to_string(),
                });
            };
            name.push('/');
            name.push_str(&normalize_segment(part.to_str(), path)?);
        }
        Ok(name)
    }
}

impl Iterator for TreeWalker {
    type Item = Result<TreeEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(Error::Io(e.into()))),
            };

            let file_type = entry.file_type();
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                debug!(path = ?entry.path(), "skipping entry that is neither file nor directory");
                continue;
            };

            let len = match kind {
                EntryKind::Directory => 0,
                EntryKind::File => match entry.metadata() {
                    Ok(meta) => meta.len(),
                    Err(e) => return Some(Err(Error::Io(e.into()))),
                },
            };

            let name = match self.entry_name(entry.path()) {
                Ok(name) => name,
                Err(e) => return Some(Err(e)),
            };
            if !self.seen.insert(name.clone()) {
                return Some(Err(Error::InvalidPath {
                    path: entry.into_path(),
                    reason: format!("entry name {name:?} is already used by another entry"),
                }));
            }
            let name = match kind {
                EntryKind::Directory => format!("{name}/"),
                EntryKind::File => name,
            };

            return Some(Ok(TreeEntry {
                name,
                kind,
                source: entry.into_path(),
                len,
            }));
        }
    }
}

/// Base name of `root`, resolving `.`-style paths through the filesystem
fn root_segment(root: &Path) -> Result<String> {
    let base = match root.file_name() {
        Some(name) => name.to_os_string(),
        None => std::fs::canonicalize(root)?
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| Error::InvalidPath {
                path: root.to_path_buf(),
                reason: "source directory has no base name".to_string(),
            })?,
    };
    normalize_segment(base.to_str(), root)
}

/// A single name segment, with any backslash replaced so it cannot be read as a separator
fn normalize_segment(part: Option<&str>, path: &Path) -> Result<String> {
    let part = part.ok_or_else(|| Error::InvalidPath {
        path: path.to_path_buf(),
        reason: "file name is not valid UTF-8".to_string(),
    })?;
    Ok(part.replace('\\', "_"))
}
