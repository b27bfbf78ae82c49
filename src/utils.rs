//! Utility functions for filenames and collision handling

use crate::config::FileCollisionAction;
use crate::error::{Error, Result};
use crate::types::Item;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Maximum number of rename attempts when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Longest sanitized stem, in bytes
const MAX_STEM_BYTES: usize = 200;

/// Stem used when a title sanitizes to nothing
const FALLBACK_STEM: &str = "untitled";

/// Characters that are invalid in filenames on at least one common platform
const UNSAFE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Get a unique path for a file, handling collisions according to the specified action
///
/// For `Rename`, tries `name (1).ext`, `name (2).ext`, ... until a free path is found.
/// For `Skip`, returns an error if the file already exists.
/// For `Overwrite`, returns the original path unchanged.
///
/// # Examples
///
/// ```
/// use media_bundle::utils::get_unique_path;
/// use media_bundle::config::FileCollisionAction;
/// use std::path::Path;
///
/// let path = Path::new("/tmp/does-not-exist/song.mp3");
/// let unique = get_unique_path(path, FileCollisionAction::Rename).unwrap();
/// assert_eq!(unique, path);
/// ```
pub fn get_unique_path(path: &Path, action: FileCollisionAction) -> Result<PathBuf> {
    match action {
        FileCollisionAction::Overwrite => Ok(path.to_path_buf()),
        FileCollisionAction::Skip => {
            if path.exists() {
                return Err(Error::FileCollision {
                    path: path.to_path_buf(),
                    reason: "file already exists and collision action is skip".to_string(),
                });
            }
            Ok(path.to_path_buf())
        }
        FileCollisionAction::Rename => {
            if !path.exists() {
                return Ok(path.to_path_buf());
            }

            let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(|| {
                Error::InvalidPath {
                    path: path.to_path_buf(),
                    reason: "cannot extract file stem".to_string(),
                }
            })?;
            let extension = path.extension().and_then(|e| e.to_str());
            let parent = path.parent().ok_or_else(|| Error::InvalidPath {
                path: path.to_path_buf(),
                reason: "cannot extract parent directory".to_string(),
            })?;

            for i in 1..=MAX_RENAME_ATTEMPTS {
                let new_path = parent.join(numbered_name(stem, i, extension));
                if !new_path.exists() {
                    return Ok(new_path);
                }
            }

            Err(Error::FileCollision {
                path: path.to_path_buf(),
                reason: format!("could not find unique filename after {MAX_RENAME_ATTEMPTS} attempts"),
            })
        }
    }
}

fn numbered_name(stem: &str, n: u32, extension: Option<&str>) -> String {
    match extension {
        Some(ext) => format!("{stem} ({n}).{ext}"),
        None => format!("{stem} ({n})"),
    }
}

/// Turn an item title into a filename stem that is safe on every platform
///
/// Path separators, reserved punctuation and control characters become `_`.
/// Surrounding whitespace and trailing dots are trimmed, and the result is
/// capped at 200 bytes.
///
/// # Examples
///
/// ```
/// use media_bundle::utils::sanitize_title;
///
/// assert_eq!(sanitize_title("AC/DC: Back in Black"), "AC_DC_ Back in Black");
/// assert_eq!(sanitize_title("  ...  "), "untitled");
/// ```
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| {
            if UNSAFE_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = replaced.trim().trim_end_matches(['.', ' ']);
    if trimmed.is_empty() {
        return FALLBACK_STEM.to_string();
    }

    let mut end = trimmed.len().min(MAX_STEM_BYTES);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    let capped = trimmed[..end].trim_end_matches(['.', ' ']);
    if capped.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        capped.to_string()
    }
}

/// Extension for an item's destination file
///
/// Uses the media file's own extension (lower-cased) when it has one.
pub fn item_extension(media: &Path, default_extension: &str) -> String {
    media
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(str::to_lowercase)
        .unwrap_or_else(|| default_extension.trim_start_matches('.').to_string())
}

/// Assign a distinct destination filename to every item of one collection
///
/// Items whose media file already sits directly in `folder` keep their
/// current filename, and those names are reserved first so nothing else is
/// planned on top of them. The remaining names are handed out in item order.
/// A name already taken in the collection (compared case-insensitively, since
/// some filesystems fold case) gets a ` (1)`, ` (2)`, ... suffix before the
/// extension. The returned vector lines up index-for-index with `items`.
pub fn plan_filenames(items: &[Item], folder: &Path, default_extension: &str) -> Vec<String> {
    let existing: Vec<Option<&str>> = items
        .iter()
        .map(|item| placed_filename(item, folder))
        .collect();

    let mut taken: HashSet<String> = existing
        .iter()
        .flatten()
        .map(|name| name.to_lowercase())
        .collect();

    items
        .iter()
        .zip(existing)
        .map(|(item, existing)| {
            if let Some(name) = existing {
                return name.to_string();
            }

            let stem = sanitize_title(&item.title);
            let ext = item_extension(&item.media, default_extension);

            let mut name = format!("{stem}.{ext}");
            let mut n = 1;
            while !taken.insert(name.to_lowercase()) {
                name = numbered_name(&stem, n, Some(&ext));
                n += 1;
            }
            name
        })
        .collect()
}

/// Filename of an item whose media is already inside `folder`
fn placed_filename<'a>(item: &'a Item, folder: &Path) -> Option<&'a str> {
    if item.media.parent() != Some(folder) {
        return None;
    }
    item.media.file_name().and_then(|name| name.to_str())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_get_unique_path_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("song.mp3");

        for action in [
            FileCollisionAction::Rename,
            FileCollisionAction::Overwrite,
            FileCollisionAction::Skip,
        ] {
            assert_eq!(get_unique_path(&path, action).unwrap(), path);
        }
    }

    #[test]
    fn test_get_unique_path_rename_with_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("song.mp3");
        fs::write(&path, "original").unwrap();

        let unique = get_unique_path(&path, FileCollisionAction::Rename).unwrap();
        assert_eq!(unique, temp_dir.path().join("song (1).mp3"));

        fs::write(&unique, "first").unwrap();
        let unique = get_unique_path(&path, FileCollisionAction::Rename).unwrap();
        assert_eq!(unique, temp_dir.path().join("song (2).mp3"));
    }

    #[test]
    fn test_get_unique_path_skip_and_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("song.mp3");
        fs::write(&path, "original").unwrap();

        assert!(matches!(
            get_unique_path(&path, FileCollisionAction::Skip),
            Err(Error::FileCollision { .. })
        ));
        assert_eq!(
            get_unique_path(&path, FileCollisionAction::Overwrite).unwrap(),
            path
        );
    }

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("Song A"), "Song A");
        assert_eq!(sanitize_title("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_title("What? <Live> | \"2020\""), "What_ _Live_ _ _2020_");
        assert_eq!(sanitize_title("tab\there"), "tab_here");
        assert_eq!(sanitize_title("  padded  "), "padded");
        assert_eq!(sanitize_title("ends with dots..."), "ends with dots");
        assert_eq!(sanitize_title(""), "untitled");
        assert_eq!(sanitize_title(".."), "untitled");
    }

    #[test]
    fn test_sanitize_title_caps_length_on_char_boundary() {
        let long = "é".repeat(150); // 300 bytes
        let out = sanitize_title(&long);
        assert!(out.len() <= 200);
        assert!(out.chars().all(|c| c == 'é'));
        assert_eq!(out.chars().count(), 100);
    }

    #[test]
    fn test_item_extension() {
        assert_eq!(item_extension(Path::new("/dl/x.MP3"), "mp3"), "mp3");
        assert_eq!(item_extension(Path::new("/dl/x.m4a"), "mp3"), "m4a");
        assert_eq!(item_extension(Path::new("/dl/x"), "mp3"), "mp3");
        assert_eq!(item_extension(Path::new("/dl/x"), ".ogg"), "ogg");
    }

    #[test]
    fn test_plan_filenames_dedupes_case_insensitively() {
        let items = vec![
            Item::new("Song A", "/dl/1.mp3"),
            Item::new("song a", "/dl/2.mp3"),
            Item::new("Song A", "/dl/3.mp3"),
            Item::new("Song B", "/dl/4"),
            Item::new("A/B", "/dl/5.mp3"),
            Item::new("A_B", "/dl/6.mp3"),
        ];

        let names = plan_filenames(&items, Path::new("/srv/u1/Mix"), "mp3");
        assert_eq!(
            names,
            vec![
                "Song A.mp3",
                "song a (1).mp3",
                "Song A (2).mp3",
                "Song B.mp3",
                "A_B.mp3",
                "A_B (1).mp3",
            ]
        );
    }

    #[test]
    fn test_plan_filenames_is_deterministic() {
        let items = vec![Item::new("x", "/a.mp3"), Item::new("x", "/b.mp3")];
        let folder = Path::new("/srv/u1/Mix");
        assert_eq!(
            plan_filenames(&items, folder, "mp3"),
            plan_filenames(&items, folder, "mp3")
        );
    }

    #[test]
    fn test_plan_filenames_reserves_pre_placed_names() {
        let folder = Path::new("/srv/u1/Mix");
        let items = vec![
            Item::new("Intro", "/dl/x.mp3"),
            Item::new("Intro", folder.join("Intro.mp3")),
            Item::new("Outro", folder.join("track-7.mp3")),
            Item::new("intro", "/dl/y.mp3"),
        ];

        assert_eq!(
            plan_filenames(&items, folder, "mp3"),
            vec!["Intro (1).mp3", "Intro.mp3", "track-7.mp3", "intro (2).mp3"]
        );
    }
}
