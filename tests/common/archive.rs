//! Reading archives back for assertions

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Entry names in archive order
pub fn entry_names(archive: &Path) -> Vec<String> {
    let file = std::fs::File::open(archive).expect("open archive");
    let archive = zip::ZipArchive::new(file).expect("read archive");
    archive.file_names().map(str::to_string).collect::<Vec<_>>()
}

/// Entry names in the order they were written
pub fn ordered_entry_names(archive: &Path) -> Vec<String> {
    let file = std::fs::File::open(archive).expect("open archive");
    let mut archive = zip::ZipArchive::new(file).expect("read archive");
    (0..archive.len())
        .map(|i| archive.by_index(i).expect("entry").name().to_string())
        .collect()
}

/// Every file entry's contents, keyed by name
pub fn file_contents(archive: &Path) -> BTreeMap<String, Vec<u8>> {
    let file = std::fs::File::open(archive).expect("open archive");
    let mut archive = zip::ZipArchive::new(file).expect("read archive");
    let mut out = BTreeMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).expect("entry");
        if entry.is_dir() {
            continue;
        }
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).expect("read entry");
        out.insert(entry.name().to_string(), contents);
    }
    out
}

/// Check the naming rules every entry must follow
pub fn assert_portable_names(archive: &Path, root: &str) {
    let file = std::fs::File::open(archive).expect("open archive");
    let mut archive = zip::ZipArchive::new(file).expect("read archive");
    for i in 0..archive.len() {
        let entry = archive.by_index(i).expect("entry");
        let name = entry.name();
        assert!(!name.starts_with('/'), "{name} starts with /");
        assert!(!name.contains('\\'), "{name} contains a backslash");
        assert!(
            name.starts_with(&format!("{root}/")),
            "{name} is outside {root}/"
        );
        assert_eq!(entry.is_dir(), name.ends_with('/'), "{name}");
    }
}
