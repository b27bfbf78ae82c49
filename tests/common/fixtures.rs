//! Fake downloads standing in for the external downloader

use media_bundle::Item;
use std::collections::HashMap;
use std::path::Path;

/// Write `contents` to `<dir>/<file>` and return an item titled `title`
pub fn fake_download(dir: &Path, file: &str, title: &str, contents: &[u8]) -> Item {
    std::fs::create_dir_all(dir).expect("create download dir");
    let path = dir.join(file);
    std::fs::write(&path, contents).expect("write download");
    Item::new(title, path)
}

/// Deterministic pseudo-audio payload of `len` bytes
pub fn audio_bytes(seed: u8, len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

/// A single-collection map
pub fn one_collection(name: &str, items: Vec<Item>) -> HashMap<String, Vec<Item>> {
    let mut collections = HashMap::new();
    collections.insert(name.to_string(), items);
    collections
}
