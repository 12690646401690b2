//! Fixture ZIP archives built in-test

use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Builds a ZIP archive entry by entry, in order
pub struct ArchiveBuilder {
    entries: Vec<(String, Vec<u8>)>,
    method: CompressionMethod,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            method: CompressionMethod::Stored,
        }
    }

    pub fn deflated(mut self) -> Self {
        self.method = CompressionMethod::Deflated;
        self
    }

    /// Add a file entry (a name ending in '/' adds a directory marker)
    pub fn entry(mut self, name: &str, data: &[u8]) -> Self {
        self.entries.push((name.to_string(), data.to_vec()));
        self
    }

    /// Add many file entries with placeholder payloads
    pub fn files(mut self, names: &[&str]) -> Self {
        for name in names {
            let payload = format!("payload of {name}").into_bytes();
            self.entries.push((name.to_string(), payload));
        }
        self
    }

    pub fn write_to(self, path: &Path) -> PathBuf {
        let file = std::fs::File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(self.method);

        for (name, data) in &self.entries {
            if name.ends_with('/') {
                writer.add_directory(name.as_str(), options).unwrap();
            } else {
                writer.start_file(name.as_str(), options).unwrap();
                writer.write_all(data).unwrap();
            }
        }

        writer.finish().unwrap();
        path.to_path_buf()
    }
}

/// Flip the first byte of the first occurrence of `needle` in the file
pub fn corrupt_first(path: &Path, needle: &[u8]) {
    corrupt_nth(path, needle, 0);
}

/// Flip the first byte of the `n`th occurrence of `needle`
pub fn corrupt_nth(path: &Path, needle: &[u8], n: usize) {
    let mut bytes = std::fs::read(path).unwrap();
    let offset = bytes
        .windows(needle.len())
        .enumerate()
        .filter(|(_, window)| *window == needle)
        .map(|(offset, _)| offset)
        .nth(n)
        .expect("needle not found in archive");
    bytes[offset] ^= 0xFF;
    std::fs::write(path, bytes).unwrap();
}

/// Overwrite every occurrence of `from` with `to` (same length)
///
/// Rewrites entry names in both the local and central headers, which lets a
/// fixture hold entries the writer would refuse, such as duplicate names.
pub fn rename_entries(path: &Path, from: &str, to: &str) {
    assert_eq!(from.len(), to.len(), "renames must keep header sizes");
    let mut bytes = std::fs::read(path).unwrap();
    let (from, to) = (from.as_bytes(), to.as_bytes());

    let mut offset = 0;
    let mut renamed = 0;
    while offset + from.len() <= bytes.len() {
        if &bytes[offset..offset + from.len()] == from {
            bytes[offset..offset + from.len()].copy_from_slice(to);
            renamed += 1;
            offset += from.len();
        } else {
            offset += 1;
        }
    }
    assert!(renamed > 0, "entry name not found in archive");
    std::fs::write(path, bytes).unwrap();
}
