//! Folder handle abstraction.
//!
//! Review operations are written against this trait rather than the
//! filesystem so they stay testable and keep the same shape as the folder
//! handles handed out by the UI layer.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// A single directory entry as reported by [`FolderStore::list_entries`].
#[derive(Debug, Clone)]
pub struct FolderEntry {
    pub kind: EntryKind,
    pub name: String,
}

/// Contract for a folder the review operations act on: list entries, read a
/// file's full bytes, write a file (optionally creating it), remove an
/// entry. No locking is provided; callers assume exclusive access.
pub trait FolderStore {
    fn list_entries(&self) -> io::Result<Vec<FolderEntry>>;
    fn read_bytes(&self, name: &str) -> io::Result<Vec<u8>>;
    fn write_file(&self, name: &str, bytes: &[u8], create: bool) -> io::Result<()>;
    fn remove_entry(&self, name: &str) -> io::Result<()>;

    /// Existence probe used before rename/copy. There is a race window
    /// between the probe and the write; accepted as a known limitation.
    fn exists(&self, name: &str) -> bool;
}

/// A real directory on disk.
#[derive(Debug, Clone)]
pub struct FsFolder {
    path: PathBuf,
}

impl FsFolder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FolderStore for FsFolder {
    fn list_entries(&self) -> io::Result<Vec<FolderEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            let kind = if entry.file_type()?.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            entries.push(FolderEntry {
                kind,
                name: entry.file_name().to_string_lossy().to_string(),
            });
        }
        // Sort by name for consistent ordering
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_bytes(&self, name: &str) -> io::Result<Vec<u8>> {
        fs::read(self.path.join(name))
    }

    fn write_file(&self, name: &str, bytes: &[u8], create: bool) -> io::Result<()> {
        let target = self.path.join(name);
        if !create && !target.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", target.display()),
            ));
        }
        fs::write(target, bytes)
    }

    fn remove_entry(&self, name: &str) -> io::Result<()> {
        fs::remove_file(self.path.join(name))
    }

    fn exists(&self, name: &str) -> bool {
        self.path.join(name).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_list_read_write_remove() {
        let dir = tempdir().unwrap();
        let folder = FsFolder::new(dir.path());

        folder.write_file("a.jpg", b"bytes", true).unwrap();
        folder.write_file("b.jpg", b"more", true).unwrap();

        let names: Vec<String> = folder
            .list_entries()
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);

        assert_eq!(folder.read_bytes("a.jpg").unwrap(), b"bytes");
        assert!(folder.exists("a.jpg"));

        folder.remove_entry("a.jpg").unwrap();
        assert!(!folder.exists("a.jpg"));
    }

    #[test]
    fn test_write_without_create_requires_existing_file() {
        let dir = tempdir().unwrap();
        let folder = FsFolder::new(dir.path());

        assert!(folder.write_file("missing.jpg", b"x", false).is_err());
        folder.write_file("missing.jpg", b"x", true).unwrap();
        folder.write_file("missing.jpg", b"y", false).unwrap();
        assert_eq!(folder.read_bytes("missing.jpg").unwrap(), b"y");
    }
}
