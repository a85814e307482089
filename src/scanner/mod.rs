pub mod folder_name;

use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::specimen::SpecimenMeta;
use crate::tagging::TaggedFile;

pub use folder_name::parse_specimen_meta;

/// A first-level folder under the collection root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoFolder {
    pub folder_name: String,
    pub full_path: PathBuf,
    pub has_images: bool,
    /// Present iff the folder name parsed as a specimen label.
    pub specimen_meta: Option<SpecimenMeta>,
}

impl PhotoFolder {
    /// Stable identity for dedup and tag-count keying: full path, with the
    /// folder name as fallback.
    pub fn key(&self) -> String {
        if self.full_path.as_os_str().is_empty() {
            self.folder_name.clone()
        } else {
            self.full_path.to_string_lossy().to_string()
        }
    }
}

impl crate::selector::SelectorItem for PhotoFolder {
    fn key(&self) -> String {
        PhotoFolder::key(self)
    }
}

/// Folders split by whether their names parsed as specimen labels.
#[derive(Debug, Clone, Default)]
pub struct FolderScanResult {
    pub matching: Vec<PhotoFolder>,
    pub nonmatching: Vec<PhotoFolder>,
}

pub struct FolderScanner {
    image_extensions: Vec<String>,
}

impl FolderScanner {
    pub fn new(image_extensions: Vec<String>) -> Self {
        Self { image_extensions }
    }

    fn is_image(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.image_extensions
            .iter()
            .any(|ext| lower.ends_with(&format!(".{}", ext.to_lowercase())))
    }

    /// Enumerate a folder's image files, sorted by name. This is the only
    /// place the review pipeline touches the filesystem directly.
    pub fn list_images(&self, directory: &Path) -> Result<Vec<TaggedFile>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(directory)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() {
                let name = entry.file_name().to_string_lossy().to_string();
                if self.is_image(&name) {
                    files.push(TaggedFile::new(name, entry.path().to_path_buf()));
                }
            }
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    /// Walk the collection root's first-level folders and classify each one
    /// by whether its name parses as a specimen label. Folders are visited
    /// sequentially; results come back sorted by folder name.
    pub fn scan_root(&self, root: &Path) -> Result<FolderScanResult> {
        let mut result = FolderScanResult::default();

        let mut dirs: Vec<PathBuf> = WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .map(|e| e.path().to_path_buf())
            .collect();
        dirs.sort();

        for dir in dirs {
            let folder_name = dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let has_images = self.folder_has_images(&dir);
            let specimen_meta = parse_specimen_meta(&folder_name);

            let folder = PhotoFolder {
                folder_name,
                full_path: dir,
                has_images,
                specimen_meta,
            };
            if folder.specimen_meta.is_some() {
                result.matching.push(folder);
            } else {
                result.nonmatching.push(folder);
            }
        }

        tracing::debug!(
            matching = result.matching.len(),
            nonmatching = result.nonmatching.len(),
            "scanned collection root"
        );
        Ok(result)
    }

    fn folder_has_images(&self, dir: &Path) -> bool {
        WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .any(|e| {
                e.file_type().is_file() && self.is_image(&e.file_name().to_string_lossy())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn scanner() -> FolderScanner {
        FolderScanner::new(vec!["jpg".to_string(), "jpeg".to_string()])
    }

    #[test]
    fn test_scan_root_classifies_folders() {
        let root = tempdir().unwrap();
        fs::create_dir(root.path().join("AAM123b")).unwrap();
        File::create(root.path().join("AAM123b/photo[+s].jpg")).unwrap();
        fs::create_dir(root.path().join("Misc photos")).unwrap();

        let result = scanner().scan_root(root.path()).unwrap();

        assert_eq!(result.matching.len(), 1);
        assert_eq!(result.matching[0].folder_name, "AAM123b");
        assert!(result.matching[0].has_images);
        let meta = result.matching[0].specimen_meta.as_ref().unwrap();
        assert_eq!(meta.initials, "AAM");
        assert_eq!(meta.number, "123");
        assert_eq!(meta.accletter, "b");

        assert_eq!(result.nonmatching.len(), 1);
        assert!(!result.nonmatching[0].has_images);
    }

    #[test]
    fn test_list_images_filters_and_sorts() {
        let root = tempdir().unwrap();
        File::create(root.path().join("b.jpg")).unwrap();
        File::create(root.path().join("a.JPEG")).unwrap();
        File::create(root.path().join("notes.txt")).unwrap();

        let files = scanner().list_images(root.path()).unwrap();
        let names: Vec<String> = files.into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["a.JPEG", "b.jpg"]);
    }
}
