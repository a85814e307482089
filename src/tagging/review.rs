//! File review operations: tag-preserving renames, edit copies, and
//! edit/original tag synchronization, built on [`FolderStore`] handles.

use thiserror::Error;

use crate::fsops::FolderStore;

use super::{compose_filename, parse_filename, TaggedFile};

#[derive(Debug, Error)]
pub enum ReviewError {
    /// Rename target already exists; the source file is left untouched.
    #[error("cannot rename: target file \"{0}\" already exists")]
    Conflict(String),

    /// An edit copy already exists for this file.
    #[error("edit file \"{0}\" already exists")]
    AlreadyExists(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Return the edit file's name with its tag area forced to equal the main
/// file's. The edit flag and extension of the edit file are preserved.
pub fn sync_edit_tag(main_filename: &str, edit_filename: &str) -> String {
    let main = parse_filename(main_filename);
    let mut edit = parse_filename(edit_filename);
    edit.tag = main.tag;
    compose_filename(&edit)
}

/// Locate, among `files`, the edit variant sharing `filename`'s base and
/// extension.
pub fn find_edit_file<'a>(files: &'a [TaggedFile], filename: &str) -> Option<&'a TaggedFile> {
    let main = parse_filename(filename);
    files.iter().find(|f| {
        let parsed = parse_filename(&f.name);
        parsed.base == main.base && parsed.edit && parsed.ext == main.ext
    })
}

/// Rename a file within a folder without losing data: the old entry is only
/// removed after the new entry has been fully written.
///
/// No-op when `old_name == new_name`. Fails with [`ReviewError::Conflict`]
/// when a file already exists under `new_name`.
pub fn rename_file_in_folder(
    folder: &dyn FolderStore,
    old_name: &str,
    new_name: &str,
) -> Result<(), ReviewError> {
    if old_name == new_name {
        return Ok(());
    }
    if folder.exists(new_name) {
        return Err(ReviewError::Conflict(new_name.to_string()));
    }

    let bytes = folder.read_bytes(old_name)?;
    folder.write_file(new_name, &bytes, true)?;
    folder.remove_entry(old_name)?;
    Ok(())
}

/// Duplicate a file under its edit-suffixed name, preserving the tag area
/// and extension, and return the new name.
///
/// Returns the input unchanged when the file already is an edit variant.
/// Fails with [`ReviewError::AlreadyExists`] when the edit copy exists.
pub fn create_edit_copy(folder: &dyn FolderStore, filename: &str) -> Result<String, ReviewError> {
    let mut parsed = parse_filename(filename);
    if parsed.edit {
        return Ok(filename.to_string());
    }
    parsed.edit = true;
    let new_name = compose_filename(&parsed);

    if folder.exists(&new_name) {
        return Err(ReviewError::AlreadyExists(new_name));
    }

    let bytes = folder.read_bytes(filename)?;
    folder.write_file(&new_name, &bytes, true)?;
    Ok(new_name)
}
