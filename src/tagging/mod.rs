//! Filename review-tag codec.
//!
//! Review status is persisted in the filenames themselves, the only wire
//! format owned by this crate: `<base>[+<sorted-tag-letters>][ edit]<.ext>`.
//! The tag bracket and the `" edit"` suffix are both optional and appear in
//! that order before the extension.

pub mod aggregate;
pub mod review;

use std::collections::BTreeSet;
use std::path::PathBuf;

/// A filename split into its tagging-relevant parts.
///
/// `tag` holds the tag letters in sorted, deduplicated order; `ext` includes
/// the leading dot (empty if the name has no extension).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilename {
    pub base: String,
    pub tag: String,
    pub edit: bool,
    pub ext: String,
}

/// A file observed during a folder scan. Transient, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedFile {
    pub name: String,
    pub path: PathBuf,
}

impl TaggedFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Parse a filename into `{ base, tag, edit, ext }`.
///
/// Stripping order is fixed: extension, then `" edit"`, then the tag
/// bracket. Reversing it would misparse names like `"X[+s] edit.jpg"`.
/// Total: malformed names come back with an empty tag and `edit == false`.
pub fn parse_filename(filename: &str) -> ParsedFilename {
    // Last '.'-delimited suffix, including the dot; a trailing dot is not
    // an extension.
    let (mut name, ext) = match filename.rfind('.') {
        Some(idx) if idx + 1 < filename.len() => {
            (&filename[..idx], filename[idx..].to_string())
        }
        _ => (filename, String::new()),
    };

    let mut edit = false;
    if let Some(stripped) = name.strip_suffix(" edit") {
        edit = true;
        name = stripped;
    }

    let mut tag = String::new();
    if let Some(stripped) = name.strip_suffix(']') {
        if let Some(idx) = stripped.rfind("[+") {
            let letters = &stripped[idx + 2..];
            if letters.chars().all(|c| c.is_ascii_lowercase()) {
                tag = letters.to_string();
                name = &name[..idx];
            }
        }
    }

    ParsedFilename {
        base: name.to_string(),
        tag,
        edit,
        ext,
    }
}

/// Compose a filename from parts. Exact left inverse of [`parse_filename`]
/// for any name this function produces.
pub fn compose_filename(parsed: &ParsedFilename) -> String {
    let mut name = parsed.base.clone();
    if !parsed.tag.is_empty() {
        name.push_str("[+");
        name.push_str(&parsed.tag);
        name.push(']');
    }
    if parsed.edit {
        name.push_str(" edit");
    }
    name + &parsed.ext
}

/// Flip membership of `letter` in the filename's tag set and return the
/// re-composed name. The tag set stays sorted and deduplicated; an emptied
/// tag area is dropped entirely.
pub fn toggle_tag_letter(filename: &str, letter: char) -> String {
    let mut parsed = parse_filename(filename);
    let mut letters: BTreeSet<char> = parsed.tag.chars().collect();
    if !letters.remove(&letter) {
        letters.insert(letter);
    }
    parsed.tag = letters.into_iter().collect();
    compose_filename(&parsed)
}

/// True if the filename carries `letter` in its tag area.
pub fn has_tag(filename: &str, letter: char) -> bool {
    parse_filename(filename).tag.contains(letter)
}

/// True if the filename is an `" edit"` variant.
pub fn is_edit_file(filename: &str) -> bool {
    parse_filename(filename).edit
}
