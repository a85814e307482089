//! Tag counting and edit/original deduplication over scanned file lists.
//!
//! A `(base, ext)` pair is one identity: an edit variant and its original
//! collapse to a single countable unit.

use std::collections::HashSet;

use super::{parse_filename, TaggedFile};

/// Count distinct `(base, ext)` identities where any variant (edit or
/// original) carries `letter` in its tag. Each identity counts at most once
/// even if both variants are tagged.
pub fn count_tagged_files(files: &[TaggedFile], letter: char) -> usize {
    let mut seen = HashSet::new();
    let mut count = 0;
    for file in files {
        let parsed = parse_filename(&file.name);
        if parsed.tag.contains(letter) {
            // The edit flag is deliberately absent from the key.
            let key = format!("{}{}", parsed.base, parsed.ext);
            if seen.insert(key) {
                count += 1;
            }
        }
    }
    count
}

/// For each `(base, ext)` identity, keep the edit variant if one exists,
/// else the original. Never emits both variants of one identity. Output is
/// sorted by name.
pub fn prefer_edit_files(files: &[TaggedFile]) -> Vec<TaggedFile> {
    let edited: HashSet<String> = files
        .iter()
        .filter_map(|f| {
            let parsed = parse_filename(&f.name);
            parsed
                .edit
                .then(|| format!("{}{}", parsed.base, parsed.ext))
        })
        .collect();

    let mut seen = HashSet::new();
    let mut display: Vec<TaggedFile> = Vec::new();
    for file in files {
        let parsed = parse_filename(&file.name);
        let key = format!("{}{}", parsed.base, parsed.ext);
        if parsed.edit {
            if seen.insert(key) {
                display.push(file.clone());
            }
        } else if !edited.contains(&key) && seen.insert(key) {
            display.push(file.clone());
        }
    }

    display.sort_by(|a, b| a.name.cmp(&b.name));
    display
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(names: &[&str]) -> Vec<TaggedFile> {
        names.iter().map(|n| TaggedFile::new(*n, n)).collect()
    }

    #[test]
    fn test_count_collapses_edit_pairs() {
        let files = tagged(&["A[+s].jpg", "A[+s] edit.jpg"]);
        assert_eq!(count_tagged_files(&files, 's'), 1);
    }

    #[test]
    fn test_count_distinct_identities() {
        let files = tagged(&["A[+s].jpg", "B[+st].jpg", "C[+t].jpg", "C[+s] edit.jpg"]);
        assert_eq!(count_tagged_files(&files, 's'), 3);
        assert_eq!(count_tagged_files(&files, 't'), 2);
        assert_eq!(count_tagged_files(&files, 'x'), 0);
    }

    #[test]
    fn test_prefer_edit_files() {
        let files = tagged(&["A.jpg", "A edit.jpg", "B.jpg"]);
        let names: Vec<String> = prefer_edit_files(&files)
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["A edit.jpg", "B.jpg"]);
    }

    #[test]
    fn test_prefer_edit_respects_extension_identity() {
        // Same base, different extension: independent identities.
        let files = tagged(&["A.jpg", "A edit.jpeg", "A.jpeg"]);
        let names: Vec<String> = prefer_edit_files(&files)
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["A edit.jpeg", "A.jpg"]);
    }

    #[test]
    fn test_prefer_edit_never_duplicates_identity() {
        let files = tagged(&["A[+s] edit.jpg", "A[+s].jpg", "A edit.jpg"]);
        // Two edit names share the identity only if base+ext match; here
        // "A[+s] edit.jpg" and "A edit.jpg" both reduce to A + .jpg.
        let names: Vec<String> = prefer_edit_files(&files)
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["A[+s] edit.jpg"]);
    }
}
