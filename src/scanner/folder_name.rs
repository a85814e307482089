//! Specimen metadata extraction from photo folder names.
//!
//! Folder names follow the collectors' convention of
//! `<initials><number>[<accletter>] <free text>`, with spaces, underscores or
//! dashes tolerated between the parts, e.g. `AAM123b Kalanchoe` or
//! `GMP 4321 coastal forest`. The accession letter must sit directly against
//! the number.

use crate::specimen::SpecimenMeta;

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '_' || c == '-'
}

/// Parse `{initials, number, accletter}` out of a folder name. `None` means
/// the folder does not follow the specimen naming convention.
pub fn parse_specimen_meta(folder_name: &str) -> Option<SpecimenMeta> {
    let mut chars = folder_name.trim_start().chars().peekable();

    let mut initials = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphabetic() {
            initials.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if initials.is_empty() {
        return None;
    }

    while let Some(&c) = chars.peek() {
        if is_separator(c) {
            chars.next();
        } else {
            break;
        }
    }

    let mut number = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            number.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if number.is_empty() {
        return None;
    }

    // Accession letter only when glued to the number and not the start of a
    // longer word.
    let mut accletter = String::new();
    if let Some(&c) = chars.peek() {
        if c.is_ascii_lowercase() {
            let mut lookahead = chars.clone();
            lookahead.next();
            let next_is_word = lookahead
                .peek()
                .map(|n| n.is_ascii_alphanumeric())
                .unwrap_or(false);
            if !next_is_word {
                accletter.push(c);
            }
        }
    }

    Some(SpecimenMeta {
        initials,
        number,
        accletter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compact_name() {
        let meta = parse_specimen_meta("AAM123b Kalanchoe").unwrap();
        assert_eq!(meta.initials, "AAM");
        assert_eq!(meta.number, "123");
        assert_eq!(meta.accletter, "b");
    }

    #[test]
    fn test_parse_spaced_name_without_accletter() {
        let meta = parse_specimen_meta("GMP 4321 coastal forest").unwrap();
        assert_eq!(meta.initials, "GMP");
        assert_eq!(meta.number, "4321");
        assert_eq!(meta.accletter, "");
    }

    #[test]
    fn test_parse_separators() {
        let meta = parse_specimen_meta("DMR_77").unwrap();
        assert_eq!(meta.initials, "DMR");
        assert_eq!(meta.number, "77");

        let meta = parse_specimen_meta("KEA-150a").unwrap();
        assert_eq!(meta.initials, "KEA");
        assert_eq!(meta.number, "150");
        assert_eq!(meta.accletter, "a");
    }

    #[test]
    fn test_word_after_number_is_not_accletter() {
        let meta = parse_specimen_meta("AAM123beach").unwrap();
        assert_eq!(meta.number, "123");
        assert_eq!(meta.accletter, "");
    }

    #[test]
    fn test_non_matching_names() {
        assert!(parse_specimen_meta("Misc photos").is_none());
        assert!(parse_specimen_meta("2021 trip").is_none());
        assert!(parse_specimen_meta("").is_none());
    }
}
