//! Taxonomy records and the canonical key used to join datasets.
//!
//! Checklist rows, field-notes rows and folder-derived records all reduce to
//! the same key, so cross-dataset joins are exact string matches. There is no
//! fuzzy matching anywhere in the pipeline.

use serde::{Deserialize, Serialize};

/// A taxon as it appears in the checklist or field notes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyRecord {
    pub group: Option<String>,
    pub family: Option<String>,
    pub species: Option<String>,
    pub subspecies: Option<String>,
}

impl TaxonomyRecord {
    pub fn new(
        group: impl Into<Option<String>>,
        family: impl Into<Option<String>>,
        species: impl Into<Option<String>>,
        subspecies: impl Into<Option<String>>,
    ) -> Self {
        Self {
            group: group.into(),
            family: family.into(),
            species: species.into(),
            subspecies: subspecies.into(),
        }
    }
}

/// Trim, lowercase, empty collapses to None.
fn norm(value: Option<&str>) -> Option<String> {
    let s = value?.trim().to_lowercase();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Canonical key: case-insensitive, whitespace-trimmed, empty-to-null,
/// pipe-joined `group|family|species|subspecies`. Two records denote the
/// same taxon iff their keys are equal.
pub fn taxonomy_key(taxonomy: &TaxonomyRecord) -> String {
    [
        &taxonomy.group,
        &taxonomy.family,
        &taxonomy.species,
        &taxonomy.subspecies,
    ]
    .iter()
    .map(|field| norm(field.as_deref()).unwrap_or_default())
    .collect::<Vec<_>>()
    .join("|")
}

/// Field-wise exact match after normalization. Equivalent to key equality;
/// provided as an alternate accessor.
pub fn taxonomies_match(a: &TaxonomyRecord, b: &TaxonomyRecord) -> bool {
    norm(a.group.as_deref()) == norm(b.group.as_deref())
        && norm(a.family.as_deref()) == norm(b.family.as_deref())
        && norm(a.species.as_deref()) == norm(b.species.as_deref())
        && norm(a.subspecies.as_deref()) == norm(b.subspecies.as_deref())
}

/// Display name: `Family – Species` (subspecies wins over species when
/// present). Purely presentational.
pub fn taxon_display_name(taxonomy: &TaxonomyRecord) -> String {
    let family = taxonomy.family.as_deref().unwrap_or("Unknown family");
    let name = taxonomy
        .subspecies
        .as_deref()
        .or(taxonomy.species.as_deref())
        .unwrap_or("Unknown species");
    format!("{family} – {name}")
}

/// Full path for display: `Group / Family / Subspecies-or-Species`.
pub fn taxon_full_path(taxonomy: &TaxonomyRecord) -> String {
    let mut parts = Vec::new();
    if let Some(group) = taxonomy.group.as_deref() {
        parts.push(group.trim());
    }
    if let Some(family) = taxonomy.family.as_deref() {
        parts.push(family.trim());
    }
    if let Some(subspecies) = taxonomy.subspecies.as_deref() {
        parts.push(subspecies.trim());
    } else if let Some(species) = taxonomy.species.as_deref() {
        parts.push(species.trim());
    }
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" / ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        group: Option<&str>,
        family: Option<&str>,
        species: Option<&str>,
        subspecies: Option<&str>,
    ) -> TaxonomyRecord {
        TaxonomyRecord {
            group: group.map(str::to_string),
            family: family.map(str::to_string),
            species: species.map(str::to_string),
            subspecies: subspecies.map(str::to_string),
        }
    }

    #[test]
    fn test_key_is_deterministic_and_insensitive() {
        let a = record(Some("Ferns - X"), Some("Fabaceae"), None, None);
        let b = record(Some("ferns - x"), Some(" fabaceae "), None, None);
        assert_eq!(taxonomy_key(&a), taxonomy_key(&b));
        assert_eq!(taxonomy_key(&a), "ferns - x|fabaceae||");
    }

    #[test]
    fn test_empty_and_absent_fields_collapse() {
        let a = record(None, Some("Fabaceae"), None, None);
        let b = record(Some(""), Some("Fabaceae"), Some("  "), None);
        assert_eq!(taxonomy_key(&a), taxonomy_key(&b));
        assert!(taxonomies_match(&a, &b));
    }

    #[test]
    fn test_match_requires_all_fields() {
        let a = record(Some("G"), Some("F"), Some("S"), None);
        let b = record(Some("G"), Some("F"), Some("S"), Some("Sub"));
        assert!(!taxonomies_match(&a, &b));
        assert_ne!(taxonomy_key(&a), taxonomy_key(&b));
    }

    #[test]
    fn test_display_name_prefers_subspecies() {
        let t = record(None, Some("Araliaceae"), Some("Polyscias sp."), Some("Polyscias sp. var. x"));
        assert_eq!(taxon_display_name(&t), "Araliaceae – Polyscias sp. var. x");
        let t = record(None, None, None, None);
        assert_eq!(taxon_display_name(&t), "Unknown family – Unknown species");
    }

    #[test]
    fn test_full_path_skips_missing_levels() {
        let t = record(Some("Dicots"), Some("Araliaceae"), Some("Polyscias sp."), None);
        assert_eq!(taxon_full_path(&t), "Dicots / Araliaceae / Polyscias sp.");
        let t = record(None, Some("Araliaceae"), None, None);
        assert_eq!(taxon_full_path(&t), "Araliaceae");
    }
}
