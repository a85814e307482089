//! Reconciliation of the three source datasets.
//!
//! The checklist is authoritative for which taxa exist; the field notes are
//! authoritative for which were collected and photographed; the folder scan
//! supplies the photos. The join runs entirely on taxonomy keys and the
//! `(initials, number, accletter)` specimen triple.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::scanner::PhotoFolder;
use crate::sheets::postprocess::{ChecklistRecord, FieldNoteRecord};
use crate::specimen::{meta_matches, resolve_initials, CollectorTable, SpecimenNumber};
use crate::taxonomy::{taxonomy_key, TaxonomyRecord};

/// One checklist taxon with all folders holding its photos.
#[derive(Debug, Clone)]
pub struct PhotographedTaxon {
    pub taxonomy: TaxonomyRecord,
    /// Unique by full path (folder name as fallback), union across all
    /// field-notes entries of the taxon.
    pub folders: Vec<PhotoFolder>,
}

impl crate::selector::SelectorItem for PhotographedTaxon {
    fn key(&self) -> String {
        taxonomy_key(&self.taxonomy)
    }
}

/// One (taxon, field-notes entry) pair with its matching folders. Sibling of
/// [`PhotographedTaxon`] for views needing per-specimen detail.
#[derive(Debug, Clone)]
pub struct PhotographedSpecimen {
    pub specimen: SpecimenNumber,
    pub taxonomy: TaxonomyRecord,
    pub folders: Vec<PhotoFolder>,
}

fn field_note_keys(field_notes: &[FieldNoteRecord]) -> HashSet<String> {
    field_notes
        .iter()
        .map(|fn_entry| taxonomy_key(&fn_entry.taxonomy))
        .collect()
}

/// Resolve the entry's collector initials, empty when unknown — an unknown
/// collector still yields a row, it just matches no folders.
fn entry_initials(entry: &FieldNoteRecord, collectors: &CollectorTable) -> String {
    resolve_initials(&entry.specimen, collectors).unwrap_or_default()
}

fn matching_folders<'a>(
    folders: &'a [PhotoFolder],
    initials: &str,
    number: &str,
    accletter: &str,
) -> impl Iterator<Item = &'a PhotoFolder> + 'a {
    let initials = initials.to_string();
    let number = number.to_string();
    let accletter = accletter.to_string();
    folders.iter().filter(move |folder| {
        folder.has_images
            && folder
                .specimen_meta
                .as_ref()
                .map(|meta| meta_matches(meta, &initials, &number, &accletter))
                .unwrap_or(false)
    })
}

fn compare_taxonomies(a: &TaxonomyRecord, b: &TaxonomyRecord) -> Ordering {
    let levels = |t: &TaxonomyRecord| {
        [
            t.group.clone().unwrap_or_default(),
            t.family.clone().unwrap_or_default(),
            t.species.clone().unwrap_or_default(),
            t.subspecies.clone().unwrap_or_default(),
        ]
    };
    levels(a).cmp(&levels(b))
}

/// Build the photographed-taxa view: one entry per checklist taxon present
/// in the field notes, with the union of folders matched by any of its
/// field-notes entries. Taxa with no folders are dropped. Sorted by
/// `(group, family, species, subspecies)`.
pub fn build_photographed_taxa(
    checklist: &[ChecklistRecord],
    field_notes: &[FieldNoteRecord],
    folders: &[PhotoFolder],
    collectors: &CollectorTable,
) -> Vec<PhotographedTaxon> {
    let fn_keys = field_note_keys(field_notes);

    let mut result = Vec::new();
    for record in checklist {
        let key = taxonomy_key(&record.taxonomy);
        if !fn_keys.contains(&key) {
            continue;
        }

        let mut seen = HashSet::new();
        let mut unique_folders = Vec::new();
        for entry in field_notes {
            if taxonomy_key(&entry.taxonomy) != key {
                continue;
            }
            let initials = entry_initials(entry, collectors);
            for folder in matching_folders(
                folders,
                &initials,
                &entry.specimen.number,
                &entry.specimen.accletter,
            ) {
                if seen.insert(folder.key()) {
                    unique_folders.push(folder.clone());
                }
            }
        }

        if !unique_folders.is_empty() {
            result.push(PhotographedTaxon {
                taxonomy: record.taxonomy.clone(),
                folders: unique_folders,
            });
        }
    }

    result.sort_by(|a, b| compare_taxonomies(&a.taxonomy, &b.taxonomy));
    result
}

/// Build the photographed-specimens view: one row per (taxon, field-notes
/// entry) pair, each with its own matching folders — possibly zero. Sorted
/// by taxonomy, then specimen number.
pub fn build_photographed_specimens(
    checklist: &[ChecklistRecord],
    field_notes: &[FieldNoteRecord],
    folders: &[PhotoFolder],
    collectors: &CollectorTable,
) -> Vec<PhotographedSpecimen> {
    let fn_keys = field_note_keys(field_notes);

    let mut result = Vec::new();
    for record in checklist {
        let key = taxonomy_key(&record.taxonomy);
        if !fn_keys.contains(&key) {
            continue;
        }

        for entry in field_notes {
            if taxonomy_key(&entry.taxonomy) != key {
                continue;
            }
            let initials = entry_initials(entry, collectors);
            let matched: Vec<PhotoFolder> = matching_folders(
                folders,
                &initials,
                &entry.specimen.number,
                &entry.specimen.accletter,
            )
            .cloned()
            .collect();

            result.push(PhotographedSpecimen {
                specimen: SpecimenNumber {
                    name: entry.specimen.name.clone(),
                    initials,
                    number: entry.specimen.number.clone(),
                    accletter: entry.specimen.accletter.trim().to_string(),
                },
                taxonomy: record.taxonomy.clone(),
                folders: matched,
            });
        }
    }

    result.sort_by(|a, b| {
        compare_taxonomies(&a.taxonomy, &b.taxonomy)
            .then_with(|| a.specimen.number.cmp(&b.specimen.number))
    });
    result
}

/// Checklist taxa whose key never appears in the field notes — the
/// complement of the photographed set's key filter.
pub fn taxa_without_photos(
    checklist: &[ChecklistRecord],
    field_notes: &[FieldNoteRecord],
) -> Vec<TaxonomyRecord> {
    let fn_keys = field_note_keys(field_notes);
    checklist
        .iter()
        .filter(|record| !fn_keys.contains(&taxonomy_key(&record.taxonomy)))
        .map(|record| record.taxonomy.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::specimen::SpecimenMeta;

    fn taxonomy(family: &str, species: &str) -> TaxonomyRecord {
        TaxonomyRecord {
            group: Some("Dicots".to_string()),
            family: Some(family.to_string()),
            species: Some(species.to_string()),
            subspecies: None,
        }
    }

    fn checklist_record(family: &str, species: &str) -> ChecklistRecord {
        ChecklistRecord {
            line_number: 2,
            taxonomy: taxonomy(family, species),
        }
    }

    fn field_note(
        family: &str,
        species: &str,
        name: &str,
        initials: &str,
        number: &str,
        accletter: &str,
    ) -> FieldNoteRecord {
        FieldNoteRecord {
            line_number: 2,
            specimen: SpecimenNumber {
                name: name.to_string(),
                initials: initials.to_string(),
                number: number.to_string(),
                accletter: accletter.to_string(),
            },
            taxonomy: taxonomy(family, species),
            flag: None,
        }
    }

    fn folder(name: &str, initials: &str, number: &str, accletter: &str) -> PhotoFolder {
        PhotoFolder {
            folder_name: name.to_string(),
            full_path: PathBuf::from(format!("/photos/{name}")),
            has_images: true,
            specimen_meta: Some(SpecimenMeta {
                initials: initials.to_string(),
                number: number.to_string(),
                accletter: accletter.to_string(),
            }),
        }
    }

    #[test]
    fn test_case_insensitive_initials_and_accletter_equivalence() {
        let checklist = vec![checklist_record("Moraceae", "Ficus wassa")];
        let field_notes = vec![field_note("Moraceae", "Ficus wassa", "", "AAM", "123", "")];
        // Folder initials lowercase, accession letter absent.
        let folders = vec![folder("aam123", "aam", "123", "")];

        let taxa = build_photographed_taxa(
            &checklist,
            &field_notes,
            &folders,
            &CollectorTable::defaults(),
        );
        assert_eq!(taxa.len(), 1);
        assert_eq!(taxa[0].folders.len(), 1);
        assert_eq!(taxa[0].folders[0].folder_name, "aam123");
    }

    #[test]
    fn test_folders_union_deduplicates_by_path() {
        let checklist = vec![checklist_record("Moraceae", "Ficus wassa")];
        // Two field-notes entries for the same taxon and specimen.
        let field_notes = vec![
            field_note("Moraceae", "Ficus wassa", "", "AAM", "123", ""),
            field_note("Moraceae", "Ficus wassa", "", "AAM", "123", ""),
        ];
        let folders = vec![folder("AAM123", "AAM", "123", "")];

        let taxa = build_photographed_taxa(
            &checklist,
            &field_notes,
            &folders,
            &CollectorTable::defaults(),
        );
        assert_eq!(taxa[0].folders.len(), 1);
    }

    #[test]
    fn test_taxa_with_no_folders_are_dropped() {
        let checklist = vec![checklist_record("Moraceae", "Ficus wassa")];
        let field_notes = vec![field_note("Moraceae", "Ficus wassa", "", "AAM", "999", "")];
        let folders = vec![folder("AAM123", "AAM", "123", "")];

        let taxa = build_photographed_taxa(
            &checklist,
            &field_notes,
            &folders,
            &CollectorTable::defaults(),
        );
        assert!(taxa.is_empty());
    }

    #[test]
    fn test_folders_without_images_never_match() {
        let checklist = vec![checklist_record("Moraceae", "Ficus wassa")];
        let field_notes = vec![field_note("Moraceae", "Ficus wassa", "", "AAM", "123", "")];
        let mut empty = folder("AAM123", "AAM", "123", "");
        empty.has_images = false;

        let taxa = build_photographed_taxa(
            &checklist,
            &field_notes,
            &[empty],
            &CollectorTable::defaults(),
        );
        assert!(taxa.is_empty());
    }

    #[test]
    fn test_initials_resolved_from_collector_table() {
        let checklist = vec![checklist_record("Moraceae", "Ficus wassa")];
        let field_notes = vec![field_note(
            "Moraceae",
            "Ficus wassa",
            "Gregory M. Plunkett",
            "",
            "123",
            "",
        )];
        let folders = vec![folder("GMP123", "GMP", "123", "")];

        let taxa = build_photographed_taxa(
            &checklist,
            &field_notes,
            &folders,
            &CollectorTable::defaults(),
        );
        assert_eq!(taxa.len(), 1);
    }

    #[test]
    fn test_absent_from_field_notes_means_without_photos() {
        let checklist = vec![
            checklist_record("Moraceae", "Ficus wassa"),
            checklist_record("Araliaceae", "Polyscias sp."),
        ];
        let field_notes = vec![field_note("Moraceae", "Ficus wassa", "", "AAM", "123", "")];
        let folders = vec![folder("AAM123", "AAM", "123", "")];

        let without = taxa_without_photos(&checklist, &field_notes);
        assert_eq!(without.len(), 1);
        assert_eq!(without[0].family.as_deref(), Some("Araliaceae"));

        let taxa = build_photographed_taxa(
            &checklist,
            &field_notes,
            &folders,
            &CollectorTable::defaults(),
        );
        assert_eq!(taxa.len(), 1);
        assert_eq!(taxa[0].taxonomy.family.as_deref(), Some("Moraceae"));
    }

    #[test]
    fn test_specimens_view_keeps_one_row_per_entry() {
        let checklist = vec![checklist_record("Moraceae", "Ficus wassa")];
        let field_notes = vec![
            field_note("Moraceae", "Ficus wassa", "", "AAM", "123", ""),
            field_note("Moraceae", "Ficus wassa", "", "GMP", "77", ""),
        ];
        let folders = vec![folder("AAM123", "AAM", "123", "")];

        let specimens = build_photographed_specimens(
            &checklist,
            &field_notes,
            &folders,
            &CollectorTable::defaults(),
        );
        assert_eq!(specimens.len(), 2);
        // Sorted by specimen number within the taxon.
        assert_eq!(specimens[0].specimen.number, "123");
        assert_eq!(specimens[0].folders.len(), 1);
        assert_eq!(specimens[1].specimen.number, "77");
        assert!(specimens[1].folders.is_empty());
    }

    #[test]
    fn test_sorted_by_taxonomy_levels() {
        let checklist = vec![
            checklist_record("Moraceae", "Ficus wassa"),
            checklist_record("Araliaceae", "Polyscias sp."),
        ];
        let field_notes = vec![
            field_note("Moraceae", "Ficus wassa", "", "AAM", "1", ""),
            field_note("Araliaceae", "Polyscias sp.", "", "AAM", "2", ""),
        ];
        let folders = vec![folder("AAM1", "AAM", "1", ""), folder("AAM2", "AAM", "2", "")];

        let taxa = build_photographed_taxa(
            &checklist,
            &field_notes,
            &folders,
            &CollectorTable::defaults(),
        );
        assert_eq!(taxa[0].taxonomy.family.as_deref(), Some("Araliaceae"));
        assert_eq!(taxa[1].taxonomy.family.as_deref(), Some("Moraceae"));
    }
}
