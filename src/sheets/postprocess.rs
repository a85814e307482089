//! Typed decoding of mapped sheet rows into checklist and field-notes
//! records, including the field-notes cleanup pass.

use serde::{Deserialize, Serialize};

use crate::specimen::{CollectorTable, SpecimenNumber};
use crate::taxonomy::TaxonomyRecord;

use super::SheetRow;

/// One checklist row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistRecord {
    pub line_number: u32,
    pub taxonomy: TaxonomyRecord,
}

/// Row-level flags attached by postprocessing. Flagged rows are kept, not
/// dropped, so downstream joins can report them instead of losing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowFlag {
    UnknownCollector,
}

/// One field-notes row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNoteRecord {
    pub line_number: u32,
    pub specimen: SpecimenNumber,
    pub taxonomy: TaxonomyRecord,
    pub flag: Option<RowFlag>,
}

fn opt(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Decode checklist rows. The checklist sheet records taxonomy directly in
/// its final form; no cleanup applies.
pub fn decode_checklist(rows: &[SheetRow]) -> Vec<ChecklistRecord> {
    rows.iter()
        .map(|row| ChecklistRecord {
            line_number: row.line_number,
            taxonomy: TaxonomyRecord {
                group: opt(row.group_text("taxonomy", "group")),
                family: opt(row.group_text("taxonomy", "family")),
                species: opt(row.group_text("taxonomy", "species")),
                subspecies: opt(row.group_text("taxonomy", "subspecies")),
            },
        })
        .collect()
}

/// Decode field-notes rows and run the cleanup pass:
///
/// - collector initials filled in from the table when the sheet has none;
/// - group values like `"02 - Ferns"` lose the prefix up to the first `-`;
/// - species composed as `"{genus} {epithet}"`, subspecies as
///   `"{genus} {epithet} {subspecies epithet}"`, when the parts exist.
///
/// Rows whose collector cannot be resolved are flagged
/// [`RowFlag::UnknownCollector`]; their taxonomy is left as recorded.
pub fn decode_field_notes(rows: &[SheetRow], collectors: &CollectorTable) -> Vec<FieldNoteRecord> {
    rows.iter()
        .map(|row| {
            let mut specimen = SpecimenNumber {
                name: row.group_text("specimen", "name").trim().to_string(),
                initials: row.group_text("specimen", "initials").trim().to_string(),
                number: row.group_text("specimen", "number").trim().to_string(),
                accletter: row.group_text("specimen", "accletter").trim().to_string(),
            };

            let mut taxonomy = TaxonomyRecord {
                group: opt(row.group_text("taxonomy", "group")),
                family: opt(row.group_text("taxonomy", "family")),
                species: None,
                subspecies: None,
            };
            let genus = row.group_text("taxonomy", "genus").trim().to_string();
            let species_epithet = row
                .group_text("taxonomy", "species_epithet")
                .trim()
                .to_string();
            let subspecies_epithet = row
                .group_text("taxonomy", "subspecies_epithet")
                .trim()
                .to_string();

            let resolved = crate::specimen::resolve_initials(&specimen, collectors);
            let flag = match resolved {
                Some(initials) => {
                    specimen.initials = initials;

                    if let Some(group) = taxonomy.group.take() {
                        taxonomy.group = Some(strip_group_prefix(&group));
                    }
                    if !genus.is_empty() && !species_epithet.is_empty() {
                        taxonomy.species = Some(format!("{genus} {species_epithet}"));
                        if !subspecies_epithet.is_empty() {
                            taxonomy.subspecies =
                                Some(format!("{genus} {species_epithet} {subspecies_epithet}"));
                        }
                    }
                    None
                }
                None => {
                    tracing::warn!(
                        line = row.line_number,
                        collector = %specimen.name,
                        "unknown collector in field notes"
                    );
                    Some(RowFlag::UnknownCollector)
                }
            };

            FieldNoteRecord {
                line_number: row.line_number,
                specimen,
                taxonomy,
                flag,
            }
        })
        .collect()
}

/// `"02 - Ferns"` → `"Ferns"`. Groups without a dash pass through.
fn strip_group_prefix(group: &str) -> String {
    match group.split_once('-') {
        Some((_, rest)) => rest.trim().to_string(),
        None => group.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::{FieldMapping, SheetSchema};
    use std::collections::BTreeMap;

    fn field_notes_schema() -> SheetSchema {
        let mut fields = BTreeMap::new();
        fields.insert(
            "specimen".to_string(),
            FieldMapping::Group(BTreeMap::from([
                ("name".to_string(), "Collector".to_string()),
                ("number".to_string(), "Number".to_string()),
                ("accletter".to_string(), "Acc".to_string()),
            ])),
        );
        fields.insert(
            "taxonomy".to_string(),
            FieldMapping::Group(BTreeMap::from([
                ("group".to_string(), "Group".to_string()),
                ("family".to_string(), "Family".to_string()),
                ("genus".to_string(), "Genus".to_string()),
                ("species_epithet".to_string(), "Species".to_string()),
                ("subspecies_epithet".to_string(), "Subspecies".to_string()),
            ])),
        );
        SheetSchema { fields }
    }

    fn decode(csv: &str) -> Vec<FieldNoteRecord> {
        let rows = crate::sheets::read_sheet(csv.as_bytes(), &field_notes_schema()).unwrap();
        decode_field_notes(&rows, &CollectorTable::defaults())
    }

    #[test]
    fn test_known_collector_gets_initials_and_cleanup() {
        let records = decode(
            "Collector,Number,Acc,Group,Family,Genus,Species,Subspecies\n\
             Gregory M. Plunkett,123,b,02 - Ferns,Aspleniaceae,Asplenium,nidus,\n",
        );
        let record = &records[0];
        assert_eq!(record.specimen.initials, "GMP");
        assert_eq!(record.specimen.number, "123");
        assert_eq!(record.specimen.accletter, "b");
        assert_eq!(record.taxonomy.group.as_deref(), Some("Ferns"));
        assert_eq!(record.taxonomy.species.as_deref(), Some("Asplenium nidus"));
        assert_eq!(record.taxonomy.subspecies, None);
        assert!(record.flag.is_none());
    }

    #[test]
    fn test_subspecies_composition() {
        let records = decode(
            "Collector,Number,Acc,Group,Family,Genus,Species,Subspecies\n\
             Kate Armstrong,9,,Dicots,Moraceae,Ficus,wassa,minor\n",
        );
        assert_eq!(
            records[0].taxonomy.subspecies.as_deref(),
            Some("Ficus wassa minor")
        );
    }

    #[test]
    fn test_unknown_collector_is_flagged_and_kept() {
        let records = decode(
            "Collector,Number,Acc,Group,Family,Genus,Species,Subspecies\n\
             Nobody In Particular,5,,02 - Ferns,Aspleniaceae,Asplenium,nidus,\n",
        );
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.flag, Some(RowFlag::UnknownCollector));
        assert_eq!(record.specimen.initials, "");
        // Taxonomy stays as recorded; the cleanup pass does not run.
        assert_eq!(record.taxonomy.group.as_deref(), Some("02 - Ferns"));
        assert_eq!(record.taxonomy.species, None);
    }

    #[test]
    fn test_decode_checklist() {
        let mut fields = BTreeMap::new();
        fields.insert(
            "taxonomy".to_string(),
            FieldMapping::Group(BTreeMap::from([
                ("group".to_string(), "Group".to_string()),
                ("family".to_string(), "Family".to_string()),
                ("species".to_string(), "Species".to_string()),
                ("subspecies".to_string(), "Subspecies".to_string()),
            ])),
        );
        let schema = SheetSchema { fields };
        let rows = crate::sheets::read_sheet(
            b"Group,Family,Species,Subspecies\nFerns,Aspleniaceae,Asplenium nidus,\n",
            &schema,
        )
        .unwrap();
        let records = decode_checklist(&rows);
        assert_eq!(records[0].line_number, 2);
        assert_eq!(
            records[0].taxonomy.species.as_deref(),
            Some("Asplenium nidus")
        );
        assert_eq!(records[0].taxonomy.subspecies, None);
    }
}
