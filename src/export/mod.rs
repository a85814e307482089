use anyhow::Result;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::reconcile::{PhotographedSpecimen, PhotographedTaxon};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Json => "JSON",
            ExportFormat::Csv => "CSV",
        }
    }
}

/// One row of the photographed-taxa report.
#[derive(Debug, Serialize)]
pub struct TaxonReportRow {
    pub group: String,
    pub family: String,
    pub species: String,
    pub subspecies: String,
    pub folder_count: usize,
    pub folders: String,
}

/// One row of the photographed-specimens report.
#[derive(Debug, Serialize)]
pub struct SpecimenReportRow {
    pub collector: String,
    pub initials: String,
    pub number: String,
    pub accletter: String,
    pub family: String,
    pub species: String,
    pub subspecies: String,
    pub folder_count: usize,
    pub folders: String,
}

fn folder_names(folders: &[crate::scanner::PhotoFolder]) -> String {
    folders
        .iter()
        .map(|f| f.folder_name.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

fn taxon_rows(taxa: &[PhotographedTaxon]) -> Vec<TaxonReportRow> {
    taxa.iter()
        .map(|taxon| TaxonReportRow {
            group: taxon.taxonomy.group.clone().unwrap_or_default(),
            family: taxon.taxonomy.family.clone().unwrap_or_default(),
            species: taxon.taxonomy.species.clone().unwrap_or_default(),
            subspecies: taxon.taxonomy.subspecies.clone().unwrap_or_default(),
            folder_count: taxon.folders.len(),
            folders: folder_names(&taxon.folders),
        })
        .collect()
}

fn specimen_rows(specimens: &[PhotographedSpecimen]) -> Vec<SpecimenReportRow> {
    specimens
        .iter()
        .map(|spec| SpecimenReportRow {
            collector: spec.specimen.name.clone(),
            initials: spec.specimen.initials.clone(),
            number: spec.specimen.number.clone(),
            accletter: spec.specimen.accletter.clone(),
            family: spec.taxonomy.family.clone().unwrap_or_default(),
            species: spec.taxonomy.species.clone().unwrap_or_default(),
            subspecies: spec.taxonomy.subspecies.clone().unwrap_or_default(),
            folder_count: spec.folders.len(),
            folders: folder_names(&spec.folders),
        })
        .collect()
}

/// Export the photographed-taxa view; returns the row count.
pub fn export_photographed_taxa(
    taxa: &[PhotographedTaxon],
    output_path: &Path,
    format: ExportFormat,
) -> Result<usize> {
    let rows = taxon_rows(taxa);
    match format {
        ExportFormat::Json => export_json(&rows, output_path)?,
        ExportFormat::Csv => export_csv(&rows, output_path)?,
    }
    Ok(rows.len())
}

/// Export the photographed-specimens view; returns the row count.
pub fn export_photographed_specimens(
    specimens: &[PhotographedSpecimen],
    output_path: &Path,
    format: ExportFormat,
) -> Result<usize> {
    let rows = specimen_rows(specimens);
    match format {
        ExportFormat::Json => export_json(&rows, output_path)?,
        ExportFormat::Csv => export_csv(&rows, output_path)?,
    }
    Ok(rows.len())
}

fn export_json<T: Serialize>(rows: &[T], output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(rows)?;
    let mut file = File::create(output_path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

fn export_csv<T: Serialize>(rows: &[T], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::PhotoFolder;
    use crate::specimen::SpecimenMeta;
    use crate::taxonomy::TaxonomyRecord;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn sample_taxa() -> Vec<PhotographedTaxon> {
        vec![PhotographedTaxon {
            taxonomy: TaxonomyRecord {
                group: Some("Dicots".into()),
                family: Some("Moraceae".into()),
                species: Some("Ficus wassa".into()),
                subspecies: None,
            },
            folders: vec![PhotoFolder {
                folder_name: "AAM123".into(),
                full_path: PathBuf::from("/photos/AAM123"),
                has_images: true,
                specimen_meta: Some(SpecimenMeta {
                    initials: "AAM".into(),
                    number: "123".into(),
                    accletter: "".into(),
                }),
            }],
        }]
    }

    #[test]
    fn test_export_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("taxa.csv");
        let count = export_photographed_taxa(&sample_taxa(), &path, ExportFormat::Csv).unwrap();
        assert_eq!(count, 1);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Moraceae"));
        assert!(content.contains("AAM123"));
        // serde-derived header row
        assert!(content.starts_with("group,family,species,subspecies,folder_count,folders"));
    }

    #[test]
    fn test_export_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("taxa.json");
        export_photographed_taxa(&sample_taxa(), &path, ExportFormat::Json).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed[0]["family"], "Moraceae");
        assert_eq!(parsed[0]["folder_count"], 1);
    }
}
