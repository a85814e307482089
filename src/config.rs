use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::sheets::{FieldMapping, SheetSchema};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default)]
    pub collection: CollectionConfig,

    #[serde(default)]
    pub review: ReviewConfig,

    #[serde(default)]
    pub sources: SourcesConfig,

    #[serde(default)]
    pub occurrence: OccurrenceConfig,

    /// Collector name → initials. Defaults to the project roster.
    #[serde(default = "default_collectors")]
    pub collectors: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Root folder holding one photo folder per specimen.
    #[serde(default = "default_collection_root")]
    pub root: PathBuf,

    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
}

fn default_collection_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("specimen-photos")
}

fn default_image_extensions() -> Vec<String> {
    vec!["jpg".to_string(), "jpeg".to_string()]
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            root: default_collection_root(),
            image_extensions: default_image_extensions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Tag letter marking a specimen-reviewed photo.
    #[serde(default = "default_specimen_tag")]
    pub specimen_tag: char,

    /// Tag letter marking a taxon-reviewed photo.
    #[serde(default = "default_taxon_tag")]
    pub taxon_tag: char,
}

fn default_specimen_tag() -> char {
    's'
}

fn default_taxon_tag() -> char {
    't'
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            specimen_tag: default_specimen_tag(),
            taxon_tag: default_taxon_tag(),
        }
    }
}

/// One spreadsheet source: where the worksheet export lives and how its
/// columns map onto record fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: PathBuf,

    #[serde(default)]
    pub mapping: SheetSchema,
}

impl SourceConfig {
    /// Resolve the sheet path against the collection root when relative.
    pub fn resolved_path(&self, root: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            root.join(&self.path)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_checklist_source")]
    pub checklist: SourceConfig,

    #[serde(default = "default_field_notes_source")]
    pub field_notes: SourceConfig,
}

fn group_mapping(pairs: &[(&str, &str)]) -> FieldMapping {
    FieldMapping::Group(
        pairs
            .iter()
            .map(|(field, column)| (field.to_string(), column.to_string()))
            .collect(),
    )
}

fn default_checklist_source() -> SourceConfig {
    let mut fields = BTreeMap::new();
    fields.insert(
        "taxonomy".to_string(),
        group_mapping(&[
            ("group", "Group"),
            ("family", "Family"),
            ("species", "Species"),
            ("subspecies", "Subspecies"),
        ]),
    );
    SourceConfig {
        path: PathBuf::from("checklist.csv"),
        mapping: SheetSchema { fields },
    }
}

fn default_field_notes_source() -> SourceConfig {
    let mut fields = BTreeMap::new();
    fields.insert(
        "specimen".to_string(),
        group_mapping(&[
            ("name", "Collector"),
            ("initials", "Initials"),
            ("number", "Number"),
            ("accletter", "Acc"),
        ]),
    );
    fields.insert(
        "taxonomy".to_string(),
        group_mapping(&[
            ("group", "Group"),
            ("family", "Family"),
            ("genus", "Genus"),
            ("species_epithet", "Species"),
            ("subspecies_epithet", "Subspecies"),
        ]),
    );
    SourceConfig {
        path: PathBuf::from("field_notes.csv"),
        mapping: SheetSchema { fields },
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            checklist: default_checklist_source(),
            field_notes: default_field_notes_source(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccurrenceConfig {
    /// URL of the occurrence bridge script.
    #[serde(default = "default_occurrence_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_occurrence_host")]
    pub host: String,

    #[serde(default = "default_occurrence_port")]
    pub port: u16,

    #[serde(default = "default_occurrence_database")]
    pub database: String,

    /// Credentials are session-scoped; set them here only for unattended
    /// use.
    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub pass: Option<String>,
}

fn default_occurrence_endpoint() -> String {
    "http://127.0.0.1:8080/occurrence_api.php".to_string()
}

fn default_occurrence_host() -> String {
    "127.0.0.1".to_string()
}

fn default_occurrence_port() -> u16 {
    3306
}

fn default_occurrence_database() -> String {
    "symbiota".to_string()
}

impl Default for OccurrenceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_occurrence_endpoint(),
            host: default_occurrence_host(),
            port: default_occurrence_port(),
            database: default_occurrence_database(),
            user: None,
            pass: None,
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("herbaria")
        .join("herbaria.db")
}

fn default_collectors() -> BTreeMap<String, String> {
    // The project roster; kept in the config file so the curator can extend
    // it without a rebuild.
    crate::specimen::CollectorTable::defaults().into_map()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            collection: CollectionConfig::default(),
            review: ReviewConfig::default(),
            sources: SourcesConfig::default(),
            occurrence: OccurrenceConfig::default(),
            collectors: default_collectors(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            // Create default config
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("malformed config at {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Mapping schemas are checked once here, not per row.
    pub fn validate(&self) -> Result<()> {
        self.sources
            .checklist
            .mapping
            .validate()
            .context("checklist mapping")?;
        self.sources
            .field_notes
            .mapping
            .validate()
            .context("field notes mapping")?;
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("herbaria")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.review.specimen_tag, 's');
        assert_eq!(parsed.sources.checklist.path, PathBuf::from("checklist.csv"));
        assert_eq!(
            parsed.collectors.get("Gregory M. Plunkett").map(String::as_str),
            Some("GMP")
        );
    }

    #[test]
    fn test_source_path_resolution() {
        let source = SourceConfig {
            path: PathBuf::from("checklist.csv"),
            mapping: SheetSchema::default(),
        };
        assert_eq!(
            source.resolved_path(Path::new("/photos")),
            PathBuf::from("/photos/checklist.csv")
        );

        let absolute = SourceConfig {
            path: PathBuf::from("/data/checklist.csv"),
            mapping: SheetSchema::default(),
        };
        assert_eq!(
            absolute.resolved_path(Path::new("/photos")),
            PathBuf::from("/data/checklist.csv")
        );
    }
}
