//! Client for the remote occurrence bridge.
//!
//! The occurrence database sits behind a small HTTP bridge that multiplexes
//! three endpoints over POST: fetch the collection (fixed column
//! projection), batch-update identification fields by occid list, and dump
//! the full table as a bulk INSERT statement. Every request carries the
//! database connection parameters in its JSON body; credentials are held
//! only for the session and never persisted by this client.
//!
//! The three operations fail independently; none of them touches local
//! state, and nothing is retried automatically.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Sentinel accepted by the bridge for "leave identifiedBy unchanged".
pub const KEEP_UNCHANGED: &str = "__KEEP_UNCHANGED__";

/// Database connection parameters forwarded to the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub database: String,
}

/// One occurrence row, in the bridge's fixed projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccurrenceRecord {
    pub occid: i64,
    #[serde(rename = "occurrenceID")]
    pub occurrence_id: Option<String>,
    pub family: Option<String>,
    pub sciname: Option<String>,
    #[serde(rename = "scientificNameAuthorship")]
    pub scientific_name_authorship: Option<String>,
    #[serde(rename = "identifiedBy")]
    pub identified_by: Option<String>,
    #[serde(rename = "dateIdentified")]
    pub date_identified: Option<String>,
    #[serde(rename = "recordedBy")]
    pub recorded_by: Option<String>,
    #[serde(rename = "recordNumber")]
    pub record_number: Option<String>,
    #[serde(rename = "eventDate")]
    pub event_date: Option<String>,
    pub country: Option<String>,
    #[serde(rename = "stateProvince")]
    pub state_province: Option<String>,
    pub county: Option<String>,
}

/// Edit to one identification field. `Keep` leaves the column untouched,
/// `Clear` sets it to SQL NULL, `Set` writes a value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldEdit {
    #[default]
    Keep,
    Clear,
    Set(String),
}

impl FieldEdit {
    /// The bridge's wire convention: absent = keep, empty string = NULL,
    /// anything else = value.
    fn wire_value(&self) -> Option<String> {
        match self {
            FieldEdit::Keep => None,
            FieldEdit::Clear => Some(String::new()),
            FieldEdit::Set(value) => Some(value.clone()),
        }
    }
}

/// A batch identification update for a set of occurrence ids.
#[derive(Debug, Clone, Default)]
pub struct IdentificationUpdate {
    pub occids: Vec<i64>,
    pub family: FieldEdit,
    pub sciname: FieldEdit,
    pub authorship: FieldEdit,
    pub identified_by: FieldEdit,
    pub date_identified: FieldEdit,
}

impl IdentificationUpdate {
    /// Build the request body. `identified_by` is special-cased with the
    /// keep-unchanged sentinel the bridge expects; the other fields are
    /// simply omitted when kept.
    pub fn to_body(&self, db: &DbParams) -> serde_json::Value {
        let mut body = json!({
            "db": db,
            "occids": self.occids,
        });
        let map = body.as_object_mut().expect("body is an object");

        if let Some(value) = self.family.wire_value() {
            map.insert("family".to_string(), json!(value));
        }
        if let Some(value) = self.sciname.wire_value() {
            map.insert("newSciname".to_string(), json!(value));
        }
        if let Some(value) = self.authorship.wire_value() {
            map.insert("newScientificNameAuthorship".to_string(), json!(value));
        }
        match self.identified_by.wire_value() {
            Some(value) => map.insert("identifiedBy".to_string(), json!(value)),
            None => map.insert("identifiedBy".to_string(), json!(KEEP_UNCHANGED)),
        };
        if let Some(value) = self.date_identified.wire_value() {
            map.insert("dateIdentified".to_string(), json!(value));
        }

        body
    }

    /// True when the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.family == FieldEdit::Keep
            && self.sciname == FieldEdit::Keep
            && self.authorship == FieldEdit::Keep
            && self.identified_by == FieldEdit::Keep
            && self.date_identified == FieldEdit::Keep
    }
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    success: Option<bool>,
    message: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BackupResponse {
    success: Option<bool>,
    sql: Option<String>,
    message: Option<String>,
    #[serde(rename = "rowCount")]
    row_count: Option<u64>,
    error: Option<String>,
}

/// Result of a successful batch update.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub message: String,
}

/// A full-table backup: the bulk INSERT text and how many rows it covers.
#[derive(Debug, Clone)]
pub struct BackupDump {
    pub sql: String,
    pub row_count: u64,
    pub message: String,
}

pub struct OccurrenceClient {
    endpoint: String,
    db: DbParams,
}

impl OccurrenceClient {
    pub fn new(endpoint: impl Into<String>, db: DbParams) -> Self {
        Self {
            endpoint: endpoint.into(),
            db,
        }
    }

    fn url(&self, operation: &str) -> String {
        format!("{}?endpoint={}", self.endpoint, operation)
    }

    /// Fetch the full collection in the bridge's fixed projection.
    pub fn fetch_collection(&self) -> Result<Vec<OccurrenceRecord>> {
        let response = ureq::post(&self.url("get_collection"))
            .send_json(json!({ "db": self.db }))
            .map_err(|e| anyhow!("occurrence fetch failed: {e}"))?;

        let records: Vec<OccurrenceRecord> = response
            .into_json()
            .context("failed to parse occurrence records")?;
        tracing::info!(count = records.len(), "fetched occurrence collection");
        Ok(records)
    }

    /// Apply a batch identification update. Refuses locally when the occid
    /// list is empty or no field would change.
    pub fn batch_update_identification(
        &self,
        update: &IdentificationUpdate,
    ) -> Result<UpdateOutcome> {
        if update.occids.is_empty() {
            return Err(anyhow!("no occurrence ids selected"));
        }
        if update.is_empty() {
            return Err(anyhow!("no fields to update"));
        }

        let body = update.to_body(&self.db);
        let response = ureq::post(&self.url("batch_update_identification"))
            .send_json(body)
            .map_err(|e| anyhow!("occurrence update failed: {e}"))?;

        let parsed: UpdateResponse = response
            .into_json()
            .context("failed to parse update response")?;
        if let Some(error) = parsed.error {
            return Err(anyhow!("occurrence update rejected: {error}"));
        }
        if parsed.success != Some(true) {
            return Err(anyhow!("occurrence update did not report success"));
        }

        Ok(UpdateOutcome {
            message: parsed.message.unwrap_or_default(),
        })
    }

    /// Request a full-table backup dump.
    pub fn backup(&self) -> Result<BackupDump> {
        let response = ureq::post(&self.url("backup_omoccurrences"))
            .send_json(json!({ "db": self.db }))
            .map_err(|e| anyhow!("occurrence backup failed: {e}"))?;

        let parsed: BackupResponse = response
            .into_json()
            .context("failed to parse backup response")?;
        if let Some(error) = parsed.error {
            return Err(anyhow!("occurrence backup rejected: {error}"));
        }
        if parsed.success != Some(true) {
            return Err(anyhow!("occurrence backup did not report success"));
        }

        Ok(BackupDump {
            sql: parsed.sql.unwrap_or_default(),
            row_count: parsed.row_count.unwrap_or(0),
            message: parsed.message.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> DbParams {
        DbParams {
            host: "db.example.org".into(),
            port: 3306,
            user: "curator".into(),
            pass: "secret".into(),
            database: "symbiota".into(),
        }
    }

    #[test]
    fn test_update_body_field_semantics() {
        let update = IdentificationUpdate {
            occids: vec![11, 12],
            family: FieldEdit::Set("Moraceae".into()),
            sciname: FieldEdit::Clear,
            authorship: FieldEdit::Keep,
            identified_by: FieldEdit::Keep,
            date_identified: FieldEdit::Set("2024-05-01".into()),
        };
        let body = update.to_body(&db());

        assert_eq!(body["occids"], json!([11, 12]));
        assert_eq!(body["family"], json!("Moraceae"));
        // Clear maps to the empty string the bridge turns into NULL.
        assert_eq!(body["newSciname"], json!(""));
        // Kept fields are omitted entirely...
        assert!(body.get("newScientificNameAuthorship").is_none());
        // ...except identifiedBy, which carries the sentinel.
        assert_eq!(body["identifiedBy"], json!(KEEP_UNCHANGED));
        assert_eq!(body["dateIdentified"], json!("2024-05-01"));
        assert_eq!(body["db"]["host"], json!("db.example.org"));
    }

    #[test]
    fn test_update_is_empty() {
        assert!(IdentificationUpdate::default().is_empty());
        let update = IdentificationUpdate {
            identified_by: FieldEdit::Clear,
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_occurrence_record_deserializes_bridge_json() {
        let json = r#"{
            "occid": 42,
            "occurrenceID": "urn:uuid:abc",
            "family": "Moraceae",
            "sciname": "Ficus wassa",
            "scientificNameAuthorship": "Roxb.",
            "identifiedBy": null,
            "dateIdentified": null,
            "recordedBy": "G. M. Plunkett",
            "recordNumber": "123",
            "eventDate": "2023-07-14",
            "country": "Vanuatu",
            "stateProvince": "Tafea",
            "county": null
        }"#;
        let record: OccurrenceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.occid, 42);
        assert_eq!(record.sciname.as_deref(), Some("Ficus wassa"));
        assert_eq!(record.identified_by, None);
        assert_eq!(record.state_province.as_deref(), Some("Tafea"));
    }

    #[test]
    fn test_client_refuses_empty_updates_locally() {
        let client = OccurrenceClient::new("http://localhost:9/api.php", db());
        assert!(client
            .batch_update_identification(&IdentificationUpdate::default())
            .is_err());
        let update = IdentificationUpdate {
            occids: vec![1],
            ..Default::default()
        };
        assert!(client.batch_update_identification(&update).is_err());
    }
}
