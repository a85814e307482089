//! Specimen numbering and the collector-initials lookup.
//!
//! Matching between field-notes entries and photo folders runs on the triple
//! `(initials, number, accletter)`. Initials compare case-insensitively;
//! accession letters treat empty and absent as the same value, which is
//! load-bearing for the join.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Specimen number as recorded in field notes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecimenNumber {
    /// Collector's full name as written in the sheet.
    pub name: String,
    /// Collector initials; may be blank when only the name was recorded.
    pub initials: String,
    pub number: String,
    /// Accession letter; empty means none.
    pub accletter: String,
}

/// Specimen metadata parsed out of a photo folder's name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecimenMeta {
    pub initials: String,
    pub number: String,
    pub accletter: String,
}

fn norm(value: &str) -> &str {
    value.trim()
}

pub fn same_initials(a: &str, b: &str) -> bool {
    norm(a).eq_ignore_ascii_case(norm(b))
}

pub fn same_number(a: &str, b: &str) -> bool {
    norm(a) == norm(b)
}

/// Empty and absent accession letters are equal by construction: both are
/// stored as the empty string.
pub fn same_accletter(a: &str, b: &str) -> bool {
    norm(a) == norm(b)
}

/// The full folder-vs-specimen predicate.
pub fn meta_matches(meta: &SpecimenMeta, initials: &str, number: &str, accletter: &str) -> bool {
    same_initials(&meta.initials, initials)
        && same_number(&meta.number, number)
        && same_accletter(&meta.accletter, accletter)
}

/// Injected collector-name → initials lookup. Decouples reconciliation from
/// the concrete table contents, which are configurable.
#[derive(Debug, Clone, Default)]
pub struct CollectorTable {
    map: BTreeMap<String, String>,
}

impl CollectorTable {
    pub fn new(map: BTreeMap<String, String>) -> Self {
        Self { map }
    }

    /// The project's collector roster.
    pub fn defaults() -> Self {
        let mut map = BTreeMap::new();
        for (name, initials) in [
            ("Ashley A McGuigan", "AAM"),
            ("David Bruy", "DB"),
            ("Dominik M. Ramik", "DMR"),
            ("Gregory M. Plunkett", "GMP"),
            ("Jérôme Munzinger", "JM"),
            ("Kate Armstrong", "KEA"),
            ("Keith E. Clancy", "KEC"),
            ("Laurence Ramon", "LR"),
            ("Michael J. Balick", "MJB"),
            ("R. Sean Thackurdeen", "RST"),
            ("Tom A. Ranker", "TAR"),
        ] {
            map.insert(name.to_string(), initials.to_string());
        }
        Self { map }
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.map.get(name.trim()).map(String::as_str)
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.map
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Resolve a specimen's collector initials: the explicit value wins, then
/// the table by collector name. `None` means the collector is unknown; the
/// caller keeps the row and flags it rather than dropping it.
pub fn resolve_initials(specimen: &SpecimenNumber, table: &CollectorTable) -> Option<String> {
    let explicit = specimen.initials.trim();
    if !explicit.is_empty() {
        return Some(explicit.to_string());
    }
    table.lookup(&specimen.name).map(str::to_string)
}
