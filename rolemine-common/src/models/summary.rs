//! Uploaded entity kinds and the data summary built from them
//!
//! Exactly five logical entities are expected: users, organizational units,
//! applications, entitlements and assignments.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// One parsed CSV row, keyed by header name
pub type Row = BTreeMap<String, serde_json::Value>;

/// Logical key of one uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Users,
    #[serde(alias = "ou")]
    Ous,
    Applications,
    Entitlements,
    #[serde(alias = "assignment")]
    Assignments,
}

impl EntityKind {
    /// All entity kinds in display order
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Users,
        EntityKind::Ous,
        EntityKind::Applications,
        EntityKind::Entitlements,
        EntityKind::Assignments,
    ];

    /// Canonical file name expected in an upload batch
    pub fn file_name(self) -> &'static str {
        match self {
            EntityKind::Users => "users.csv",
            EntityKind::Ous => "ou.csv",
            EntityKind::Applications => "applications.csv",
            EntityKind::Entitlements => "entitlements.csv",
            EntityKind::Assignments => "assignment.csv",
        }
    }

    /// Map an uploaded file name onto its entity kind (case-insensitive)
    ///
    /// Accepts both `ou.csv`/`ous.csv` and `assignment.csv`/`assignments.csv`.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let base = name
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or(name)
            .to_ascii_lowercase();
        match base.as_str() {
            "users.csv" => Some(EntityKind::Users),
            "ou.csv" | "ous.csv" => Some(EntityKind::Ous),
            "applications.csv" => Some(EntityKind::Applications),
            "entitlements.csv" => Some(EntityKind::Entitlements),
            "assignment.csv" | "assignments.csv" => Some(EntityKind::Assignments),
            _ => None,
        }
    }

    /// Multipart field name used by the backend upload endpoint
    pub fn upload_field(self) -> &'static str {
        match self {
            EntityKind::Users => "users",
            EntityKind::Ous => "ou",
            EntityKind::Applications => "applications",
            EntityKind::Entitlements => "entitlements",
            EntityKind::Assignments => "assignments",
        }
    }

    /// Card title shown in the summary view
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Users => "Users",
            EntityKind::Ous => "Organizational Units",
            EntityKind::Applications => "Applications",
            EntityKind::Entitlements => "Entitlements",
            EntityKind::Assignments => "Assignments",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Users => "users",
            EntityKind::Ous => "ous",
            EntityKind::Applications => "applications",
            EntityKind::Entitlements => "entitlements",
            EntityKind::Assignments => "assignments",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "users" => Ok(EntityKind::Users),
            "ous" | "ou" => Ok(EntityKind::Ous),
            "applications" => Ok(EntityKind::Applications),
            "entitlements" => Ok(EntityKind::Entitlements),
            "assignments" | "assignment" => Ok(EntityKind::Assignments),
            other => Err(ValidationError::new(
                "entity",
                format!("Unknown entity: {}", other),
            )),
        }
    }
}

/// Count, ordered columns and rows for one entity
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntitySummary {
    pub count: usize,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub data: Vec<Row>,
}

impl EntitySummary {
    /// Build a summary whose count always equals the number of rows
    pub fn from_rows(columns: Vec<String>, data: Vec<Row>) -> Self {
        Self {
            count: data.len(),
            columns,
            data,
        }
    }
}

/// Per-entity summary of an ingested upload set
///
/// Created once after ingestion, read-only afterward, replaced wholesale on re-upload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataSummary {
    entities: BTreeMap<EntityKind, EntitySummary>,
}

impl DataSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: EntityKind, summary: EntitySummary) {
        self.entities.insert(kind, summary);
    }

    pub fn get(&self, kind: EntityKind) -> Option<&EntitySummary> {
        self.entities.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityKind, &EntitySummary)> {
        self.entities.iter().map(|(kind, summary)| (*kind, summary))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Require all five entity kinds to be present
    pub fn validate(&self) -> Result<(), ValidationError> {
        let missing: Vec<&str> = EntityKind::ALL
            .iter()
            .filter(|kind| !self.entities.contains_key(kind))
            .map(|kind| kind.file_name())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(
                "summary",
                format!("Missing required files: {}", missing.join(", ")),
            ))
        }
    }
}

/// Counts-only summary shape returned by the backend's data-summary endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSummaryCounts {
    pub user_count: usize,
    pub organizational_unit_count: usize,
    pub application_count: usize,
    pub entitlement_count: usize,
    pub assignment_count: usize,
}

impl From<DataSummaryCounts> for DataSummary {
    fn from(counts: DataSummaryCounts) -> Self {
        let mut summary = DataSummary::new();
        for (kind, count) in [
            (EntityKind::Users, counts.user_count),
            (EntityKind::Ous, counts.organizational_unit_count),
            (EntityKind::Applications, counts.application_count),
            (EntityKind::Entitlements, counts.entitlement_count),
            (EntityKind::Assignments, counts.assignment_count),
        ] {
            summary.insert(
                kind,
                EntitySummary {
                    count,
                    ..Default::default()
                },
            );
        }
        summary
    }
}
