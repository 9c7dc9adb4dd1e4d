//! Roles and metadata options exchanged with the role mining backend

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier that may arrive as a number or a string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl RecordId {
    /// Parse a path segment, preferring the numeric form
    pub fn parse(s: &str) -> Self {
        s.parse::<i64>()
            .map(RecordId::Number)
            .unwrap_or_else(|_| RecordId::Text(s.to_string()))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Number(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

/// A named bundle of application/permission grants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub user_count: u64,
    #[serde(default)]
    pub applications: Vec<String>,
    #[serde(default)]
    pub permission_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<String>>,
    /// AI confidence in [0, 100]; absent for filter-based roles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Role {
    pub fn new(
        id: impl Into<RecordId>,
        name: impl Into<String>,
        user_count: u64,
        applications: &[&str],
        permission_count: u64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            user_count,
            applications: applications.iter().map(|a| a.to_string()).collect(),
            permission_count,
            permissions: None,
            users: None,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Selectable application or organizational unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedOption {
    pub id: RecordId,
    pub name: String,
}

impl NamedOption {
    pub fn new(id: impl Into<RecordId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Where a result set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    /// Returned by the role mining backend
    Backend,
    /// Locally generated placeholder after a backend failure
    Fallback,
}
