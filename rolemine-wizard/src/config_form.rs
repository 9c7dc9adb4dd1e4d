//! Mining configuration form
//!
//! Holds the raw draft as typed by the user, recomputes field validity on every
//! numeric change and only yields a `MiningConfig` when every field is valid.

use rolemine_common::models::mining_config::{
    DEFAULT_MAX_PERMISSIONS_PER_ROLE, DEFAULT_MIN_USERS_PER_ROLE,
};
use rolemine_common::models::MiningConfig;
use rolemine_common::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Message for any numeric value that is not a positive integer
pub const MUST_BE_POSITIVE: &str = "Must be at least 1";
/// Message for min permissions above max permissions
pub const MIN_EXCEEDS_MAX: &str = "Must not exceed maximum permissions per role";
/// Message for an empty required field
pub const REQUIRED: &str = "Required";

/// Numeric inputs of the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NumericField {
    MinUsersPerRole,
    MaxPermissionsPerRole,
    MinPermissionsPerRole,
}

impl NumericField {
    pub const ALL: [NumericField; 3] = [
        NumericField::MinUsersPerRole,
        NumericField::MaxPermissionsPerRole,
        NumericField::MinPermissionsPerRole,
    ];

    /// Wire/field name
    pub fn key(self) -> &'static str {
        match self {
            NumericField::MinUsersPerRole => "minUsersPerRole",
            NumericField::MaxPermissionsPerRole => "maxPermissionsPerRole",
            NumericField::MinPermissionsPerRole => "minPermissionsPerRole",
        }
    }

    /// Submission requires a value
    pub fn required(self) -> bool {
        !matches!(self, NumericField::MinPermissionsPerRole)
    }
}

/// Parse a raw numeric input; empty means "not entered"
fn parse_positive(raw: &str) -> Option<Result<u32, &'static str>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Some(match raw.parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(MUST_BE_POSITIVE),
    })
}

/// Draft of the mining configuration form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MiningConfigForm {
    applications: BTreeSet<String>,
    organizational_units: BTreeSet<String>,
    numeric: BTreeMap<NumericField, String>,
    enable_ai: bool,
    errors: BTreeMap<NumericField, &'static str>,
}

impl Default for MiningConfigForm {
    fn default() -> Self {
        let mut numeric = BTreeMap::new();
        numeric.insert(
            NumericField::MinUsersPerRole,
            DEFAULT_MIN_USERS_PER_ROLE.to_string(),
        );
        numeric.insert(
            NumericField::MaxPermissionsPerRole,
            DEFAULT_MAX_PERMISSIONS_PER_ROLE.to_string(),
        );
        numeric.insert(NumericField::MinPermissionsPerRole, String::new());

        Self {
            applications: BTreeSet::new(),
            organizational_units: BTreeSet::new(),
            numeric,
            enable_ai: true,
            errors: BTreeMap::new(),
        }
    }
}

impl MiningConfigForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefill from a previously submitted configuration
    pub fn from_config(config: &MiningConfig) -> Self {
        let mut form = Self {
            applications: config.applications.clone(),
            organizational_units: config.organizational_units.clone(),
            enable_ai: config.enable_ai,
            ..Self::default()
        };
        form.numeric.insert(
            NumericField::MinUsersPerRole,
            config.min_users_per_role.to_string(),
        );
        form.numeric.insert(
            NumericField::MaxPermissionsPerRole,
            config.max_permissions_per_role.to_string(),
        );
        form.numeric.insert(
            NumericField::MinPermissionsPerRole,
            config
                .min_permissions_per_role
                .map(|n| n.to_string())
                .unwrap_or_default(),
        );
        form.revalidate();
        form
    }

    pub fn set_numeric(&mut self, field: NumericField, raw: impl Into<String>) {
        self.numeric.insert(field, raw.into());
        self.revalidate();
    }

    pub fn numeric(&self, field: NumericField) -> &str {
        self.numeric.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn set_applications<I, S>(&mut self, applications: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.applications = applications.into_iter().map(Into::into).collect();
    }

    pub fn set_organizational_units<I, S>(&mut self, units: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.organizational_units = units.into_iter().map(Into::into).collect();
    }

    pub fn set_enable_ai(&mut self, enable: bool) {
        self.enable_ai = enable;
    }

    /// Field-level error messages
    pub fn errors(&self) -> &BTreeMap<NumericField, &'static str> {
        &self.errors
    }

    pub fn error(&self, field: NumericField) -> Option<&'static str> {
        self.errors.get(&field).copied()
    }

    /// Submit is enabled only when no field is invalid and required fields are filled
    pub fn can_submit(&self) -> bool {
        self.errors.is_empty()
            && NumericField::ALL
                .iter()
                .filter(|f| f.required())
                .all(|f| !self.numeric(*f).trim().is_empty())
    }

    /// Restore defaults
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Finalize the draft
    pub fn submit(&self) -> Result<MiningConfig, ValidationError> {
        if let Some((field, message)) = self.errors.iter().next() {
            return Err(ValidationError::new(field.key(), *message));
        }
        if let Some(field) = NumericField::ALL
            .iter()
            .find(|f| f.required() && self.numeric(**f).trim().is_empty())
        {
            return Err(ValidationError::new(field.key(), REQUIRED));
        }

        let value = |field: NumericField| parse_positive(self.numeric(field)).and_then(Result::ok);

        let config = MiningConfig {
            applications: self.applications.clone(),
            organizational_units: self.organizational_units.clone(),
            min_users_per_role: value(NumericField::MinUsersPerRole).unwrap_or_default(),
            max_permissions_per_role: value(NumericField::MaxPermissionsPerRole).unwrap_or_default(),
            min_permissions_per_role: value(NumericField::MinPermissionsPerRole),
            enable_ai: self.enable_ai,
        };
        config.validate()?;
        Ok(config)
    }

    fn revalidate(&mut self) {
        self.errors.clear();
        for field in NumericField::ALL {
            if let Some(Err(message)) = parse_positive(self.numeric(field)) {
                self.errors.insert(field, message);
            }
        }

        let min = parse_positive(self.numeric(NumericField::MinPermissionsPerRole));
        let max = parse_positive(self.numeric(NumericField::MaxPermissionsPerRole));
        if let (Some(Ok(min)), Some(Ok(max))) = (min, max) {
            if min > max {
                self.errors
                    .insert(NumericField::MinPermissionsPerRole, MIN_EXCEEDS_MAX);
            }
        }
    }
}

/// Raw form submission as received over HTTP
///
/// Numbers may arrive as JSON numbers or as the literal text typed into the field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSubmission {
    #[serde(default)]
    pub applications: Vec<String>,
    #[serde(default)]
    pub organizational_units: Vec<String>,
    #[serde(default, alias = "usersPerRole")]
    pub min_users_per_role: Option<serde_json::Value>,
    #[serde(default, alias = "permissionsPerRole")]
    pub max_permissions_per_role: Option<serde_json::Value>,
    #[serde(default, alias = "minEntitlementsPerRole")]
    pub min_permissions_per_role: Option<serde_json::Value>,
    #[serde(default, rename = "enableAI", alias = "useAi")]
    pub enable_ai: Option<bool>,
}

fn raw_text(value: &Option<serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

impl ConfigSubmission {
    /// Fill a fresh form from this submission
    pub fn into_form(self) -> MiningConfigForm {
        let mut form = MiningConfigForm::new();
        form.set_applications(self.applications);
        form.set_organizational_units(self.organizational_units);
        if let Some(enable) = self.enable_ai {
            form.set_enable_ai(enable);
        }
        for (field, value) in [
            (NumericField::MinUsersPerRole, &self.min_users_per_role),
            (NumericField::MaxPermissionsPerRole, &self.max_permissions_per_role),
            (NumericField::MinPermissionsPerRole, &self.min_permissions_per_role),
        ] {
            // absent or null keeps the default
            if value.is_some() {
                form.numeric.insert(field, raw_text(value));
            }
        }
        form.revalidate();
        form
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_submit() {
        let form = MiningConfigForm::new();
        assert!(form.can_submit());
        let config = form.submit().unwrap();
        assert_eq!(config, MiningConfig::default());
    }

    #[test]
    fn test_invalid_values_marked_and_block_submit() {
        for raw in ["0", "-1", "2.5", "abc", "1e3"] {
            let mut form = MiningConfigForm::new();
            form.set_numeric(NumericField::MinUsersPerRole, raw);
            assert_eq!(
                form.error(NumericField::MinUsersPerRole),
                Some(MUST_BE_POSITIVE),
                "raw={}",
                raw
            );
            assert!(!form.can_submit());
            let err = form.submit().unwrap_err();
            assert_eq!(err.field, "minUsersPerRole");
        }
    }

    #[test]
    fn test_fixing_value_clears_error() {
        let mut form = MiningConfigForm::new();
        form.set_numeric(NumericField::MaxPermissionsPerRole, "0");
        assert!(!form.can_submit());
        form.set_numeric(NumericField::MaxPermissionsPerRole, " 12 ");
        assert!(form.errors().is_empty());
        assert_eq!(form.submit().unwrap().max_permissions_per_role, 12);
    }

    #[test]
    fn test_empty_required_field_blocks_submit_without_error() {
        let mut form = MiningConfigForm::new();
        form.set_numeric(NumericField::MinUsersPerRole, "");
        assert!(form.errors().is_empty());
        assert!(!form.can_submit());
        assert_eq!(form.submit().unwrap_err().message, REQUIRED);
    }

    #[test]
    fn test_min_permissions_cross_check() {
        let mut form = MiningConfigForm::new();
        form.set_numeric(NumericField::MinPermissionsPerRole, "11");
        assert_eq!(
            form.error(NumericField::MinPermissionsPerRole),
            Some(MIN_EXCEEDS_MAX)
        );
        form.set_numeric(NumericField::MaxPermissionsPerRole, "20");
        assert!(form.can_submit());
        assert_eq!(form.submit().unwrap().min_permissions_per_role, Some(11));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut form = MiningConfigForm::new();
        form.set_applications(["CRM", "HR Portal"]);
        form.set_enable_ai(false);
        form.set_numeric(NumericField::MinUsersPerRole, "x");
        form.reset();
        assert_eq!(form, MiningConfigForm::default());
    }

    #[test]
    fn test_submission_accepts_numbers_and_text() {
        let submission: ConfigSubmission = serde_json::from_str(
            r#"{"applications": ["CRM"], "usersPerRole": "3", "maxPermissionsPerRole": 8, "enableAI": false}"#,
        )
        .unwrap();
        let config = submission.into_form().submit().unwrap();
        assert_eq!(config.min_users_per_role, 3);
        assert_eq!(config.max_permissions_per_role, 8);
        assert!(!config.enable_ai);
        assert!(config.applications.contains("CRM"));
    }

    #[test]
    fn test_submission_missing_fields_keep_defaults() {
        let submission: ConfigSubmission =
            serde_json::from_str(r#"{"maxPermissionsPerRole": null}"#).unwrap();
        let config = submission.into_form().submit().unwrap();
        assert_eq!(config, MiningConfig::default());
    }

    #[test]
    fn test_from_config_round_trips() {
        let config = MiningConfig {
            min_permissions_per_role: Some(2),
            ..Default::default()
        };
        let form = MiningConfigForm::from_config(&config);
        assert_eq!(form.numeric(NumericField::MinPermissionsPerRole), "2");
        assert_eq!(form.submit().unwrap(), config);
    }
}
