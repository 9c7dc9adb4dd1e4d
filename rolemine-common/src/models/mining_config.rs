//! Role mining configuration submitted to the backend

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::ValidationError;

/// Default minimum number of users sharing a role
pub const DEFAULT_MIN_USERS_PER_ROLE: u32 = 2;

/// Default maximum number of permissions bundled into one role
pub const DEFAULT_MAX_PERMISSIONS_PER_ROLE: u32 = 10;

/// Finalized mining configuration
///
/// Empty `applications`/`organizational_units` mean "all".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiningConfig {
    #[serde(default)]
    pub applications: BTreeSet<String>,

    #[serde(default)]
    pub organizational_units: BTreeSet<String>,

    #[serde(alias = "usersPerRole")]
    pub min_users_per_role: u32,

    #[serde(alias = "permissionsPerRole")]
    pub max_permissions_per_role: u32,

    /// Optional lower bound on entitlements per role
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "minEntitlementsPerRole"
    )]
    pub min_permissions_per_role: Option<u32>,

    #[serde(rename = "enableAI", alias = "useAi", default = "default_enable_ai")]
    pub enable_ai: bool,
}

fn default_enable_ai() -> bool {
    true
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            applications: BTreeSet::new(),
            organizational_units: BTreeSet::new(),
            min_users_per_role: DEFAULT_MIN_USERS_PER_ROLE,
            max_permissions_per_role: DEFAULT_MAX_PERMISSIONS_PER_ROLE,
            min_permissions_per_role: None,
            enable_ai: default_enable_ai(),
        }
    }
}

impl MiningConfig {
    /// Numeric fields must be positive; min permissions must not exceed max
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.min_users_per_role < 1 {
            return Err(ValidationError::new("minUsersPerRole", "Must be at least 1"));
        }
        if self.max_permissions_per_role < 1 {
            return Err(ValidationError::new(
                "maxPermissionsPerRole",
                "Must be at least 1",
            ));
        }
        if let Some(min) = self.min_permissions_per_role {
            if min < 1 {
                return Err(ValidationError::new(
                    "minPermissionsPerRole",
                    "Must be at least 1",
                ));
            }
            if min > self.max_permissions_per_role {
                return Err(ValidationError::new(
                    "minPermissionsPerRole",
                    "Must not exceed maximum permissions per role",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = MiningConfig::default();
        assert_eq!(config.min_users_per_role, 2);
        assert_eq!(config.max_permissions_per_role, 10);
        assert!(config.enable_ai);
        assert!(config.applications.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let config = MiningConfig {
            min_users_per_role: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.field, "minUsersPerRole");
        assert_eq!(err.message, "Must be at least 1");
    }

    #[test]
    fn test_min_permissions_must_not_exceed_max() {
        let config = MiningConfig {
            min_permissions_per_role: Some(12),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.field, "minPermissionsPerRole");
    }

    #[test]
    fn test_wire_format_and_aliases() {
        let json = serde_json::to_value(MiningConfig::default()).unwrap();
        assert_eq!(json["minUsersPerRole"], 2);
        assert_eq!(json["maxPermissionsPerRole"], 10);
        assert_eq!(json["enableAI"], true);
        assert!(json.get("minPermissionsPerRole").is_none());

        let parsed: MiningConfig = serde_json::from_str(
            r#"{"usersPerRole": 3, "permissionsPerRole": 7, "useAi": false}"#,
        )
        .unwrap();
        assert_eq!(parsed.min_users_per_role, 3);
        assert_eq!(parsed.max_permissions_per_role, 7);
        assert!(!parsed.enable_ai);
    }
}
