//! Placeholder data substituted when the backend cannot be reached
//!
//! Only used under `FailurePolicy::Fallback`.

use rolemine_common::models::{NamedOption, Role};
use serde_json::{json, Value};

/// Filter-based roles shown when the mining run fails
pub fn filter_roles() -> Vec<Role> {
    vec![
        Role::new(1, "Role 1", 15, &["App1", "App2"], 5),
        Role::new(2, "Role 2", 8, &["App2", "App3"], 3),
        Role::new(3, "Role 3", 12, &["App1", "App3", "App4"], 7),
    ]
}

/// Raw AI suggestions shown when the suggestion call fails
///
/// Returned in wire shape so they pass through the same cleaning pipeline as a live
/// response.
pub fn ai_suggestions() -> Vec<Value> {
    vec![
        json!({
            "id": 101,
            "name": "AI Role 1 - Sales Team",
            "userCount": 18,
            "applications": ["CRM", "Document Management", "Email System"],
            "permissionCount": 6,
            "aiGenerated": true,
            "confidence": 92
        }),
        json!({
            "id": 102,
            "name": "AI Role 2 - Finance Staff",
            "userCount": 9,
            "applications": ["Finance System", "ERP System"],
            "permissionCount": 8,
            "aiGenerated": true,
            "confidence": 88
        }),
        json!({
            "id": 103,
            "name": "AI Role 3 - HR Team",
            "userCount": 7,
            "applications": ["HR Portal", "Document Management"],
            "permissionCount": 5,
            "aiGenerated": true,
            "confidence": 79
        }),
    ]
}

pub fn applications() -> Vec<NamedOption> {
    [
        "Email System",
        "HR Portal",
        "Finance App",
        "CRM System",
        "Project Management Tool",
        "Document Management",
        "Inventory System",
        "Accounting Software",
    ]
    .iter()
    .enumerate()
    .map(|(i, name)| NamedOption::new(i as i64 + 1, *name))
    .collect()
}

pub fn organizational_units() -> Vec<NamedOption> {
    [
        "IT Department",
        "HR Division",
        "Finance Department",
        "Sales Team",
        "Marketing Division",
        "Development Team",
        "Quality Assurance",
        "Customer Support",
    ]
    .iter()
    .enumerate()
    .map(|(i, name)| NamedOption::new(i as i64 + 1, *name))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning::clean_ai_roles;

    #[test]
    fn test_three_filter_roles() {
        let roles = filter_roles();
        assert_eq!(roles.len(), 3);
        assert!(roles.iter().all(|r| r.confidence.is_none()));
    }

    #[test]
    fn test_ai_suggestions_survive_cleaning() {
        let roles = clean_ai_roles(&ai_suggestions());
        assert_eq!(roles.len(), 3);
        assert_eq!(roles[0].confidence, Some(92.0));
        assert_eq!(roles[2].applications, vec!["HR Portal", "Document Management"]);
    }

    #[test]
    fn test_option_lists() {
        assert_eq!(applications().len(), 8);
        assert_eq!(organizational_units()[7].name, "Customer Support");
    }
}
