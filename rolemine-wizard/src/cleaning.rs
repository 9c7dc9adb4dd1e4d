//! AI suggestion cleaning and de-duplication
//!
//! AI-suggested roles arrive as loosely shaped JSON: names carry markdown emphasis and
//! trailing descriptive text, application lists carry stray metadata strings, and
//! numeric fields may be strings or missing. This module turns such a list into
//! well-formed `Role`s and collapses near-duplicate suggestions, keeping the most
//! confident one per group.
//!
//! Everything here is pure; the label, separator and token lists are the only tuning
//! surface.

use rolemine_common::models::{RecordId, Role};
use serde_json::Value;
use std::collections::HashMap;

/// Metadata labels that mark the end of a role name (matched case-insensitively)
pub const METADATA_LABELS: &[&str] = &[
    "Key Permissions",
    "Justification",
    "Confidence Level",
    "Estimated User Count",
    "Confidence:",
    "User Count:",
    "Description:",
];

/// Separators tried, in order, when a cleaned name is still too long
pub const NAME_SEPARATORS: &[&str] = &[" Key permissions:", " -", "."];

/// Emphasis markers stripped from names and application entries
pub const MARKDOWN_MARKERS: &[&str] = &["**", "__"];

/// Longest name kept without further truncation (in characters)
pub const MAX_NAME_LEN: usize = 50;

/// Length of the hard cut applied when no separator shortens a long name
pub const HARD_TRUNCATE_LEN: usize = 30;

/// Role-type tokens that coarsen the grouping key
pub const ROLE_TYPE_TOKENS: &[&str] = &["hr", "finance", "engineering", "developer", "admin", "support"];

/// Confidence assumed when a suggestion carries none
pub const DEFAULT_CONFIDENCE: f64 = 70.0;

/// Name used when nothing survives cleaning
pub const UNNAMED_ROLE: &str = "Unnamed Role";

/// Application list used when the field is not an array
pub const UNKNOWN_APPLICATION: &str = "Unknown";

/// Application list used when every entry was dropped
pub const PLACEHOLDER_APPLICATION: &str = "Application";

fn strip_markers(s: &str) -> String {
    MARKDOWN_MARKERS
        .iter()
        .fold(s.to_string(), |acc, marker| acc.replace(marker, ""))
}

/// Byte offset of the earliest metadata label, if any
///
/// ASCII lowercasing keeps byte offsets aligned with the original string.
fn first_label_position(s: &str) -> Option<usize> {
    let haystack = s.to_ascii_lowercase();
    METADATA_LABELS
        .iter()
        .filter_map(|label| haystack.find(&label.to_ascii_lowercase()))
        .min()
}

fn contains_label(s: &str) -> bool {
    first_label_position(s).is_some()
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Case-map one char, keeping it as is when the mapping is not one-to-one
///
/// `ß` uppercases to `SS`; expanding it would change the name on a second pass.
fn map_case<I: ExactSizeIterator<Item = char>>(c: char, mapped: impl Fn(char) -> I) -> char {
    let mut chars = mapped(c);
    match (chars.len(), chars.next()) {
        (1, Some(single)) => single,
        _ => c,
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => std::iter::once(map_case(first, char::to_uppercase))
                    .chain(chars.map(|c| map_case(c, char::to_lowercase)))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Clean one suggested role name
///
/// Applying it to its own output returns the same string.
pub fn clean_name(raw: &str) -> String {
    let stripped = strip_markers(raw);
    let mut name = match first_label_position(&stripped) {
        Some(pos) => stripped[..pos].trim(),
        None => stripped.trim(),
    };

    if name.chars().count() > MAX_NAME_LEN {
        let cut = NAME_SEPARATORS
            .iter()
            .filter_map(|sep| name.find(sep))
            .find(|pos| *pos > 0);
        if let Some(pos) = cut {
            name = name[..pos].trim();
        }
    }

    if name.chars().count() > MAX_NAME_LEN {
        name = truncate_chars(name, HARD_TRUNCATE_LEN).trim();
    }

    let cleaned = title_case(name);
    if cleaned.is_empty() {
        UNNAMED_ROLE.to_string()
    } else {
        cleaned
    }
}

/// Clean one suggested application list
pub fn clean_applications(raw: &Value) -> Vec<String> {
    let Some(entries) = raw.as_array() else {
        return vec![UNKNOWN_APPLICATION.to_string()];
    };

    let mut seen = std::collections::HashSet::new();
    let mut applications = Vec::new();

    for entry in entries {
        let text = match entry {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => continue,
        };
        let app = strip_markers(&text).trim().to_string();
        if app.is_empty() || contains_label(&app) {
            continue;
        }
        if seen.insert(app.to_lowercase()) {
            applications.push(app);
        }
    }

    if applications.is_empty() {
        applications.push(PLACEHOLDER_APPLICATION.to_string());
    }
    applications
}

/// Non-negative integer from a number or numeric string
pub fn coerce_count(value: &Value) -> Option<u64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !n.is_finite() {
        return None;
    }
    Some(n.floor().max(0.0) as u64)
}

/// Confidence in [0, 100]; accepts `92`, `"92"` and `"92%"`
pub fn coerce_confidence(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(c) if c.is_finite() => c.clamp(0.0, 100.0),
        _ => DEFAULT_CONFIDENCE,
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value.as_array().map(|items| {
        items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect()
    })
}

fn coerce_id(value: &Value, index: usize) -> RecordId {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => RecordId::Number(i),
            None => RecordId::Text(n.to_string()),
        },
        Value::String(s) if !s.trim().is_empty() => RecordId::Text(s.trim().to_string()),
        _ => RecordId::Number(index as i64 + 1),
    }
}

/// Clean a single raw suggestion; `index` is its position in the response
pub fn clean_role(raw: &Value, index: usize) -> Role {
    let field = |key: &str| raw.get(key).unwrap_or(&Value::Null);

    let users = string_list(field("users"));
    let permissions = string_list(field("permissions"));

    let user_count = coerce_count(field("userCount"))
        .or_else(|| users.as_ref().map(|u| u.len() as u64))
        .unwrap_or(0);
    let permission_count = coerce_count(field("permissionCount"))
        .or_else(|| permissions.as_ref().map(|p| p.len() as u64))
        .unwrap_or(0);

    Role {
        id: coerce_id(field("id"), index),
        name: clean_name(field("name").as_str().unwrap_or_default()),
        user_count,
        applications: clean_applications(field("applications")),
        permission_count,
        permissions,
        users,
        confidence: Some(coerce_confidence(field("confidence"))),
    }
}

/// Grouping key: the first role-type token found, else the squashed lowercase name
pub fn group_key(name: &str) -> String {
    let normalized: String = name
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    ROLE_TYPE_TOKENS
        .iter()
        .find(|token| normalized.contains(*token))
        .map(|token| token.to_string())
        .unwrap_or(normalized)
}

/// Keep the most confident role per group, in order of each group's first appearance
///
/// Ties keep the earlier role.
pub fn dedupe_roles(roles: Vec<Role>) -> Vec<Role> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<Role> = Vec::new();

    for role in roles {
        let key = group_key(&role.name);
        match slots.get(&key) {
            Some(&idx) => {
                let current = kept[idx].confidence.unwrap_or(DEFAULT_CONFIDENCE);
                if role.confidence.unwrap_or(DEFAULT_CONFIDENCE) > current {
                    kept[idx] = role;
                }
            }
            None => {
                slots.insert(key, kept.len());
                kept.push(role);
            }
        }
    }

    kept
}

/// Full pipeline: clean every suggestion, then de-duplicate
pub fn clean_ai_roles(raw: &[Value]) -> Vec<Role> {
    let cleaned: Vec<Role> = raw
        .iter()
        .enumerate()
        .map(|(index, value)| clean_role(value, index))
        .collect();
    let before = cleaned.len();
    let roles = dedupe_roles(cleaned);

    if roles.len() < before {
        tracing::debug!(
            before = before,
            after = roles.len(),
            "Collapsed duplicate AI suggestions"
        );
    }
    roles
}
