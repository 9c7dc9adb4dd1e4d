//! Results presentation
//!
//! Filter-based roles are shown as returned; AI-suggested roles have already gone
//! through `cleaning`. This module only shapes them into tabs, cards and detail views.

use chrono::{DateTime, Utc};
use rolemine_common::models::{MiningConfig, RecordId, ResultSource, Role};
use rolemine_common::{Error, Result, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of sample users/permissions listed in a detail view
pub const SAMPLE_LIMIT: usize = 5;

/// Message shown when a tab has no roles
pub const NO_ROLES_MESSAGE: &str =
    "No roles were discovered with the current filters. Please try again with different filters.";

/// Outcome of one mining run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MiningResults {
    pub filter_roles: Vec<Role>,
    pub ai_roles: Vec<Role>,
    pub filter_source: ResultSource,
    /// `None` when AI suggestions were disabled for the run
    pub ai_source: Option<ResultSource>,
    pub config: MiningConfig,
    pub completed_at: DateTime<Utc>,
}

impl MiningResults {
    pub fn roles(&self, tab: ResultsTab) -> &[Role] {
        match tab {
            ResultsTab::Filter => &self.filter_roles,
            ResultsTab::Ai => &self.ai_roles,
        }
    }

    /// True if any part of the run used placeholder data
    pub fn used_fallback(&self) -> bool {
        self.filter_source == ResultSource::Fallback
            || self.ai_source == Some(ResultSource::Fallback)
    }
}

/// Results tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultsTab {
    #[default]
    #[serde(alias = "filter-based")]
    Filter,
    #[serde(alias = "ai-suggested")]
    Ai,
}

impl ResultsTab {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultsTab::Filter => "filter",
            ResultsTab::Ai => "ai",
        }
    }
}

impl fmt::Display for ResultsTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultsTab {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "filter" | "filter-based" => Ok(ResultsTab::Filter),
            "ai" | "ai-suggested" => Ok(ResultsTab::Ai),
            other => Err(ValidationError::new(
                "tab",
                format!("Unknown results tab '{}'", other),
            )),
        }
    }
}

/// Confidence badge color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBadge {
    Green,
    Amber,
    Red,
}

impl ConfidenceBadge {
    /// ≥80 green, ≥60 amber, else red
    pub fn for_confidence(confidence: f64) -> Self {
        if confidence >= 80.0 {
            ConfidenceBadge::Green
        } else if confidence >= 60.0 {
            ConfidenceBadge::Amber
        } else {
            ConfidenceBadge::Red
        }
    }
}

/// One role card
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleCard {
    pub id: RecordId,
    pub name: String,
    pub user_count: u64,
    pub permission_count: u64,
    pub applications: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<ConfidenceBadge>,
}

impl RoleCard {
    pub fn from_role(role: &Role, tab: ResultsTab) -> Self {
        let confidence = match tab {
            ResultsTab::Ai => role.confidence,
            ResultsTab::Filter => None,
        };
        Self {
            id: role.id.clone(),
            name: role.name.clone(),
            user_count: role.user_count,
            permission_count: role.permission_count,
            applications: role.applications.clone(),
            confidence,
            badge: confidence.map(ConfidenceBadge::for_confidence),
        }
    }
}

/// Truncated sample list with an "and N more" suffix
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleList {
    pub items: Vec<String>,
    pub total: u64,
    pub remaining: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub more: Option<String>,
}

impl SampleList {
    /// Take up to `SAMPLE_LIMIT` entries; `generate` fills in when the role has no list
    fn build(
        listed: Option<&[String]>,
        declared: u64,
        noun: &str,
        generate: impl Fn(usize) -> String,
    ) -> Self {
        let total = declared.max(listed.map_or(0, |l| l.len() as u64));
        let items: Vec<String> = match listed {
            Some(list) => list.iter().take(SAMPLE_LIMIT).cloned().collect(),
            None => (0..(total.min(SAMPLE_LIMIT as u64) as usize)).map(generate).collect(),
        };
        let remaining = total.saturating_sub(items.len() as u64);
        let more = (remaining > 0).then(|| format!("... and {} more {}", remaining, noun));

        Self {
            items,
            total,
            remaining,
            more,
        }
    }
}

/// Detail dialog for one role
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleDetail {
    pub role: RoleCard,
    pub users: SampleList,
    pub permissions: SampleList,
}

impl RoleDetail {
    pub fn from_role(role: &Role, tab: ResultsTab) -> Self {
        let users = SampleList::build(role.users.as_deref(), role.user_count, "users", |i| {
            format!("User {}", i + 1)
        });
        let permissions = SampleList::build(
            role.permissions.as_deref(),
            role.permission_count,
            "permissions",
            |i| match role.applications.get(i % role.applications.len().max(1)) {
                Some(app) => format!("Permission {} ({} - Access Level {})", i + 1, app, i + 1),
                None => format!("Permission {}", i + 1),
            },
        );

        Self {
            role: RoleCard::from_role(role, tab),
            users,
            permissions,
        }
    }
}

/// One rendered results tab
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsPage {
    pub tab: ResultsTab,
    pub source: Option<ResultSource>,
    pub cards: Vec<RoleCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl ResultsPage {
    pub fn render(results: &MiningResults, tab: ResultsTab) -> Self {
        let cards: Vec<RoleCard> = results
            .roles(tab)
            .iter()
            .map(|role| RoleCard::from_role(role, tab))
            .collect();
        let source = match tab {
            ResultsTab::Filter => Some(results.filter_source),
            ResultsTab::Ai => results.ai_source,
        };
        let message = cards.is_empty().then_some(NO_ROLES_MESSAGE);

        Self {
            tab,
            source,
            cards,
            message,
        }
    }
}

/// Look up a role by id within a tab
pub fn find_role<'a>(results: &'a MiningResults, tab: ResultsTab, id: &RecordId) -> Result<&'a Role> {
    results
        .roles(tab)
        .iter()
        .find(|role| &role.id == id || role.id.to_string() == id.to_string())
        .ok_or_else(|| Error::NotFound(format!("Role {} in {} results", id, tab)))
}
