//! Wizard step state machine vocabulary
//!
//! Upload → Summary → Configure → Results, with back-navigation and a full reset
//! from Results back to Upload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Wizard step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardStep {
    /// Waiting for the five CSV files
    Upload,
    /// Data summary rendered, waiting for proceed/reupload
    Summary,
    /// Mining configuration form
    Configure,
    /// Results dashboard
    Results,
}

impl WizardStep {
    /// Zero-based position in the stepper
    pub fn index(self) -> usize {
        match self {
            WizardStep::Upload => 0,
            WizardStep::Summary => 1,
            WizardStep::Configure => 2,
            WizardStep::Results => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WizardStep::Upload => "upload",
            WizardStep::Summary => "summary",
            WizardStep::Configure => "configure",
            WizardStep::Results => "results",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step transition record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub session_id: Uuid,
    pub old_step: WizardStep,
    pub new_step: WizardStep,
    pub transitioned_at: DateTime<Utc>,
}
