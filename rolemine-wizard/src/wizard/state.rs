//! Wizard state machine
//!
//! Pure, synchronous state: the step, the accumulated entities and a reset epoch.
//! Transition methods are the only mutation surface; each returns the
//! `StateTransition` it performed or an `InvalidTransition` error.

use chrono::Utc;
use rolemine_common::models::{DataSummary, MiningConfig, StateTransition, WizardStep};
use rolemine_common::{Error, Result};
use serde::Serialize;
use uuid::Uuid;

use crate::results::MiningResults;

/// Read-only view of the wizard for callers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardStatus {
    pub session_id: Uuid,
    pub step: WizardStep,
    pub step_index: usize,
    pub loading: bool,
    pub epoch: u64,
    pub has_summary: bool,
    pub has_results: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<MiningConfig>,
}

/// One wizard instance
#[derive(Debug, Clone)]
pub struct Wizard {
    session_id: Uuid,
    step: WizardStep,
    /// Bumped on every transition; stale async responses carry an older value
    epoch: u64,
    loading: bool,
    summary: Option<DataSummary>,
    config: Option<MiningConfig>,
    results: Option<MiningResults>,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            step: WizardStep::Upload,
            epoch: 0,
            loading: false,
            summary: None,
            config: None,
            results: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn summary(&self) -> Option<&DataSummary> {
        self.summary.as_ref()
    }

    /// Last submitted configuration, kept for prefilling the form
    pub fn config(&self) -> Option<&MiningConfig> {
        self.config.as_ref()
    }

    pub fn results(&self) -> Option<&MiningResults> {
        self.results.as_ref()
    }

    pub fn status(&self) -> WizardStatus {
        WizardStatus {
            session_id: self.session_id,
            step: self.step,
            step_index: self.step.index(),
            loading: self.loading,
            epoch: self.epoch,
            has_summary: self.summary.is_some(),
            has_results: self.results.is_some(),
            config: self.config.clone(),
        }
    }

    fn transition_to(&mut self, new_step: WizardStep) -> StateTransition {
        let transition = StateTransition {
            session_id: self.session_id,
            old_step: self.step,
            new_step,
            transitioned_at: Utc::now(),
        };
        self.step = new_step;
        self.epoch += 1;
        self.loading = false;
        transition
    }

    fn require(&self, expected: WizardStep, action: &str) -> Result<()> {
        if self.step == expected {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &str) -> Error {
        Error::InvalidTransition {
            from: self.step.to_string(),
            action: action.to_string(),
        }
    }

    /// Upload → Summary
    pub fn complete_upload(&mut self, summary: DataSummary) -> Result<StateTransition> {
        self.require(WizardStep::Upload, "complete upload")?;
        summary.validate()?;
        self.summary = Some(summary);
        Ok(self.transition_to(WizardStep::Summary))
    }

    /// Summary → Upload, discarding the summary
    pub fn reupload(&mut self) -> Result<StateTransition> {
        self.require(WizardStep::Summary, "reupload")?;
        self.summary = None;
        Ok(self.transition_to(WizardStep::Upload))
    }

    /// Summary → Configure
    pub fn proceed(&mut self) -> Result<StateTransition> {
        self.require(WizardStep::Summary, "proceed")?;
        if self.summary.is_none() {
            return Err(Error::validation(
                "summary",
                crate::summary_view::EMPTY_SUMMARY_MESSAGE,
            ));
        }
        Ok(self.transition_to(WizardStep::Configure))
    }

    /// One step back
    pub fn back(&mut self) -> Result<StateTransition> {
        match self.step {
            WizardStep::Upload => Err(self.invalid("go back")),
            WizardStep::Summary => self.reupload(),
            WizardStep::Configure => {
                let target = if self.summary.is_some() {
                    WizardStep::Summary
                } else {
                    WizardStep::Upload
                };
                Ok(self.transition_to(target))
            }
            WizardStep::Results => {
                self.results = None;
                Ok(self.transition_to(WizardStep::Configure))
            }
        }
    }

    /// Enter the loading sub-state of Configure; returns the epoch the response must match
    pub fn begin_mining(&mut self, config: MiningConfig) -> Result<u64> {
        self.require(WizardStep::Configure, "run mining")?;
        if self.loading {
            return Err(Error::Busy("Role mining is already running".into()));
        }
        config.validate()?;
        self.config = Some(config);
        self.loading = true;
        Ok(self.epoch)
    }

    /// Configure → Results, unless the wizard moved on since `begin_mining`
    ///
    /// Returns `None` for a stale response; nothing is applied in that case.
    pub fn finish_mining(&mut self, epoch: u64, results: MiningResults) -> Option<StateTransition> {
        if epoch != self.epoch || self.step != WizardStep::Configure {
            return None;
        }
        self.results = Some(results);
        Some(self.transition_to(WizardStep::Results))
    }

    /// Leave the loading sub-state after a failed run
    pub fn abort_mining(&mut self, epoch: u64) {
        if epoch == self.epoch {
            self.loading = false;
        }
    }

    /// Any step → Upload, dropping every accumulated entity
    pub fn start_new(&mut self) -> StateTransition {
        self.summary = None;
        self.config = None;
        self.results = None;
        self.transition_to(WizardStep::Upload)
    }
}
