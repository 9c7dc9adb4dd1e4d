//! Wizard controller
//!
//! Owns the single `Wizard` instance of the service, performs the backend calls that
//! drive it forward, applies the configured failure policy and publishes every step
//! change on the event bus.

use chrono::Utc;
use rolemine_common::config::{FailurePolicy, IngestionMode, TomlConfig};
use rolemine_common::models::{
    EntityKind, MiningConfig, NamedOption, RecordId, ResultSource, Role, StateTransition,
    WizardStep,
};
use rolemine_common::{Error, EventBus, NetworkError, Result, WizardEvent};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{info, warn};

use crate::client::BackendClient;
use crate::cleaning::clean_ai_roles;
use crate::config_form::MiningConfigForm;
use crate::fallback;
use crate::ingest::{self, UploadFile};
use crate::report::{build_report, ReportFile};
use crate::results::{find_role, MiningResults, ResultsPage, ResultsTab, RoleDetail};
use crate::summary_view::{page_rows, RowPage, SummaryView};

use super::state::{Wizard, WizardStatus};

/// Message reported after a successful identity-manager publish
pub const PUBLISH_SUCCESS_MESSAGE: &str = "Roles have been successfully added to Identity Manager";

/// Controller settings resolved from configuration
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub on_failure: FailurePolicy,
    pub ingestion: IngestionMode,
    pub max_file_size: u64,
}

impl ControllerSettings {
    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            on_failure: config.backend.on_failure,
            ingestion: config.backend.ingestion,
            max_file_size: config.upload.max_file_size_bytes,
        }
    }
}

/// Selectable filter values for the configuration step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOptions {
    pub applications: Vec<NamedOption>,
    pub organizational_units: Vec<NamedOption>,
    pub source: ResultSource,
}

/// Result of an identity-manager publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    pub tab: ResultsTab,
    pub published: usize,
    pub message: String,
}

/// Clears the loading flag of one mining run unless disarmed
///
/// Covers both an error from `mine` and the caller dropping the future mid-run.
struct LoadingGuard {
    wizard: Arc<RwLock<Wizard>>,
    epoch: u64,
    armed: bool,
}

impl LoadingGuard {
    fn new(wizard: Arc<RwLock<Wizard>>, epoch: u64) -> Self {
        Self {
            wizard,
            epoch,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let epoch = self.epoch;
        match self.wizard.try_write() {
            Ok(mut wizard) => wizard.abort_mining(epoch),
            Err(_) => {
                // lock busy; finish the reset once it is free
                if let Ok(handle) = tokio::runtime::Handle::try_current() {
                    let wizard = Arc::clone(&self.wizard);
                    handle.spawn(async move {
                        wizard.write().await.abort_mining(epoch);
                    });
                }
            }
        }
    }
}

/// Single-instance wizard controller
pub struct WizardController {
    wizard: Arc<RwLock<Wizard>>,
    client: BackendClient,
    settings: ControllerSettings,
    events: EventBus,
    /// Held for the duration of any backend-bound operation
    in_flight: Mutex<()>,
}

impl WizardController {
    pub fn new(client: BackendClient, settings: ControllerSettings, events: EventBus) -> Self {
        Self {
            wizard: Arc::new(RwLock::new(Wizard::new())),
            client,
            settings,
            events,
            in_flight: Mutex::new(()),
        }
    }

    pub fn from_config(config: &TomlConfig, events: EventBus) -> Result<Self> {
        let client = BackendClient::from_config(&config.backend)?;
        Ok(Self::new(client, ControllerSettings::from_config(config), events))
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn backend_url(&self) -> &str {
        self.client.base_url()
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub async fn status(&self) -> WizardStatus {
        self.wizard.read().await.status()
    }

    fn begin_operation(&self, operation: &str) -> Result<MutexGuard<'_, ()>> {
        self.in_flight
            .try_lock()
            .map_err(|_| Error::Busy(format!("Cannot {} while another operation is in progress", operation)))
    }

    fn publish_transition(&self, transition: &StateTransition) {
        info!(
            session_id = %transition.session_id,
            from = %transition.old_step,
            to = %transition.new_step,
            "Wizard step changed"
        );
        self.events.emit_lossy(WizardEvent::StepChanged {
            session_id: transition.session_id,
            old_step: transition.old_step,
            new_step: transition.new_step,
            timestamp: transition.transitioned_at,
        });
    }

    /// Decide between placeholder data and a hard error for a failed backend call
    async fn on_backend_failure(&self, operation: &str, err: NetworkError) -> Result<()> {
        match self.settings.on_failure {
            FailurePolicy::Fallback => {
                let session_id = self.wizard.read().await.session_id();
                warn!(
                    session_id = %session_id,
                    operation = %operation,
                    error = %err,
                    "Backend call failed, using placeholder data"
                );
                self.events.emit_lossy(WizardEvent::BackendFallback {
                    session_id,
                    operation: operation.to_string(),
                    error: err.to_string(),
                    timestamp: Utc::now(),
                });
                Ok(())
            }
            FailurePolicy::Fail => {
                warn!(operation = %operation, error = %err, "Backend call failed");
                Err(Error::Network(err))
            }
        }
    }

    async fn apply<F>(&self, f: F) -> Result<WizardStatus>
    where
        F: FnOnce(&mut Wizard) -> Result<StateTransition>,
    {
        let mut wizard = self.wizard.write().await;
        let transition = f(&mut *wizard)?;
        self.publish_transition(&transition);
        Ok(wizard.status())
    }

    /// Validate and ingest an upload batch; Upload → Summary
    pub async fn upload(&self, files: Vec<UploadFile>) -> Result<WizardStatus> {
        let _guard = self.begin_operation("upload files")?;

        {
            let wizard = self.wizard.read().await;
            if wizard.step() != WizardStep::Upload {
                return Err(Error::InvalidTransition {
                    from: wizard.step().to_string(),
                    action: "upload files".into(),
                });
            }
        }

        let set = ingest::validate_batch(files, self.settings.max_file_size)?;
        let summary = match self.settings.ingestion {
            IngestionMode::Local => ingest::summarize(&set)?,
            IngestionMode::Remote => match self.client.upload(&set).await {
                Ok(summary) => summary,
                Err(e) => {
                    self.on_backend_failure("upload", e).await?;
                    ingest::summarize(&set)?
                }
            },
        };

        self.apply(|wizard| wizard.complete_upload(summary)).await
    }

    pub async fn reupload(&self) -> Result<WizardStatus> {
        self.apply(Wizard::reupload).await
    }

    pub async fn proceed(&self) -> Result<WizardStatus> {
        self.apply(Wizard::proceed).await
    }

    pub async fn back(&self) -> Result<WizardStatus> {
        self.apply(Wizard::back).await
    }

    pub async fn start_new(&self) -> Result<WizardStatus> {
        self.apply(|wizard| Ok(wizard.start_new())).await
    }

    pub async fn summary_view(&self) -> SummaryView {
        SummaryView::render(self.wizard.read().await.summary())
    }

    pub async fn summary_rows(&self, kind: EntityKind, page: usize) -> Result<RowPage> {
        let wizard = self.wizard.read().await;
        let summary = wizard
            .summary()
            .ok_or_else(|| Error::NotFound("No data summary available".into()))?;
        page_rows(summary, kind, page)
    }

    /// Load selectable applications and organizational units
    pub async fn options(&self) -> Result<ConfigOptions> {
        let (applications, units) =
            tokio::join!(self.client.applications(), self.client.organizational_units());

        match (applications, units) {
            (Ok(applications), Ok(organizational_units)) => Ok(ConfigOptions {
                applications,
                organizational_units,
                source: ResultSource::Backend,
            }),
            (Err(e), _) | (_, Err(e)) => {
                self.on_backend_failure("metadata", e).await?;
                Ok(ConfigOptions {
                    applications: fallback::applications(),
                    organizational_units: fallback::organizational_units(),
                    source: ResultSource::Fallback,
                })
            }
        }
    }

    /// Configuration form, prefilled with the last submitted config if any
    pub async fn config_form(&self) -> MiningConfigForm {
        match self.wizard.read().await.config() {
            Some(config) => MiningConfigForm::from_config(config),
            None => MiningConfigForm::new(),
        }
    }

    /// Submit the configuration and run mining; Configure → Results
    ///
    /// A response that arrives after the wizard moved away from Configure is
    /// discarded and the current status is returned unchanged.
    pub async fn submit_config(&self, config: MiningConfig) -> Result<WizardStatus> {
        let _guard = self.begin_operation("run role mining")?;

        let (session_id, epoch) = {
            let mut wizard = self.wizard.write().await;
            let epoch = wizard.begin_mining(config.clone())?;
            (wizard.session_id(), epoch)
        };
        info!(session_id = %session_id, epoch = epoch, "Role mining started");
        self.events.emit_lossy(WizardEvent::MiningStarted {
            session_id,
            epoch,
            timestamp: Utc::now(),
        });

        let loading = LoadingGuard::new(Arc::clone(&self.wizard), epoch);
        let results = self.mine(config).await?;

        let mut wizard = self.wizard.write().await;
        loading.disarm();
        let (filter_count, ai_count) = (results.filter_roles.len(), results.ai_roles.len());
        let source = if results.used_fallback() {
            ResultSource::Fallback
        } else {
            ResultSource::Backend
        };

        match wizard.finish_mining(epoch, results) {
            Some(transition) => {
                self.publish_transition(&transition);
                info!(
                    session_id = %session_id,
                    filter_roles = filter_count,
                    ai_roles = ai_count,
                    "Role mining completed"
                );
                self.events.emit_lossy(WizardEvent::MiningCompleted {
                    session_id,
                    filter_roles: filter_count,
                    ai_roles: ai_count,
                    source,
                    timestamp: Utc::now(),
                });
            }
            None => {
                warn!(
                    session_id = %session_id,
                    epoch = epoch,
                    current_epoch = wizard.epoch(),
                    "Discarding stale mining response"
                );
                self.events.emit_lossy(WizardEvent::StaleResponseDiscarded {
                    session_id,
                    epoch,
                    timestamp: Utc::now(),
                });
            }
        }

        Ok(wizard.status())
    }

    async fn mine(&self, config: MiningConfig) -> Result<MiningResults> {
        let (filter_roles, filter_source) = match self.client.run_mining(&config).await {
            Ok(roles) => (roles, ResultSource::Backend),
            Err(e) => {
                self.on_backend_failure("run", e).await?;
                (fallback::filter_roles(), ResultSource::Fallback)
            }
        };

        let (ai_roles, ai_source) = if config.enable_ai {
            match self.client.ai_suggestions().await {
                Ok(raw) => (clean_ai_roles(&raw), Some(ResultSource::Backend)),
                Err(e) => {
                    self.on_backend_failure("ai-suggest", e).await?;
                    (
                        clean_ai_roles(&fallback::ai_suggestions()),
                        Some(ResultSource::Fallback),
                    )
                }
            }
        } else {
            (Vec::new(), None)
        };

        Ok(MiningResults {
            filter_roles,
            ai_roles,
            filter_source,
            ai_source,
            config,
            completed_at: Utc::now(),
        })
    }

    async fn with_results<T>(&self, f: impl FnOnce(&MiningResults) -> Result<T>) -> Result<T> {
        let wizard = self.wizard.read().await;
        let results = wizard
            .results()
            .ok_or_else(|| Error::NotFound("No mining results available".into()))?;
        f(results)
    }

    pub async fn results_page(&self, tab: ResultsTab) -> Result<ResultsPage> {
        self.with_results(|results| Ok(ResultsPage::render(results, tab)))
            .await
    }

    pub async fn role_detail(&self, tab: ResultsTab, id: &RecordId) -> Result<RoleDetail> {
        self.with_results(|results| Ok(RoleDetail::from_role(find_role(results, tab, id)?, tab)))
            .await
    }

    /// CSV report of the roles visible in `tab`
    pub async fn report(&self, tab: ResultsTab) -> Result<ReportFile> {
        self.with_results(|results| build_report(results.roles(tab), Utc::now()))
            .await
    }

    /// Publish the roles visible in `tab`; one attempt, failure is reported as-is
    pub async fn publish(&self, tab: ResultsTab) -> Result<PublishOutcome> {
        let _guard = self.begin_operation("publish roles")?;
        let roles: Vec<Role> = self
            .with_results(|results| Ok(results.roles(tab).to_vec()))
            .await?;

        self.client.publish_roles(&roles).await?;
        Ok(PublishOutcome {
            tab,
            published: roles.len(),
            message: PUBLISH_SUCCESS_MESSAGE.to_string(),
        })
    }
}
