//! Data models shared between the wizard library, its HTTP API and the backend client
//!
//! - `summary`: uploaded entity kinds and the per-entity data summary
//! - `mining_config`: role mining filter/threshold configuration
//! - `role`: roles returned by the backend or the fallback generator
//! - `wizard`: wizard steps and state transitions

pub mod mining_config;
pub mod role;
pub mod summary;
pub mod wizard;

pub use mining_config::MiningConfig;
pub use role::{NamedOption, RecordId, ResultSource, Role};
pub use summary::{DataSummary, DataSummaryCounts, EntityKind, EntitySummary, Row};
pub use wizard::{StateTransition, WizardStep};
