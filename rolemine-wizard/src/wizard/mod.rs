//! Wizard state machine and its controller

pub mod controller;
pub mod state;

pub use controller::{ConfigOptions, ControllerSettings, PublishOutcome, WizardController};
pub use state::{Wizard, WizardStatus};
