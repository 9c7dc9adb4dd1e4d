//! # Role Mining Common Library
//!
//! Shared code for the role mining wizard crates including:
//! - Domain models (data summary, mining configuration, roles, wizard steps)
//! - Error types (validation vs. network failures)
//! - Configuration loading and resolution
//! - Wizard event bus

pub mod config;
pub mod error;
pub mod events;
pub mod models;

pub use error::{Error, NetworkError, Result, ValidationError};
pub use events::{EventBus, WizardEvent};
