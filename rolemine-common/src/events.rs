//! Wizard event types and broadcast bus
//!
//! Every step transition, mining run and backend fallback is emitted here so the
//! HTTP layer can stream it to clients as Server-Sent Events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{ResultSource, WizardStep};

/// Events emitted by a wizard instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WizardEvent {
    /// Wizard moved between steps
    StepChanged {
        session_id: Uuid,
        old_step: WizardStep,
        new_step: WizardStep,
        timestamp: DateTime<Utc>,
    },

    /// Mining call issued to the backend
    MiningStarted {
        session_id: Uuid,
        epoch: u64,
        timestamp: DateTime<Utc>,
    },

    /// Mining results stored
    MiningCompleted {
        session_id: Uuid,
        filter_roles: usize,
        ai_roles: usize,
        source: ResultSource,
        timestamp: DateTime<Utc>,
    },

    /// Backend call failed and placeholder data was substituted
    BackendFallback {
        session_id: Uuid,
        operation: String,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// A response arrived after the wizard was reset or navigated away
    StaleResponseDiscarded {
        session_id: Uuid,
        epoch: u64,
        timestamp: DateTime<Utc>,
    },
}

impl WizardEvent {
    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            WizardEvent::StepChanged { .. } => "StepChanged",
            WizardEvent::MiningStarted { .. } => "MiningStarted",
            WizardEvent::MiningCompleted { .. } => "MiningCompleted",
            WizardEvent::BackendFallback { .. } => "BackendFallback",
            WizardEvent::StaleResponseDiscarded { .. } => "StaleResponseDiscarded",
        }
    }
}

/// Broadcast bus for wizard events
///
/// Cloning shares the underlying channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<WizardEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<WizardEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: WizardEvent) {
        let _ = self.tx.send(event);
    }
}
