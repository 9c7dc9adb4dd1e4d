//! HTTP API handlers for the role mining wizard
//!
//! REST routes drive the wizard one transition at a time; `/wizard/events` streams
//! every transition as Server-Sent Events.

pub mod health;
pub mod sse;
pub mod wizard;

pub use health::health_routes;
pub use sse::wizard_event_stream;
pub use wizard::wizard_routes;
