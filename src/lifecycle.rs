//! Request lifecycle shared by the analysis and chat views.
//!
//! ```text
//!   Idle ──begin──▶ InFlight ──succeed──▶ Succeeded ──begin──▶ InFlight …
//!                       │
//!                       └────fail──────▶ Failed ──begin──▶ InFlight …
//! ```
//!
//! `begin` is the only user-driven transition and is refused while a request
//! is in flight, which is what keeps the trigger control disabled. `succeed`
//! and `fail` are the settlement transitions; each clears the loading flag.

use serde::Serialize;

use crate::providers::WireMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPhase {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

/// Returned when a trigger fires while a request is already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("a request is already in flight")]
pub struct AlreadyInFlight;

/// An assembled payload waiting to be dispatched.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
}

/// Status and result text of a view's most recent request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestState {
    phase: RequestPhase,
    result: String,
}

impl RequestState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RequestPhase {
        self.phase
    }

    pub fn loading(&self) -> bool {
        self.phase == RequestPhase::InFlight
    }

    pub fn error(&self) -> bool {
        self.phase == RequestPhase::Failed
    }

    pub fn result(&self) -> &str {
        &self.result
    }

    /// Whether the analyze/send control accepts a press.
    pub fn trigger_enabled(&self) -> bool {
        !self.loading()
    }

    /// Enter the in-flight state: loading on, error off, result cleared.
    pub fn begin(&mut self) -> Result<(), AlreadyInFlight> {
        if self.loading() {
            return Err(AlreadyInFlight);
        }
        self.phase = RequestPhase::InFlight;
        self.result.clear();
        Ok(())
    }

    /// Settle successfully. Ignored unless a request is in flight.
    pub fn succeed(&mut self, text: impl Into<String>) -> bool {
        self.settle(RequestPhase::Succeeded, text.into())
    }

    /// Settle with a failure. Ignored unless a request is in flight.
    pub fn fail(&mut self, text: impl Into<String>) -> bool {
        self.settle(RequestPhase::Failed, text.into())
    }

    fn settle(&mut self, phase: RequestPhase, text: String) -> bool {
        if !self.loading() {
            return false;
        }
        self.phase = phase;
        self.result = text;
        true
    }
}
