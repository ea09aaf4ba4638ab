//! Floating chat widget: an append-only transcript that is replayed to the
//! model on every send.
//!
//! ## Send lifecycle
//! 1. [`ChatView::begin_send`] rejects blank input, otherwise assembles the
//!    payload from the transcript as it stood before this turn, appends the
//!    user entry, clears the input and enters the in-flight state.
//! 2. The caller dispatches the returned [`PendingRequest`].
//! 3. [`ChatView::complete_send`] appends one assistant entry on success or
//!    raises the error indicator on failure. Loading always clears.
//!
//! [`ChatView::send`] runs all three steps.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{AppConfig, ProfileConfig};
use crate::dispatch::Dispatcher;
use crate::error::CoachError;
use crate::lifecycle::{PendingRequest, RequestPhase, RequestState};
use crate::providers::{Role, WireMessage};

/// Shown as the assistant reply when a successful response carries no content.
pub const CHAT_FALLBACK: &str = "Sorry, I couldn't understand that.";
/// Error indicator text after a failed send.
pub const CHAT_FAILURE: &str = "An error occurred while fetching the response.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn role(self) -> Role {
        match self {
            Sender::User => Role::User,
            Sender::Assistant => Role::Assistant,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "Bot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self { sender, text: text.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendRejected {
    #[error("message is empty")]
    EmptyInput,
    #[error("a reply is still pending")]
    InFlight,
}

/// System instruction sent ahead of the first turn of a conversation.
pub fn system_instruction(profile: &ProfileConfig) -> String {
    format!(
        "You are a career guidance assistant for a platform specializing in career development. Provide concise answers and, after sufficient user input, recommend career paths:\n      - Interested Domains: {}.\n\n      Use this data to provide personalized recommendations when the user asks for guidance.",
        profile.interested_domains.join(", ")
    )
}

#[derive(Debug, Clone)]
pub struct ChatView {
    model: String,
    system_prompt: String,
    transcript: Vec<ChatMessage>,
    input: String,
    request: RequestState,
    error: Option<String>,
    open: bool,
}

impl ChatView {
    pub fn new(model: impl Into<String>, profile: &ProfileConfig) -> Self {
        Self {
            model: model.into(),
            system_prompt: system_instruction(profile),
            transcript: Vec::new(),
            input: String::new(),
            request: RequestState::new(),
            error: None,
            open: false,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.inference.chat_model.clone(), &config.profile)
    }

    // -- widget ---------------------------------------------------------------

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    // -- state accessors ------------------------------------------------------

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn loading(&self) -> bool {
        self.request.loading()
    }

    pub fn phase(&self) -> RequestPhase {
        self.request.phase()
    }

    /// Whether the send button is enabled.
    pub fn can_send(&self) -> bool {
        self.request.trigger_enabled() && !self.input.trim().is_empty()
    }

    // -- lifecycle --------------------------------------------------------------

    /// Messages for a new user turn given the current transcript.
    pub fn assemble(&self, text: &str) -> Vec<WireMessage> {
        let mut messages = Vec::with_capacity(self.transcript.len() + 2);
        if self.transcript.is_empty() {
            messages.push(WireMessage::new(Role::System, self.system_prompt.clone()));
        }
        messages.extend(
            self.transcript
                .iter()
                .map(|m| WireMessage::new(m.sender.role(), m.text.clone())),
        );
        messages.push(WireMessage::new(Role::User, text));
        messages
    }

    pub fn begin_send(&mut self) -> Result<PendingRequest, SendRejected> {
        if self.input.trim().is_empty() {
            return Err(SendRejected::EmptyInput);
        }
        self.request.begin().map_err(|_| SendRejected::InFlight)?;
        let text = std::mem::take(&mut self.input);
        let messages = self.assemble(&text);
        self.transcript.push(ChatMessage::new(Sender::User, text));
        self.error = None;
        Ok(PendingRequest { model: self.model.clone(), messages })
    }

    pub fn complete_send(&mut self, outcome: Result<Option<String>, CoachError>) {
        if !self.request.loading() {
            return;
        }
        match outcome {
            Ok(reply) => {
                let text = reply.unwrap_or_else(|| CHAT_FALLBACK.to_string());
                self.transcript.push(ChatMessage::new(Sender::Assistant, text.clone()));
                self.request.succeed(text);
                info!(turns = self.transcript.len(), "chat reply received");
            }
            Err(e) => {
                warn!(error = %e, "chat request failed");
                self.error = Some(CHAT_FAILURE.to_string());
                self.request.fail(CHAT_FAILURE);
            }
        }
    }

    /// Send the current input and wait for the reply.
    pub async fn send(&mut self, dispatcher: &Dispatcher) -> Result<(), SendRejected> {
        let pending = self.begin_send()?;
        let outcome = dispatcher.send(&pending).await;
        self.complete_send(outcome);
        Ok(())
    }

    /// Replace the input with `text` and send it.
    pub async fn submit(
        &mut self,
        text: impl Into<String>,
        dispatcher: &Dispatcher,
    ) -> Result<(), SendRejected> {
        self.set_input(text);
        self.send(dispatcher).await
    }
}
