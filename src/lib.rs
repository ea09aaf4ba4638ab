//! code-coach: a coding-practice assistant.
//!
//! Two views talk to one OpenAI-compatible chat-completion endpoint:
//! - [`analysis::AnalysisView`] sends a problem statement and a source draft
//!   and shows the reply as a structured analysis.
//! - [`chat::ChatView`] keeps an append-only transcript and replays it on
//!   every send.
//!
//! Both share the request lifecycle in [`lifecycle`] and the one-shot
//! [`dispatch::Dispatcher`]. The views are driven from the terminal
//! ([`console`]) or from the embedded web UI ([`web`]).

pub mod analysis;
pub mod chat;
pub mod cli;
pub mod config;
pub mod console;
pub mod dataset;
pub mod dispatch;
pub mod error;
pub mod languages;
pub mod lifecycle;
pub mod providers;
pub mod render;
pub mod sessions;
pub mod web;

pub use analysis::AnalysisView;
pub use chat::ChatView;
pub use config::AppConfig;
pub use dispatch::Dispatcher;
pub use error::CoachError;
