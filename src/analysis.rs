//! Problem page: problem statement, source draft, and the analyze action.

use serde::Serialize;
use tracing::{info, warn};

use crate::dataset::{Problem, ProblemSet};
use crate::dispatch::Dispatcher;
use crate::error::CoachError;
use crate::languages::{default_language, find_language, LanguageOption};
use crate::lifecycle::{PendingRequest, RequestPhase, RequestState};
use crate::providers::{Role, WireMessage};

/// Output when a successful response carries no content.
pub const ANALYSIS_FALLBACK: &str = "No output received.";
/// Output after a failed analysis.
pub const ANALYSIS_FAILURE: &str = "Failed to analyze the code.";

/// Instruction sent with every analysis.
pub fn analysis_prompt(problem: &Problem, source: &str) -> String {
    format!(
        "With less words and more data format directly. Check if the solution matched the following question if yes then Analyze the following code for the question:\n\n{}\n{}\n\nProvide a short and precise analysis in a tabular or key-value format including time complexity and test case evaluations:\n\n{}",
        problem.title, problem.problem_description, source
    )
}

/// The editor's contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceDraft {
    pub text: String,
    pub language: &'static LanguageOption,
}

impl Default for SourceDraft {
    fn default() -> Self {
        let language = default_language();
        Self { text: language.snippet.to_string(), language }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AnalyzeRejected {
    #[error("problem has not been loaded")]
    NotReady,
    #[error("an analysis is already running")]
    InFlight,
}

#[derive(Debug, Clone)]
pub struct AnalysisView {
    problem_id: String,
    problem: Option<Problem>,
    draft: SourceDraft,
    model: String,
    request: RequestState,
}

impl AnalysisView {
    /// A view for `problem_id` that has not loaded its problem yet.
    pub fn new(problem_id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            problem_id: problem_id.into(),
            problem: None,
            draft: SourceDraft::default(),
            model: model.into(),
            request: RequestState::new(),
        }
    }

    /// Create the view and look its problem up in `problems`.
    pub fn mount(problem_id: impl Into<String>, model: impl Into<String>, problems: &ProblemSet) -> Self {
        let mut view = Self::new(problem_id, model);
        view.load_problem(problems);
        view
    }

    /// Returns whether the problem was found. An unknown id leaves the view
    /// in its loading state.
    pub fn load_problem(&mut self, problems: &ProblemSet) -> bool {
        self.problem = problems.find(&self.problem_id).cloned();
        if self.problem.is_none() {
            warn!(problem_id = %self.problem_id, "problem not found in dataset");
        }
        self.problem.is_some()
    }

    pub fn problem_id(&self) -> &str {
        &self.problem_id
    }

    pub fn problem(&self) -> Option<&Problem> {
        self.problem.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.problem.is_some()
    }

    pub fn draft(&self) -> &SourceDraft {
        &self.draft
    }

    pub fn set_source(&mut self, text: impl Into<String>) {
        self.draft.text = text.into();
    }

    /// Switch the selected language. The draft text is left as is.
    pub fn select_language(&mut self, id: &str) -> Option<&'static LanguageOption> {
        let language = find_language(id)?;
        self.draft.language = language;
        Some(language)
    }

    /// Replace the draft with the selected language's starter snippet.
    pub fn reset_to_snippet(&mut self) {
        self.draft.text = self.draft.language.snippet.to_string();
    }

    pub fn output(&self) -> &str {
        self.request.result()
    }

    pub fn loading(&self) -> bool {
        self.request.loading()
    }

    pub fn error(&self) -> bool {
        self.request.error()
    }

    pub fn phase(&self) -> RequestPhase {
        self.request.phase()
    }

    /// Whether the analyze button is shown and enabled.
    pub fn can_analyze(&self) -> bool {
        self.is_ready() && self.request.trigger_enabled()
    }

    pub fn assemble(&self) -> Option<Vec<WireMessage>> {
        let problem = self.problem.as_ref()?;
        Some(vec![WireMessage::new(Role::User, analysis_prompt(problem, &self.draft.text))])
    }

    pub fn begin_analysis(&mut self) -> Result<PendingRequest, AnalyzeRejected> {
        let messages = self.assemble().ok_or(AnalyzeRejected::NotReady)?;
        self.request.begin().map_err(|_| AnalyzeRejected::InFlight)?;
        Ok(PendingRequest { model: self.model.clone(), messages })
    }

    pub fn complete_analysis(&mut self, outcome: Result<Option<String>, CoachError>) {
        match outcome {
            Ok(reply) => {
                if self.request.succeed(reply.unwrap_or_else(|| ANALYSIS_FALLBACK.to_string())) {
                    info!(problem_id = %self.problem_id, "analysis completed");
                }
            }
            Err(e) => {
                if self.request.fail(ANALYSIS_FAILURE) {
                    warn!(problem_id = %self.problem_id, error = %e, "analysis failed");
                }
            }
        }
    }

    /// Run one analysis of the current draft and wait for it to settle.
    pub async fn analyze(&mut self, dispatcher: &Dispatcher) -> Result<(), AnalyzeRejected> {
        let pending = self.begin_analysis()?;
        let outcome = dispatcher.send(&pending).await;
        self.complete_analysis(outcome);
        Ok(())
    }
}
