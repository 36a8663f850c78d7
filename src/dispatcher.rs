//! Query dispatch: the single interaction handler behind every front end.
//!
//! A submission is checked for content, forwarded unmodified to the injected RAG
//! service, and turned into an `Outcome` the front end can display. Service
//! failures are caught here and never propagate.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::PageConfig;
use crate::ingest::{self, IngestReport};
use crate::rag::RagService;

/// Interaction state of a front end.
///
/// `Idle -> Pending` on submission of a non-blank question; `Pending -> Idle`
/// once the service call returns or fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchState {
    #[default]
    Idle,
    Pending,
}

/// Result of submitting one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The question was blank; nothing was sent
    Warning(String),
    /// The service's answer, verbatim
    Answered(String),
    /// The service failed; the message embeds the error text
    Failed(String),
}

impl Outcome {
    /// Returns the text to display for this outcome.
    pub fn message(&self) -> &str {
        match self {
            Self::Warning(m) | Self::Answered(m) | Self::Failed(m) => m,
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Answered(_))
    }
}

/// Result of the load-files action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Success(String),
    Failed(String),
}

impl LoadOutcome {
    pub fn message(&self) -> &str {
        match self {
            Self::Success(m) | Self::Failed(m) => m,
        }
    }
}

/// Returns true if the question has content after trimming whitespace.
pub fn is_submittable(question: &str) -> bool {
    !question.trim().is_empty()
}

/// Forwards questions to the RAG service and formats the results.
pub struct QueryDispatcher {
    service: Arc<dyn RagService>,
    page: PageConfig,
}

impl QueryDispatcher {
    #[must_use]
    pub fn new(service: Arc<dyn RagService>, page: PageConfig) -> Self {
        Self { service, page }
    }

    /// Returns the page metadata used for messages.
    pub fn page(&self) -> &PageConfig {
        &self.page
    }

    /// Submits one question.
    ///
    /// Blank questions produce `Outcome::Warning` without calling the service.
    /// Otherwise the original, untrimmed text is sent exactly once and the call
    /// blocks until it returns or fails.
    pub fn submit(&self, question: &str) -> Outcome {
        if !is_submittable(question) {
            warn!("blank question submitted; not dispatching");
            return Outcome::Warning(self.page.empty_warning.clone());
        }

        info!(chars = question.chars().count(), "dispatching question");
        match self.service.query(question) {
            Ok(answer) => {
                debug!(chars = answer.chars().count(), "answer received");
                Outcome::Answered(answer)
            }
            Err(e) => {
                error!(error = %e, "query failed");
                Outcome::Failed(format!("{}: {}", self.page.error_prefix, e))
            }
        }
    }

    /// Runs the load-files action over the configured sources.
    ///
    /// With no sources this reports the configured success message and does
    /// nothing else.
    pub fn load_files(&self, sources: &[String]) -> (LoadOutcome, IngestReport) {
        if sources.is_empty() {
            info!("load requested with no sources configured");
            return (
                LoadOutcome::Success(self.page.load_success.clone()),
                IngestReport::default(),
            );
        }

        let report = ingest::ingest(self.service.as_ref(), sources);
        let outcome = if report.is_success() {
            LoadOutcome::Success(format!(
                "{} ({} of {})",
                self.page.load_success,
                report.loaded().len(),
                sources.len()
            ))
        } else {
            let details: Vec<String> = report
                .failed()
                .iter()
                .map(|(source, message)| format!("{source}: {message}"))
                .collect();
            LoadOutcome::Failed(format!(
                "{}: {}",
                self.page.load_error_prefix,
                details.join("; ")
            ))
        };

        (outcome, report)
    }
}
