//! Accumulates model results into the text shown to the user.
//!
//! The formatter is owned by the UI thread. Background work never touches it
//! directly: results are handed back to the UI thread (as iced messages, or on
//! the CLI's main task) and applied there through [`ResultFormatter::apply`].

use std::thread::{self, ThreadId};

use crate::models::{InferenceReport, ModelOutcome, RequestId};

pub const IDLE_TEXT: &str = "Take or choose a photo of the eardrum.";
pub const CLASSIFYING_TEXT: &str = "Classifying...";
pub const ERROR_TEXT: &str = "An error has occured.";

pub const DEFAULT_PRECISION: usize = 1;

/// How a model that produced no result affects results already shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// The whole display is replaced by the error text, and later results
    /// for the same request are not shown under it
    #[default]
    Clobber,
    /// Only the failing model's line shows the error
    Isolated,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayLine {
    Score { tag: String, score: f32 },
    Missing { tag: String },
}

impl DisplayLine {
    pub fn tag(&self) -> &str {
        match self {
            DisplayLine::Score { tag, .. } | DisplayLine::Missing { tag } => tag,
        }
    }

    pub fn render(&self, precision: usize) -> String {
        match self {
            DisplayLine::Score { tag, score } => {
                format!("{}: {:.*}%", tag, precision, *score as f64 * 100.0)
            }
            DisplayLine::Missing { tag } => format!("{}: {}", tag, ERROR_TEXT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DisplayState {
    #[default]
    Idle,
    Classifying {
        request: RequestId,
    },
    /// Lines in the order the results arrived
    Showing {
        request: RequestId,
        lines: Vec<DisplayLine>,
    },
    Failed {
        request: RequestId,
    },
}

impl DisplayState {
    pub fn request(&self) -> Option<RequestId> {
        match self {
            DisplayState::Idle => None,
            DisplayState::Classifying { request }
            | DisplayState::Showing { request, .. }
            | DisplayState::Failed { request } => Some(*request),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResultFormatter {
    state: DisplayState,
    policy: MergePolicy,
    precision: usize,
    owner: Option<ThreadId>,
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(MergePolicy::default(), DEFAULT_PRECISION)
    }
}

impl ResultFormatter {
    pub fn new(policy: MergePolicy, precision: usize) -> Self {
        Self {
            state: DisplayState::Idle,
            policy,
            precision,
            owner: None,
        }
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Read-only snapshot of the current state
    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Start showing `request`. Results of any earlier request are ignored from now on.
    ///
    /// The first call binds the formatter to the calling thread.
    pub fn begin(&mut self, request: RequestId) {
        self.check_thread();
        self.state = DisplayState::Classifying { request };
    }

    /// Back to the idle prompt
    pub fn reset(&mut self) {
        self.check_thread();
        self.state = DisplayState::Idle;
    }

    /// Apply one model's report. Returns whether the display changed.
    pub fn apply(&mut self, report: InferenceReport) -> bool {
        self.check_thread();

        if self.state.request() != Some(report.request) {
            log::debug!(
                "Ignoring '{}' result of stale request {}",
                report.tag,
                report.request
            );
            return false;
        }

        let line = match report.outcome {
            ModelOutcome::Superseded => return false,
            ModelOutcome::Score(score) => DisplayLine::Score {
                tag: report.tag,
                score,
            },
            ModelOutcome::NoResult | ModelOutcome::Failed(_) => match self.policy {
                MergePolicy::Clobber => {
                    if matches!(self.state, DisplayState::Failed { .. }) {
                        return false;
                    }
                    self.state = DisplayState::Failed {
                        request: report.request,
                    };
                    return true;
                }
                MergePolicy::Isolated => DisplayLine::Missing { tag: report.tag },
            },
        };

        match &mut self.state {
            DisplayState::Classifying { request } => {
                let request = *request;
                self.state = DisplayState::Showing {
                    request,
                    lines: vec![line],
                };
                true
            }
            DisplayState::Showing { lines, .. } => {
                if lines.iter().any(|existing| existing.tag() == line.tag()) {
                    log::warn!("Duplicate result for '{}' ignored", line.tag());
                    return false;
                }
                lines.push(line);
                true
            }
            // Errors stick for the rest of the request
            DisplayState::Failed { .. } | DisplayState::Idle => false,
        }
    }

    /// True once `expected` models are accounted for or the error is showing
    pub fn is_settled(&self, expected: usize) -> bool {
        match &self.state {
            DisplayState::Showing { lines, .. } => lines.len() >= expected,
            DisplayState::Failed { .. } => true,
            DisplayState::Idle | DisplayState::Classifying { .. } => false,
        }
    }

    pub fn render(&self) -> String {
        match &self.state {
            DisplayState::Idle => IDLE_TEXT.to_string(),
            DisplayState::Classifying { .. } => CLASSIFYING_TEXT.to_string(),
            DisplayState::Showing { lines, .. } => lines
                .iter()
                .map(|line| line.render(self.precision))
                .collect::<Vec<_>>()
                .join("\n"),
            DisplayState::Failed { .. } => ERROR_TEXT.to_string(),
        }
    }

    fn check_thread(&mut self) {
        let current = thread::current().id();
        match self.owner {
            None => self.owner = Some(current),
            Some(owner) => debug_assert_eq!(
                owner, current,
                "display state mutated off its owning thread"
            ),
        }
    }
}
