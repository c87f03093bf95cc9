//! Interpretation job state machine.
//!
//! A dream submitted for interpretation is an asynchronous backend job. The
//! notifier in `loom-client` observes it through two racing paths (push
//! channel and poll loop); both write into one [`JobSnapshot`] whose
//! transition methods refuse anything that would apply a second result.
//!
//! ```text
//! Idle -> Creating -> AwaitingCompletion -> Resolved
//!            |               |
//!            v               v
//!          Failed         TimedOut -> Resolved   (push may still land)
//! ```
//!
//! Any non-terminal phase may move to `Abandoned` when the owner goes away.

use crate::dream::Dream;
use crate::types::DreamId;

// ---------------------------------------------------------------------------
// Status messages
// ---------------------------------------------------------------------------

/// Initial status when only text interpretation was requested.
pub const MSG_ANALYZING: &str = "Analyzing your dream…";

/// Initial status when an image was requested as well.
pub const MSG_WEAVING: &str = "Weaving your dream…";

/// Shown once the poll loop gives up without a result.
pub const MSG_TAKING_LONGER: &str = "Taking longer than expected... Please refresh the page.";

// ---------------------------------------------------------------------------
// Push status values
// ---------------------------------------------------------------------------

/// Interpretation is running.
pub const PUSH_STATUS_ANALYZING: &str = "analyzing";

/// Image generation is running.
pub const PUSH_STATUS_GENERATING_IMAGE: &str = "generating_image";

/// The job finished; fetch the dream to get the result.
pub const PUSH_STATUS_DONE: &str = "done";

/// Lifecycle phase of one creation flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JobPhase {
    #[default]
    Idle,
    Creating,
    AwaitingCompletion,
    /// The poll loop ran out of attempts. The push channel may still resolve.
    TimedOut,
    Resolved,
    /// The creation request failed; no channel was opened.
    Failed,
    /// The owner stopped watching before resolution.
    Abandoned,
}

impl JobPhase {
    /// Phases in which push/poll observations are still applied.
    pub fn is_awaiting(self) -> bool {
        matches!(self, JobPhase::AwaitingCompletion | JobPhase::TimedOut)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobPhase::Resolved | JobPhase::Failed | JobPhase::Abandoned
        )
    }

    /// Whether a spinner should be shown.
    pub fn is_loading(self) -> bool {
        matches!(self, JobPhase::Creating | JobPhase::AwaitingCompletion)
    }
}

/// Everything a view needs to render one creation flow.
///
/// Every transition returns `true` only if it changed the snapshot; a
/// `false` means the observation arrived too late (or too early) and was
/// dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobSnapshot {
    pub phase: JobPhase,
    pub dream_id: Option<DreamId>,
    /// Human-readable progress line; `None` once there is nothing to say.
    pub status_message: Option<String>,
    /// Partial record after creation, full record after resolution.
    pub dream: Option<Dream>,
    /// Creation error, surfaced verbatim.
    pub error: Option<String>,
}

impl JobSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot for watching a dream that already exists (e.g. after a
    /// regenerate request), skipping the creation phases.
    pub fn awaiting(dream: Dream, status_message: impl Into<String>) -> Self {
        Self {
            phase: JobPhase::AwaitingCompletion,
            dream_id: Some(dream.id),
            status_message: Some(status_message.into()),
            dream: Some(dream),
            error: None,
        }
    }

    /// `Idle`/`Failed` -> `Creating`.
    pub fn begin_creating(&mut self, generate_image: bool) -> bool {
        if !matches!(self.phase, JobPhase::Idle | JobPhase::Failed) {
            return false;
        }
        *self = Self {
            phase: JobPhase::Creating,
            status_message: Some(initial_message(generate_image).to_string()),
            ..Self::default()
        };
        true
    }

    /// `Creating` -> `Failed`.
    pub fn creation_failed(&mut self, error: impl Into<String>) -> bool {
        if self.phase != JobPhase::Creating {
            return false;
        }
        self.phase = JobPhase::Failed;
        self.status_message = None;
        self.error = Some(error.into());
        true
    }

    /// `Creating` -> `AwaitingCompletion`, storing the partial record.
    pub fn created(&mut self, dream: Dream) -> bool {
        if self.phase != JobPhase::Creating {
            return false;
        }
        self.phase = JobPhase::AwaitingCompletion;
        self.dream_id = Some(dream.id);
        self.dream = Some(dream);
        true
    }

    /// Replace the progress line. Does not imply completion.
    pub fn apply_status(&mut self, message: impl Into<String>) -> bool {
        if !self.phase.is_awaiting() {
            return false;
        }
        let message = message.into();
        if self.status_message.as_deref() == Some(message.as_str()) {
            return false;
        }
        self.status_message = Some(message);
        true
    }

    /// Apply the final record. Succeeds at most once per flow.
    ///
    /// A failure notice from the backend still resolves the job; its text
    /// becomes the status line so it is not lost.
    pub fn resolve(&mut self, dream: Dream) -> bool {
        if !self.phase.is_awaiting() {
            return false;
        }
        if self.dream_id.is_some_and(|id| id != dream.id) {
            return false;
        }
        self.status_message = dream
            .interpretation
            .as_ref()
            .and_then(|i| i.failure_notice())
            .map(str::to_string);
        self.phase = JobPhase::Resolved;
        self.dream_id = Some(dream.id);
        self.dream = Some(dream);
        true
    }

    /// `AwaitingCompletion` -> `TimedOut`.
    pub fn time_out(&mut self) -> bool {
        if self.phase != JobPhase::AwaitingCompletion {
            return false;
        }
        self.phase = JobPhase::TimedOut;
        self.status_message = Some(MSG_TAKING_LONGER.to_string());
        true
    }

    /// Any non-terminal phase -> `Abandoned`.
    pub fn abandon(&mut self) -> bool {
        if self.phase.is_terminal() {
            return false;
        }
        self.phase = JobPhase::Abandoned;
        true
    }
}

/// Status line shown while the creation request is in flight.
pub fn initial_message(generate_image: bool) -> &'static str {
    if generate_image {
        MSG_WEAVING
    } else {
        MSG_ANALYZING
    }
}
