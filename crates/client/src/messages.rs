//! Dream-status push messages and parser.
//!
//! The backend sends JSON text frames on `/ws/dream-status/{id}` with the
//! shape `{"status": "...", "message": "...", "dreamId": 7}`. Every field
//! is optional; a frame may carry a progress line, a completion marker, or
//! both.

use loom_core::job::{PUSH_STATUS_ANALYZING, PUSH_STATUS_DONE, PUSH_STATUS_GENERATING_IMAGE};
use loom_core::types::DreamId;
use serde::Deserialize;

/// One frame from the dream-status channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PushUpdate {
    #[serde(default)]
    pub status: Option<String>,
    /// Human-readable progress line.
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "dreamId")]
    pub dream_id: Option<DreamId>,
}

/// Known values of [`PushUpdate::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushStatus {
    Analyzing,
    GeneratingImage,
    Done,
    Other,
}

impl PushUpdate {
    pub fn kind(&self) -> Option<PushStatus> {
        self.status.as_deref().map(|status| match status {
            PUSH_STATUS_ANALYZING => PushStatus::Analyzing,
            PUSH_STATUS_GENERATING_IMAGE => PushStatus::GeneratingImage,
            PUSH_STATUS_DONE => PushStatus::Done,
            _ => PushStatus::Other,
        })
    }

    /// The completion marker.
    pub fn is_done(&self) -> bool {
        self.kind() == Some(PushStatus::Done)
    }

    /// Progress line to show, if the frame carries one.
    pub fn progress_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }

    /// `false` when the frame names a different dream.
    pub fn concerns(&self, dream_id: DreamId) -> bool {
        self.dream_id.map_or(true, |id| id == dream_id)
    }
}

/// Parse a dream-status text frame.
///
/// Returns `Err` for malformed JSON. Callers should log and continue.
pub fn parse_update(text: &str) -> Result<PushUpdate, serde_json::Error> {
    serde_json::from_str(text)
}
