//! Dream records and the request bodies that create or change them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{backend_timestamp, DreamId, Timestamp};

/// Marker the backend puts at the start of `meaning` when interpretation
/// failed (missing API key, provider error).
pub const FAILURE_MARKER: char = '⚠';

/// A journal entry as returned by `GET /dreams/{id}`.
///
/// `interpretation` is `None` until the background job finishes; its
/// presence is the completion signal the notifier polls for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dream {
    pub id: DreamId,
    pub title: String,
    pub raw_text: String,
    #[serde(with = "backend_timestamp")]
    pub created_at: Timestamp,
    #[serde(default)]
    pub interpretation: Option<Interpretation>,
}

impl Dream {
    pub fn is_interpreted(&self) -> bool {
        self.interpretation.is_some()
    }

    pub fn has_image(&self) -> bool {
        self.interpretation
            .as_ref()
            .and_then(|i| i.image_url.as_deref())
            .is_some_and(|url| !url.is_empty())
    }
}

/// AI output attached to a dream. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    #[serde(default)]
    pub poetic_narrative: Option<String>,
    #[serde(default)]
    pub meaning: Option<String>,
    /// Either a JSON object string (`{"mirror": "self-reflection"}`) or
    /// free text separated by commas/newlines.
    #[serde(default)]
    pub symbols: Option<String>,
    /// Comma-separated emotion names.
    #[serde(default)]
    pub emotions: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Interpretation {
    /// The backend's failure notice, if this interpretation is one.
    pub fn failure_notice(&self) -> Option<&str> {
        self.meaning
            .as_deref()
            .filter(|meaning| meaning.contains(FAILURE_MARKER))
    }

    pub fn is_failure_notice(&self) -> bool {
        self.failure_notice().is_some()
    }
}

/// Body of `POST /dreams`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DreamDraft {
    pub title: String,
    pub raw_text: String,
    #[serde(default)]
    pub generate_image: bool,
}

impl DreamDraft {
    pub fn new(title: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            raw_text: raw_text.into(),
            generate_image: false,
        }
    }

    pub fn with_image(mut self, generate_image: bool) -> Self {
        self.generate_image = generate_image;
        self
    }

    /// Both title and text are required and must not be blank.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::Validation("title is required".to_string()));
        }
        if self.raw_text.trim().is_empty() {
            return Err(CoreError::Validation("dream text is required".to_string()));
        }
        Ok(())
    }
}

/// Body of `PUT /dreams/{id}`. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DreamUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

impl DreamUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.raw_text.is_none()
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.is_empty() {
            return Err(CoreError::Validation("nothing to update".to_string()));
        }
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(CoreError::Validation("title cannot be blank".to_string()));
        }
        if self.raw_text.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(CoreError::Validation("dream text cannot be blank".to_string()));
        }
        Ok(())
    }
}

/// Reply to `POST /dreams/{id}/regenerate`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegenerateResponse {
    pub message: String,
    pub dream_id: DreamId,
}

// ---------------------------------------------------------------------------
// Rewrites
// ---------------------------------------------------------------------------

/// Narrative styles the backend can retell a dream in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewriteStyle {
    #[serde(rename = "horror")]
    Horror,
    #[serde(rename = "sci-fi")]
    SciFi,
    #[serde(rename = "children")]
    Children,
    #[serde(rename = "fantasy")]
    Fantasy,
    #[serde(rename = "noir")]
    Noir,
    #[serde(rename = "poetic")]
    Poetic,
}

impl RewriteStyle {
    pub const ALL: [RewriteStyle; 6] = [
        RewriteStyle::Horror,
        RewriteStyle::SciFi,
        RewriteStyle::Children,
        RewriteStyle::Fantasy,
        RewriteStyle::Noir,
        RewriteStyle::Poetic,
    ];

    /// Wire value sent to the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            RewriteStyle::Horror => "horror",
            RewriteStyle::SciFi => "sci-fi",
            RewriteStyle::Children => "children",
            RewriteStyle::Fantasy => "fantasy",
            RewriteStyle::Noir => "noir",
            RewriteStyle::Poetic => "poetic",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RewriteStyle::Horror => "Horror",
            RewriteStyle::SciFi => "Sci-Fi",
            RewriteStyle::Children => "Children's Story",
            RewriteStyle::Fantasy => "Fantasy",
            RewriteStyle::Noir => "Noir",
            RewriteStyle::Poetic => "Poetic",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            RewriteStyle::Horror => "👻",
            RewriteStyle::SciFi => "🚀",
            RewriteStyle::Children => "🧸",
            RewriteStyle::Fantasy => "✨",
            RewriteStyle::Noir => "🕵️",
            RewriteStyle::Poetic => "📜",
        }
    }
}

impl fmt::Display for RewriteStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RewriteStyle {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        RewriteStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == wanted)
            .ok_or_else(|| CoreError::Validation(format!("unknown rewrite style: {s}")))
    }
}

/// Body of `POST /dreams/{id}/rewrite`.
#[derive(Debug, Clone, Serialize)]
pub struct RewriteRequest {
    pub style: RewriteStyle,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RewriteResponse {
    pub rewritten_narrative: String,
    pub style: String,
}

/// Reply to `GET /symbols/{symbol}/explain`.
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolExplanation {
    pub symbol: String,
    pub general_meaning: String,
    pub psychological: String,
    pub cultural: String,
    pub personal_context: String,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn dream_without_interpretation_deserializes() {
        let json = r#"{"id":7,"title":"Mirror forest","raw_text":"I flew","created_at":"2024-01-15T14:30:00.5","interpretation":null}"#;
        let dream: Dream = serde_json::from_str(json).unwrap();
        assert_eq!(dream.id, 7);
        assert!(!dream.is_interpreted());
        assert!(!dream.has_image());
    }

    #[test]
    fn dream_with_interpretation_deserializes() {
        let json = r#"{"id":7,"title":"t","raw_text":"r","created_at":"2024-01-15T14:30:00",
            "interpretation":{"poetic_narrative":"p","meaning":"m","symbols":"moon","emotions":"awe","image_url":"http://img"}}"#;
        let dream: Dream = serde_json::from_str(json).unwrap();
        assert!(dream.is_interpreted());
        assert!(dream.has_image());
    }

    #[test]
    fn failure_notice_detected() {
        let interp = Interpretation {
            meaning: Some("⚠️ Configuration Error: GROQ_API_KEY not configured".into()),
            ..Default::default()
        };
        assert!(interp.is_failure_notice());
        assert!(!Interpretation::default().is_failure_notice());
    }

    #[test]
    fn draft_validation() {
        assert!(DreamDraft::new("Flying", "over the sea").validate().is_ok());
        assert_matches!(
            DreamDraft::new("  ", "text").validate(),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            DreamDraft::new("title", "\n").validate(),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn draft_serializes_generate_image_flag() {
        let draft = DreamDraft::new("a", "b").with_image(true);
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["generate_image"], true);
        assert_eq!(value["raw_text"], "b");
    }

    #[test]
    fn update_skips_missing_fields() {
        let update = DreamUpdate {
            title: Some("New".into()),
            raw_text: None,
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value, serde_json::json!({"title": "New"}));
        assert!(update.validate().is_ok());
        assert!(DreamUpdate::default().validate().is_err());
    }

    #[test]
    fn rewrite_style_round_trips_wire_names() {
        assert_eq!("sci-fi".parse::<RewriteStyle>().unwrap(), RewriteStyle::SciFi);
        assert_eq!(" Noir ".parse::<RewriteStyle>().unwrap(), RewriteStyle::Noir);
        assert!("western".parse::<RewriteStyle>().is_err());
        let body = serde_json::to_value(RewriteRequest {
            style: RewriteStyle::SciFi,
        })
        .unwrap();
        assert_eq!(body["style"], "sci-fi");
    }
}
