//! Journal search: free-text query plus required tags.

use std::collections::BTreeSet;

use crate::dream::Dream;
use crate::tags::extract_tags;

/// Criteria for narrowing the dream list.
///
/// The query matches case-insensitively against title, text, narrative,
/// meaning, symbols, and emotions. Every required tag must be among the
/// dream's extracted tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DreamFilter {
    query: String,
    required_tags: BTreeSet<String>,
}

impl DreamFilter {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.trim().to_lowercase(),
            required_tags: BTreeSet::new(),
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.toggle_tag(tag);
        self
    }

    /// Add the tag if absent, remove it if present. Returns `true` when the
    /// tag is required afterwards.
    pub fn toggle_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim().to_lowercase();
        if self.required_tags.remove(&tag) {
            false
        } else {
            self.required_tags.insert(tag);
            true
        }
    }

    pub fn required_tags(&self) -> impl Iterator<Item = &str> {
        self.required_tags.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.required_tags.is_empty()
    }

    pub fn matches(&self, dream: &Dream) -> bool {
        if !self.query.is_empty() && !self.text_matches(dream) {
            return false;
        }
        if self.required_tags.is_empty() {
            return true;
        }
        let tags: BTreeSet<String> = extract_tags(dream).into_iter().collect();
        self.required_tags.is_subset(&tags)
    }

    pub fn apply<'a>(&self, dreams: &'a [Dream]) -> Vec<&'a Dream> {
        dreams.iter().filter(|d| self.matches(d)).collect()
    }

    fn text_matches(&self, dream: &Dream) -> bool {
        let q = self.query.as_str();
        let contains = |field: Option<&str>| field.is_some_and(|f| f.to_lowercase().contains(q));

        if contains(Some(dream.title.as_str())) || contains(Some(dream.raw_text.as_str())) {
            return true;
        }
        dream.interpretation.as_ref().is_some_and(|i| {
            contains(i.poetic_narrative.as_deref())
                || contains(i.meaning.as_deref())
                || contains(i.symbols.as_deref())
                || contains(i.emotions.as_deref())
        })
    }
}
