//! Tag extraction from interpretation symbols and emotions.
//!
//! Symbols arrive either as a JSON object string (symbol name -> meaning)
//! or as free text; emotions are always free text. Both feed one tag set
//! per dream, which the journal view uses for its tag cloud and filters.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::dream::Dream;

/// Maximum number of distinct tags offered in the tag cloud.
pub const MAX_TAG_CLOUD: usize = 40;

static TAG_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,/|;]+|\n").expect("valid regex"));

static DISPLAY_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,\n]").expect("valid regex"));

/// One symbol as shown on the dream detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub name: String,
    /// Per-symbol meaning, present only for the JSON object form.
    pub meaning: Option<String>,
}

/// Distinct tags for one dream, in discovery order (symbols first).
pub fn extract_tags(dream: &Dream) -> Vec<String> {
    let mut tags = OrderedSet::default();
    if let Some(interp) = &dream.interpretation {
        if let Some(symbols) = interp.symbols.as_deref() {
            tags.extend(symbol_tags(symbols));
        }
        if let Some(emotions) = interp.emotions.as_deref() {
            tags.extend(split_tags(emotions));
        }
    }
    tags.into_vec()
}

/// Tags from a symbols field: object keys (in the backend's order) for the
/// JSON form, split text otherwise.
pub fn symbol_tags(symbols: &str) -> Vec<String> {
    match serde_json::from_str::<serde_json::Value>(symbols) {
        Ok(serde_json::Value::Object(map)) => map
            .keys()
            .filter_map(|key| normalize_tag(key))
            .collect(),
        Ok(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str())
            .filter_map(normalize_tag)
            .collect(),
        _ => split_tags(symbols).collect(),
    }
}

/// Split free text on `,` `/` `|` `;` or newlines into normalized tags.
pub fn split_tags(text: &str) -> impl Iterator<Item = String> + '_ {
    TAG_SEPARATORS.split(text).filter_map(normalize_tag)
}

/// The journal tag cloud: the first [`MAX_TAG_CLOUD`] distinct tags across
/// all dreams, sorted.
pub fn tag_cloud(dreams: &[Dream]) -> Vec<String> {
    let mut all = OrderedSet::default();
    for dream in dreams {
        all.extend(extract_tags(dream));
    }
    let mut cloud: Vec<String> = all.into_vec().into_iter().take(MAX_TAG_CLOUD).collect();
    cloud.sort();
    cloud
}

/// Symbols for display, keeping their original casing.
pub fn display_symbols(symbols: &str) -> Vec<SymbolEntry> {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(symbols)
    {
        return map
            .into_iter()
            .map(|(name, value)| SymbolEntry {
                name,
                meaning: match value {
                    serde_json::Value::String(s) => Some(s),
                    serde_json::Value::Null => None,
                    other => Some(other.to_string()),
                },
            })
            .collect();
    }
    display_list(symbols)
        .into_iter()
        .map(|name| SymbolEntry {
            name,
            meaning: None,
        })
        .collect()
}

/// Comma/newline separated list, trimmed, empties dropped.
pub fn display_list(text: &str) -> Vec<String> {
    DISPLAY_SEPARATORS
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim().to_lowercase();
    (tag.chars().count() > 1).then_some(tag)
}

/// Insertion-ordered de-duplicating collector.
#[derive(Default)]
struct OrderedSet {
    seen: HashSet<String>,
    items: Vec<String>,
}

impl OrderedSet {
    fn extend(&mut self, tags: impl IntoIterator<Item = String>) {
        for tag in tags {
            if self.seen.insert(tag.clone()) {
                self.items.push(tag);
            }
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::dream::Interpretation;

    fn dream(symbols: Option<&str>, emotions: Option<&str>) -> Dream {
        Dream {
            id: 1,
            title: "t".into(),
            raw_text: "r".into(),
            created_at: Utc::now(),
            interpretation: Some(Interpretation {
                symbols: symbols.map(str::to_string),
                emotions: emotions.map(str::to_string),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn json_object_symbols_contribute_keys() {
        let tags = symbol_tags(r#"{"Mirror": "self", " Forest ": "unknown", "x": "dropped"}"#);
        assert_eq!(tags, vec!["mirror", "forest"]);
    }

    #[test]
    fn plain_symbols_split_on_all_separators() {
        let tags = symbol_tags("Moon, Ocean / key|door;\nWolf");
        assert_eq!(tags, vec!["moon", "ocean", "key", "door", "wolf"]);
    }

    #[test]
    fn json_scalar_is_treated_as_text() {
        assert_eq!(symbol_tags("42"), vec!["42"]);
    }

    #[test]
    fn json_array_contributes_strings() {
        assert_eq!(symbol_tags(r#"["Moon", "Sea", 3]"#), vec!["moon", "sea"]);
    }

    #[test]
    fn single_character_tags_dropped() {
        assert!(split_tags("a, b ,c").next().is_none());
    }

    #[test]
    fn extract_merges_symbols_and_emotions_without_duplicates() {
        let d = dream(Some("fear, moon"), Some("Fear, awe"));
        assert_eq!(extract_tags(&d), vec!["fear", "moon", "awe"]);
    }

    #[test]
    fn uninterpreted_dream_has_no_tags() {
        let mut d = dream(None, None);
        d.interpretation = None;
        assert!(extract_tags(&d).is_empty());
    }

    #[test]
    fn tag_cloud_caps_before_sorting() {
        let many: Vec<String> = (0..50).map(|i| format!("tag{i:02}")).collect();
        let d = dream(Some(&many.join(",")), None);
        let cloud = tag_cloud(&[d]);
        assert_eq!(cloud.len(), MAX_TAG_CLOUD);
        assert_eq!(cloud.first().map(String::as_str), Some("tag00"));
        assert_eq!(cloud.last().map(String::as_str), Some("tag39"));
    }

    #[test]
    fn tag_cloud_keeps_first_keys_of_large_symbol_object() {
        let entries: Vec<String> = (0..45)
            .rev()
            .map(|i| format!(r#""key{i:02}": "meaning""#))
            .collect();
        let d = dream(Some(&format!("{{{}}}", entries.join(", "))), None);

        let cloud = tag_cloud(&[d]);
        assert_eq!(cloud.len(), MAX_TAG_CLOUD);
        assert_eq!(cloud.first().map(String::as_str), Some("key05"));
        assert_eq!(cloud.last().map(String::as_str), Some("key44"));
    }

    #[test]
    fn tag_cloud_is_sorted_and_distinct() {
        let cloud = tag_cloud(&[dream(Some("wolf, moon"), None), dream(Some("moon"), Some("awe"))]);
        assert_eq!(cloud, vec!["awe", "moon", "wolf"]);
    }

    #[test]
    fn display_symbols_keeps_meanings() {
        let entries = display_symbols(r#"{"Mirror": "self-reflection"}"#);
        assert_eq!(
            entries,
            vec![SymbolEntry {
                name: "Mirror".into(),
                meaning: Some("self-reflection".into())
            }]
        );
    }

    #[test]
    fn display_symbols_follow_backend_order() {
        let names: Vec<String> = display_symbols(r#"{"Zebra": "a", "Apple": "b"}"#)
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Zebra", "Apple"]);
    }

    #[test]
    fn display_symbols_falls_back_to_list() {
        let entries = display_symbols("Moon,\n Dark Water ,");
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Moon", "Dark Water"]);
    }
}
