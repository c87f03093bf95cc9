//! Journal view integration: backend JSON through tags, filters, icons,
//! timelines, and the job state machine.

use chrono::FixedOffset;
use loom_core::dream::Dream;
use loom_core::filter::DreamFilter;
use loom_core::icons::{emotion_icon, symbol_icon, DEFAULT_EMOTION_ICON, DEFAULT_SYMBOL_ICON};
use loom_core::job::{JobPhase, JobSnapshot, MSG_TAKING_LONGER, MSG_WEAVING};
use loom_core::tags::{extract_tags, tag_cloud};
use loom_core::timeline::dreams_by_month;

fn journal() -> Vec<Dream> {
    let json = r#"[
        {
            "id": 1,
            "title": "Ocean of mirrors",
            "raw_text": "Waves reflected my face",
            "created_at": "2024-03-31T23:30:00",
            "interpretation": {
                "poetic_narrative": "The sea looked back",
                "meaning": "Self-examination",
                "symbols": "{\"ocean\": \"the unconscious\", \"mirror\": \"identity\"}",
                "emotions": "curiosity, unease",
                "image_url": "https://cdn.example/1.png"
            }
        },
        {
            "id": 2,
            "title": "Late train",
            "raw_text": "I kept missing the train",
            "created_at": "2024-04-02T07:00:00.250",
            "interpretation": {
                "meaning": "Fear of missed chances",
                "symbols": "train / clock; platform",
                "emotions": "anxiety"
            }
        },
        {
            "id": 3,
            "title": "Unfinished",
            "raw_text": "Still processing",
            "created_at": "2024-04-03T12:00:00",
            "interpretation": null
        }
    ]"#;
    serde_json::from_str(json).unwrap()
}

#[test]
fn tags_come_from_symbols_then_emotions() {
    let dreams = journal();
    assert_eq!(
        extract_tags(&dreams[0]),
        vec!["ocean", "mirror", "curiosity", "unease"]
    );
    assert_eq!(
        extract_tags(&dreams[1]),
        vec!["train", "clock", "platform", "anxiety"]
    );
    assert!(extract_tags(&dreams[2]).is_empty());
}

#[test]
fn tag_cloud_is_sorted_and_distinct() {
    let cloud = tag_cloud(&journal());
    let mut sorted = cloud.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(cloud, sorted);
    assert_eq!(cloud.len(), 8);
}

#[test]
fn search_and_tags_narrow_the_journal() {
    let dreams = journal();
    let by_text: Vec<i64> = DreamFilter::new("MISSED")
        .apply(&dreams)
        .iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(by_text, vec![2]);

    let by_tag: Vec<i64> = DreamFilter::default()
        .with_tag("mirror")
        .apply(&dreams)
        .iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(by_tag, vec![1]);
}

#[test]
fn icons_fall_back_to_defaults() {
    assert_ne!(symbol_icon("ocean"), DEFAULT_SYMBOL_ICON);
    assert_eq!(symbol_icon("zzzz"), DEFAULT_SYMBOL_ICON);
    assert_ne!(emotion_icon("anxiety"), DEFAULT_EMOTION_ICON);
    assert_eq!(emotion_icon(""), DEFAULT_EMOTION_ICON);
}

#[test]
fn monthly_timeline_uses_viewer_zone() {
    let dreams = journal();
    let utc = FixedOffset::east_opt(0).unwrap();
    let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();

    let months: Vec<(String, u32)> = dreams_by_month(&dreams, &utc)
        .into_iter()
        .map(|b| (b.month, b.count))
        .collect();
    assert_eq!(months, vec![("2024-03".into(), 1), ("2024-04".into(), 2)]);

    // 23:30 UTC on Mar 31 is already April in Tokyo.
    let months = dreams_by_month(&dreams, &tokyo);
    assert_eq!(months.len(), 1);
    assert_eq!(months[0].count, 3);
}

#[test]
fn job_flow_resolves_once() {
    let dreams = journal();
    let mut pending = dreams[2].clone();
    let mut snapshot = JobSnapshot::new();

    assert!(snapshot.begin_creating(true));
    assert_eq!(snapshot.status_message.as_deref(), Some(MSG_WEAVING));
    assert!(snapshot.created(pending.clone()));
    assert!(snapshot.time_out());
    assert_eq!(snapshot.status_message.as_deref(), Some(MSG_TAKING_LONGER));

    pending.interpretation = dreams[1].interpretation.clone();
    assert!(snapshot.resolve(pending.clone()));
    assert_eq!(snapshot.phase, JobPhase::Resolved);
    assert!(!snapshot.resolve(pending));
    assert!(!snapshot.apply_status("late"));
}
