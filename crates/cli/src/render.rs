//! Plain-text rendering of dreams, tags, and analytics.
//!
//! Everything here returns a `String`; callers decide where it goes.
//! `write!` into a `String` cannot fail, so its result is unwrapped.

use std::fmt::{self, Write as _};

use chrono::TimeZone;
use loom_core::account::{UserInfo, UserStats};
use loom_core::analytics::{relative_width, AnalyticsSummary, PatternAnalysis};
use loom_core::dream::{Dream, RewriteResponse, RewriteStyle, SymbolExplanation};
use loom_core::icons::{emotion_icon, symbol_icon};
use loom_core::tags::{display_list, display_symbols, extract_tags};
use loom_core::timeline::{DayBucket, MonthBucket};

/// Widest bar, in characters.
const BAR_WIDTH: usize = 30;

const NOT_READY: &str = "(interpretation in progress)";

/// Horizontal bar for a percentage in `0..=100`.
pub fn bar(percent: f64) -> String {
    let cells = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(cells.max(usize::from(percent > 0.0)))
}

fn local_time<Tz: TimeZone>(dream: &Dream, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    dream
        .created_at
        .with_timezone(tz)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// One line per dream for the journal list.
pub fn dream_line<Tz: TimeZone>(dream: &Dream, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    let mut line = format!("#{:<5} {}  {}", dream.id, local_time(dream, tz), dream.title);
    if dream.has_image() {
        line.push_str(" 🖼");
    }
    if !dream.is_interpreted() {
        write!(line, "  {NOT_READY}").unwrap();
    }
    let tags = extract_tags(dream);
    if !tags.is_empty() {
        write!(line, "  [{}]", tags.join(", ")).unwrap();
    }
    line
}

/// Full detail view of one dream.
pub fn dream_detail<Tz: TimeZone>(dream: &Dream, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    let mut out = String::new();
    writeln!(out, "#{} {}", dream.id, dream.title).unwrap();
    writeln!(out, "{}", local_time(dream, tz)).unwrap();
    writeln!(out).unwrap();
    writeln!(out, "{}", dream.raw_text.trim()).unwrap();

    let Some(interp) = &dream.interpretation else {
        writeln!(out).unwrap();
        writeln!(out, "{NOT_READY}").unwrap();
        return out;
    };

    if let Some(notice) = interp.failure_notice() {
        writeln!(out).unwrap();
        writeln!(out, "{notice}").unwrap();
        return out;
    }

    if let Some(narrative) = interp.poetic_narrative.as_deref().filter(|s| !s.trim().is_empty()) {
        writeln!(out, "\n── Narrative ──\n{}", narrative.trim()).unwrap();
    }
    if let Some(meaning) = interp.meaning.as_deref().filter(|s| !s.trim().is_empty()) {
        writeln!(out, "\n── Meaning ──\n{}", meaning.trim()).unwrap();
    }

    let symbols = interp.symbols.as_deref().map(display_symbols).unwrap_or_default();
    if !symbols.is_empty() {
        writeln!(out, "\n── Symbols ──").unwrap();
        for symbol in symbols {
            let icon = symbol_icon(&symbol.name);
            match symbol.meaning {
                Some(meaning) => {
                    writeln!(out, "{icon} {}: {meaning}", symbol.name).unwrap();
                }
                None => {
                    writeln!(out, "{icon} {}", symbol.name).unwrap();
                }
            }
        }
    }

    let emotions = interp.emotions.as_deref().map(display_list).unwrap_or_default();
    if !emotions.is_empty() {
        let line = emotions
            .iter()
            .map(|e| format!("{} {e}", emotion_icon(e)))
            .collect::<Vec<_>>()
            .join("  ");
        writeln!(out, "\n── Emotions ──\n{line}").unwrap();
    }

    if let Some(url) = interp.image_url.as_deref().filter(|u| !u.is_empty()) {
        writeln!(out, "\n── Image ──\n{url}").unwrap();
    }
    out
}

pub fn tag_cloud(tags: &[String]) -> String {
    if tags.is_empty() {
        return "No tags yet.".to_string();
    }
    format!("Tags: {}", tags.join(" · "))
}

pub fn months(buckets: &[MonthBucket]) -> String {
    let top = buckets.iter().map(|b| b.count).max().unwrap_or(0);
    buckets
        .iter()
        .map(|b| {
            format!(
                "{}  {:>4}  {}",
                b.month,
                b.count,
                bar(relative_width(b.count, top))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn days(buckets: &[DayBucket]) -> String {
    let top = buckets.iter().map(|b| b.count).max().unwrap_or(0);
    buckets
        .iter()
        .map(|b| {
            format!(
                "{}  {:>4}  {}",
                b.day.format("%Y-%m-%d"),
                b.count,
                bar(relative_width(b.count, top))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn analytics<Tz: TimeZone>(summary: &AnalyticsSummary, tz: &Tz, by_day: bool) -> String
where
    Tz::Offset: fmt::Display,
{
    let mut out = String::new();
    writeln!(out, "Dreams recorded:   {}", summary.total_dreams).unwrap();
    writeln!(
        out,
        "With images:       {} ({}%)",
        summary.dreams_with_images,
        summary.image_share_percent()
    )
    .unwrap();

    if !summary.top_symbols.is_empty() {
        let top = summary.top_symbols[0].count;
        writeln!(out, "\nTop symbols").unwrap();
        for s in &summary.top_symbols {
            writeln!(
                out,
                "{} {:<18} {:>4}  {}",
                symbol_icon(&s.symbol),
                s.symbol,
                s.count,
                bar(relative_width(s.count, top))
            )
            .unwrap();
        }
    }

    if !summary.top_emotions.is_empty() {
        let top = summary.top_emotions[0].count;
        writeln!(out, "\nTop emotions").unwrap();
        for e in &summary.top_emotions {
            writeln!(
                out,
                "{} {:<18} {:>4}  {}",
                emotion_icon(&e.emotion),
                e.emotion,
                e.count,
                bar(relative_width(e.count, top))
            )
            .unwrap();
        }
    }

    let timeline = if by_day {
        days(&summary.by_day(tz))
    } else {
        months(&summary.by_month(tz))
    };
    if !timeline.is_empty() {
        writeln!(out, "\n{}", if by_day { "By day" } else { "By month" }).unwrap();
        writeln!(out, "{timeline}").unwrap();
    }
    out
}

pub fn patterns(analysis: &PatternAnalysis) -> String {
    analysis
        .sections()
        .iter()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(heading, text)| format!("── {heading} ──\n{}", text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn symbol_explanation(explanation: &SymbolExplanation) -> String {
    format!(
        "{} {}\n\n── General meaning ──\n{}\n\n── Psychological ──\n{}\n\n── Cultural ──\n{}\n\n── In your dreams ──\n{}",
        symbol_icon(&explanation.symbol),
        explanation.symbol,
        explanation.general_meaning.trim(),
        explanation.psychological.trim(),
        explanation.cultural.trim(),
        explanation.personal_context.trim(),
    )
}

pub fn rewrite(style: RewriteStyle, response: &RewriteResponse) -> String {
    format!(
        "{} {}\n\n{}",
        style.icon(),
        style.label(),
        response.rewritten_narrative.trim()
    )
}

pub fn user(info: &UserInfo, stats: Option<&UserStats>) -> String {
    let mut out = String::new();
    writeln!(out, "{}", info.display_name()).unwrap();
    writeln!(
        out,
        "{}{}",
        info.email,
        if info.email_verified { "" } else { " (unverified)" }
    )
    .unwrap();
    if let Some(stats) = stats {
        writeln!(out).unwrap();
        writeln!(out, "Dreams:               {}", stats.total_dreams).unwrap();
        writeln!(out, "With images:          {}", stats.dreams_with_images).unwrap();
        writeln!(out, "With interpretation:  {}", stats.dreams_with_interpretation).unwrap();
        if let (Some(first), Some(last)) = (&stats.oldest_dream_date, &stats.newest_dream_date) {
            writeln!(out, "First / latest:       {first} / {last}").unwrap();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use loom_core::dream::Interpretation;

    use super::*;

    fn dream(interpretation: Option<Interpretation>) -> Dream {
        Dream {
            id: 3,
            title: "Flooded library".into(),
            raw_text: "Books floating".into(),
            created_at: DateTime::parse_from_rfc3339("2024-02-10T08:30:00Z")
                .unwrap()
                .with_timezone(&Utc),
            interpretation,
        }
    }

    #[test]
    fn bar_scales_and_keeps_small_values_visible() {
        assert_eq!(bar(100.0).chars().count(), BAR_WIDTH);
        assert_eq!(bar(50.0).chars().count(), BAR_WIDTH / 2);
        assert_eq!(bar(0.5).chars().count(), 1);
        assert!(bar(0.0).is_empty());
    }

    #[test]
    fn pending_dream_line_is_marked() {
        let line = dream_line(&dream(None), &Utc);
        assert!(line.starts_with("#3"));
        assert!(line.contains("2024-02-10 08:30"));
        assert!(line.contains(NOT_READY));
    }

    #[test]
    fn detail_lists_symbols_with_icons() {
        let detail = dream_detail(
            &dream(Some(Interpretation {
                meaning: Some("Overwhelm".into()),
                symbols: Some(r#"{"water": "emotion"}"#.into()),
                emotions: Some("calm".into()),
                ..Default::default()
            })),
            &Utc,
        );
        assert!(detail.contains("water: emotion"));
        assert!(detail.contains(&format!("{} water", symbol_icon("water"))));
        assert!(detail.contains("── Emotions ──"));
    }

    #[test]
    fn failure_notice_replaces_sections() {
        let detail = dream_detail(
            &dream(Some(Interpretation {
                meaning: Some("⚠️ Interpretation failed: no API key".into()),
                symbols: Some("water".into()),
                ..Default::default()
            })),
            &Utc,
        );
        assert!(detail.contains("Interpretation failed"));
        assert!(!detail.contains("── Symbols ──"));
    }

    #[test]
    fn analytics_lists_share_and_top_symbols() {
        let summary = AnalyticsSummary {
            total_dreams: 4,
            dreams_with_images: 1,
            top_symbols: vec![loom_core::analytics::SymbolCount {
                symbol: "water".into(),
                count: 3,
            }],
            ..Default::default()
        };
        let text = analytics(&summary, &Utc, false);
        assert!(text.starts_with("Dreams recorded:   4\n"));
        assert!(text.contains("With images:       1 (25%)"));
        assert!(text.contains("Top symbols"));
        assert!(!text.contains("Top emotions"));
    }

    #[test]
    fn empty_pattern_sections_are_skipped() {
        let analysis = PatternAnalysis {
            recurring_themes: "Water".into(),
            ..Default::default()
        };
        assert_eq!(patterns(&analysis), "── Recurring themes ──\nWater");
    }
}
