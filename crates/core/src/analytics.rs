//! Analytics payloads and the small derived figures the dashboard shows.

use chrono::TimeZone;
use serde::{Deserialize, Serialize};

use crate::timeline::{bucket_by_day, bucket_by_month, parse_dated, DayBucket, MonthBucket};

/// Reply to `GET /analytics/summary`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_dreams: u32,
    pub dreams_with_images: u32,
    #[serde(default)]
    pub top_symbols: Vec<SymbolCount>,
    #[serde(default)]
    pub top_emotions: Vec<EmotionCount>,
    /// One entry per dream; bucketed client-side in the viewer's zone.
    #[serde(default)]
    pub dreams_with_dates: Vec<DatedCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolCount {
    pub symbol: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionCount {
    pub emotion: String,
    pub count: u32,
}

/// A naive-UTC ISO timestamp string with a weight (always 1 today).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatedCount {
    pub created_at: String,
    #[serde(default = "one")]
    pub count: u32,
}

fn one() -> u32 {
    1
}

impl AnalyticsSummary {
    /// Share of dreams that have an image, rounded to a whole percent.
    pub fn image_share_percent(&self) -> u32 {
        if self.total_dreams == 0 {
            return 0;
        }
        (f64::from(self.dreams_with_images) * 100.0 / f64::from(self.total_dreams)).round() as u32
    }

    pub fn by_day<Tz: TimeZone>(&self, tz: &Tz) -> Vec<DayBucket> {
        bucket_by_day(parse_dated(&self.dreams_with_dates), tz)
    }

    pub fn by_month<Tz: TimeZone>(&self, tz: &Tz) -> Vec<MonthBucket>
    where
        Tz::Offset: std::fmt::Display,
    {
        bucket_by_month(parse_dated(&self.dreams_with_dates), tz)
    }
}

/// Bar width for `count`, as a percentage of the leading entry.
pub fn relative_width(count: u32, top: u32) -> f64 {
    if top == 0 {
        return 0.0;
    }
    f64::from(count) * 100.0 / f64::from(top)
}

/// Reply to `POST /analytics/patterns`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternAnalysis {
    pub recurring_themes: String,
    pub emotional_patterns: String,
    pub symbol_patterns: String,
    pub temporal_insights: String,
    pub personal_growth: String,
    pub recommendations: String,
}

impl PatternAnalysis {
    /// Section headings paired with their text, in display order.
    pub fn sections(&self) -> [(&'static str, &str); 6] {
        [
            ("Recurring themes", self.recurring_themes.as_str()),
            ("Emotional patterns", self.emotional_patterns.as_str()),
            ("Symbol patterns", self.symbol_patterns.as_str()),
            ("Temporal insights", self.temporal_insights.as_str()),
            ("Personal growth", self.personal_growth.as_str()),
            ("Recommendations", self.recommendations.as_str()),
        ]
    }
}
