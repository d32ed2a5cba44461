//! Relative commit ages ("3 days ago")
//!
//! Ages are bucketed first and rendered second, so every locale shares the
//! exact same bucket boundaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MINUTE: i64 = 60;
const HOUR: i64 = 3_600;
const DAY: i64 = 86_400;
const WEEK: i64 = 604_800;
const MONTH: i64 = 2_592_000;

/// Placeholder shown instead of an age when a repository has no commits
pub const NO_AGE: &str = "-";

/// A coarse age category with its whole-unit count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBucket {
    /// Less than a minute
    JustNow,
    /// Whole minutes, 1..=59
    Minutes(i64),
    /// Whole hours, 1..=23
    Hours(i64),
    /// Whole days, 1..=6
    Days(i64),
    /// Whole weeks, 1..=4
    Weeks(i64),
    /// Whole 30-day months, 1..
    Months(i64),
}

impl AgeBucket {
    /// Bucket an elapsed number of seconds; negative values count as zero
    pub fn from_elapsed_secs(elapsed: i64) -> Self {
        let x = elapsed.max(0);
        if x < MINUTE {
            Self::JustNow
        } else if x < HOUR {
            Self::Minutes(x / MINUTE)
        } else if x < DAY {
            Self::Hours(x / HOUR)
        } else if x < WEEK {
            Self::Days(x / DAY)
        } else if x < MONTH {
            Self::Weeks(x / WEEK)
        } else {
            Self::Months(x / MONTH)
        }
    }

    /// Bucket the time between `timestamp` and `now`
    pub fn between(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self::from_elapsed_secs((now - timestamp).num_seconds())
    }
}

/// String table used to render an [`AgeBucket`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English
    #[default]
    En,
    /// German
    De,
}

impl Locale {
    /// Parse a locale code such as `en`, `de` or `de-AT`
    pub fn parse(code: &str) -> Option<Self> {
        let primary = code.split(['-', '_']).next().unwrap_or("");
        match primary.to_ascii_lowercase().as_str() {
            "en" => Some(Self::En),
            "de" => Some(Self::De),
            _ => None,
        }
    }

    /// Render a bucket in this locale
    pub fn render(self, bucket: AgeBucket) -> String {
        match self {
            Self::En => render_en(bucket),
            Self::De => render_de(bucket),
        }
    }
}

fn render_en(bucket: AgeBucket) -> String {
    match bucket {
        AgeBucket::JustNow => "just now".to_string(),
        AgeBucket::Minutes(n) => format!("{} min ago", n),
        AgeBucket::Hours(n) => format!("{} h ago", n),
        AgeBucket::Days(1) => "yesterday".to_string(),
        AgeBucket::Days(n) => format!("{} days ago", n),
        AgeBucket::Weeks(1) => "1 week ago".to_string(),
        AgeBucket::Weeks(n) => format!("{} weeks ago", n),
        AgeBucket::Months(1) => "1 month ago".to_string(),
        AgeBucket::Months(n) => format!("{} months ago", n),
    }
}

fn render_de(bucket: AgeBucket) -> String {
    match bucket {
        AgeBucket::JustNow => "gerade eben".to_string(),
        AgeBucket::Minutes(n) => format!("vor {} Min.", n),
        AgeBucket::Hours(n) => format!("vor {} Std.", n),
        AgeBucket::Days(1) => "gestern".to_string(),
        AgeBucket::Days(n) => format!("vor {} Tagen", n),
        AgeBucket::Weeks(1) => "vor 1 Woche".to_string(),
        AgeBucket::Weeks(n) => format!("vor {} Wochen", n),
        AgeBucket::Months(1) => "vor 1 Monat".to_string(),
        AgeBucket::Months(n) => format!("vor {} Monaten", n),
    }
}

/// Format the age of `timestamp` relative to `now` in English
pub fn relative_age(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    relative_age_in(Locale::En, timestamp, now)
}

/// Format the age of `timestamp` relative to `now` in the given locale
pub fn relative_age_in(locale: Locale, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    locale.render(AgeBucket::between(timestamp, now))
}
