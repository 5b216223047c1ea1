//! Keyword intent classifier.
//!
//! First-match rules over a fixed, ordered list of keyword groups. Matching is
//! a case-insensitive substring test, so "hi" also matches inside words such
//! as "this" or "machine".

use serde::{Deserialize, Serialize};

/// Intent labels understood by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// "weather"
    WeatherQuery,
    /// "time"
    TimeQuery,
    /// "hello" / "hi"
    Greeting,
    /// Nothing matched: defer to the AI fallback
    UnknownIntent,
}

/// Keyword groups in evaluation order. The first group with a hit wins.
const KEYWORD_RULES: &[(&[&str], Intent)] = &[
    (&["weather"], Intent::WeatherQuery),
    (&["time"], Intent::TimeQuery),
    (&["hello", "hi"], Intent::Greeting),
];

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WeatherQuery => "weather_query",
            Self::TimeQuery => "time_query",
            Self::Greeting => "greeting",
            Self::UnknownIntent => "unknown_intent",
        }
    }

    /// Whether this label needs the AI fallback
    pub fn needs_fallback(&self) -> bool {
        matches!(self, Self::UnknownIntent)
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify free text into an [`Intent`]. Never fails.
pub fn classify_intent(text: &str) -> Intent {
    let lower = text.to_lowercase();

    KEYWORD_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, intent)| *intent)
        .unwrap_or(Intent::UnknownIntent)
}
