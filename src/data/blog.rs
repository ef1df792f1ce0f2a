//! Blog post records

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{null_as_default, RecordId};

/// Words per minute used for reading-time estimates
const WORDS_PER_MINUTE: usize = 200;

/// A blog post as returned by `/blogs` and `/blogs/:slug`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Blog {
    #[serde(alias = "_id")]
    pub id: Option<RecordId>,
    #[serde(deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    pub excerpt: Option<String>,
    /// Markdown body; list responses usually omit it
    pub content: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(alias = "publishedAt")]
    pub published_at: Option<String>,
    #[serde(alias = "createdAt")]
    pub created_at: Option<String>,
    #[serde(alias = "coverImage")]
    pub cover_image: Option<String>,
}

impl Blog {
    /// Estimated minutes to read the body (or excerpt), at least 1.
    pub fn reading_time_minutes(&self) -> usize {
        let text = self
            .content
            .as_deref()
            .or(self.excerpt.as_deref())
            .unwrap_or_default();
        let words = text.split_whitespace().count();
        words.div_ceil(WORDS_PER_MINUTE).max(1)
    }

    /// Publication date formatted like "March 5, 2024"
    ///
    /// Falls back to the creation date, and to the raw string when it is not
    /// an RFC 3339 timestamp or `YYYY-MM-DD` date.
    pub fn display_date(&self) -> Option<String> {
        let raw = self.published_at.as_deref().or(self.created_at.as_deref())?;
        Some(format_date(raw))
    }
}

fn format_date(raw: &str) -> String {
    const FORMAT: &str = "%B %-d, %Y";

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return timestamp.format(FORMAT).to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format(FORMAT).to_string();
    }
    raw.to_string()
}
