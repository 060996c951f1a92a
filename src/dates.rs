//! Rendering of feed publication dates for display.

use std::fmt::Write;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use tracing::debug;

use crate::config::DateFormatConfig;

/// Turns raw `pubDate`/`published`/`updated` text into a `"<date> <time>"`
/// label in the reader's locale. Input that does not parse as a date is
/// returned unchanged.
#[derive(Debug, Clone)]
pub struct DateFormatter {
    date_pattern: String,
    time_pattern: String,
    offset: FixedOffset,
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self::from_config(&DateFormatConfig::default())
    }
}

impl DateFormatter {
    pub fn from_config(config: &DateFormatConfig) -> Self {
        let offset = FixedOffset::east_opt(config.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix());

        Self {
            date_pattern: config.date.clone(),
            time_pattern: config.time.clone(),
            offset,
        }
    }

    pub fn format(&self, raw: &str) -> String {
        let Some(parsed) = parse_date(raw, &self.offset) else {
            debug!("Unparseable date, passing through: {:?}", raw);
            return raw.to_string();
        };

        let local = parsed.with_timezone(&self.offset);
        let mut label = String::new();
        // A bad strftime pattern surfaces as fmt::Error here instead of a panic
        if write!(
            label,
            "{} {}",
            local.format(&self.date_pattern),
            local.format(&self.time_pattern)
        )
        .is_err()
        {
            debug!("Date pattern could not be rendered, passing through: {:?}", raw);
            return raw.to_string();
        }
        label
    }
}

/// Parse the date formats feeds actually use, most specific first.
/// Timestamps without a zone are read in `offset`, the zone they are shown in.
pub fn parse_date(raw: &str, offset: &FixedOffset) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    dateparser::parse_with_timezone(trimmed, offset).ok()
}
