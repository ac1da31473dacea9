//! Schedule item types and instant parsing.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ParseError;

/// Opaque reference to an item's visual element, assigned by the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemHandle(pub usize);

/// A single scheduled event as read from the surface for one layout pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub handle: ItemHandle,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Intrinsic height of the rendered content in pixels.
    #[serde(default)]
    pub content_height: f64,
}

impl ScheduleItem {
    pub fn new(handle: ItemHandle, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            handle,
            start,
            end,
            content_height: 0.0,
        }
    }

    /// Set the measured content height
    pub fn with_content_height(mut self, height: f64) -> Self {
        self.content_height = height;
        self
    }

    /// Whether the item satisfies `start < end`.
    ///
    /// Items that don't are still laid out; the engine floors their height.
    pub fn is_well_formed(&self) -> bool {
        self.start < self.end
    }

    /// Whether `instant` falls in the half-open interval `[start, end)`
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Get duration in minutes
    pub fn duration_minutes(&self) -> f64 {
        minutes_between(self.start, self.end)
    }
}

/// Bounds of the rendered day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Build a window from raw attribute text, applying the earliest-instant
    /// policy to either bound that fails to parse.
    pub fn parse_lenient(start: &str, end: &str) -> Self {
        Self {
            start: parse_instant_or_earliest(start),
            end: parse_instant_or_earliest(end),
        }
    }
}

/// Sort items ascending by start. Stable, so equal starts keep surface order.
pub fn sort_by_start(items: &mut [ScheduleItem]) {
    items.sort_by_key(|item| item.start);
}

/// Parse an instant from RFC 3339 text, or from a zone-less
/// `YYYY-MM-DDTHH:MM[:SS]` form which is read as UTC.
pub fn try_parse_instant(raw: &str) -> Result<DateTime<Utc>, ParseError> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(naive.and_utc());
        }
    }

    Err(ParseError::InvalidInstant {
        raw: raw.to_string(),
        message: "expected RFC 3339 or YYYY-MM-DDTHH:MM[:SS]".to_string(),
    })
}

/// Parse an instant, falling back to the earliest representable instant.
///
/// A malformed item therefore sorts to the top of the layout instead of
/// aborting the pass.
pub fn parse_instant_or_earliest(raw: &str) -> DateTime<Utc> {
    try_parse_instant(raw).unwrap_or_else(|err| {
        warn!(%err, "malformed instant, using earliest representable instant");
        DateTime::<Utc>::MIN_UTC
    })
}

/// Signed real minutes from `from` to `to`.
pub(crate) fn minutes_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 60_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc3339_with_offset() {
        let dt = try_parse_instant("2025-11-15T09:00:00+08:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 11, 15, 1, 0, 0).unwrap());
    }

    #[test]
    fn parses_naive_forms_as_utc() {
        let expected = Utc.with_ymd_and_hms(2025, 11, 15, 9, 30, 0).unwrap();
        assert_eq!(try_parse_instant("2025-11-15T09:30").unwrap(), expected);
        assert_eq!(try_parse_instant("2025-11-15 09:30:00").unwrap(), expected);
    }

    #[test]
    fn malformed_instant_is_earliest() {
        assert!(try_parse_instant("not a time").is_err());
        assert_eq!(parse_instant_or_earliest("nope"), DateTime::<Utc>::MIN_UTC);
        assert_eq!(parse_instant_or_earliest(""), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn contains_is_half_open() {
        let start = Utc.with_ymd_and_hms(2025, 11, 15, 9, 0, 0).unwrap();
        let end = start + chrono::Duration::minutes(30);
        let item = ScheduleItem::new(ItemHandle(0), start, end);

        assert!(item.contains(start));
        assert!(item.contains(end - chrono::Duration::seconds(1)));
        assert!(!item.contains(end));
        assert_eq!(item.duration_minutes(), 30.0);
    }

    #[test]
    fn sort_is_stable_for_equal_starts() {
        let start = Utc.with_ymd_and_hms(2025, 11, 15, 9, 0, 0).unwrap();
        let end = start + chrono::Duration::minutes(10);
        let mut items = vec![
            ScheduleItem::new(ItemHandle(2), start + chrono::Duration::hours(1), end),
            ScheduleItem::new(ItemHandle(0), start, end),
            ScheduleItem::new(ItemHandle(1), start, end),
        ];
        sort_by_start(&mut items);
        let order: Vec<_> = items.iter().map(|i| i.handle.0).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }
}
