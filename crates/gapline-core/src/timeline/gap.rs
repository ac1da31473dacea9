//! Idle gap extraction.
//!
//! Finds the maximal intervals inside a day window in which no item is
//! active. Together with the items, the gaps cover every instant of the
//! window exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::item::{minutes_between, DayWindow, ScheduleItem};

/// A maximal idle interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Gap {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Get duration in real minutes
    pub fn duration_minutes(&self) -> f64 {
        minutes_between(self.start, self.end)
    }
}

/// Walks a start-sorted item list and emits the idle intervals around it.
#[derive(Debug, Clone, Copy, Default)]
pub struct GapExtractor;

impl GapExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Find gaps between items in a day
    ///
    /// # Arguments
    /// * `items` - Items sorted ascending by start
    /// * `window` - The rendered day
    ///
    /// # Returns
    /// Non-overlapping gaps ordered by start
    pub fn extract(&self, items: &[ScheduleItem], window: &DayWindow) -> Vec<Gap> {
        let mut gaps = Vec::new();
        let mut cursor = window.start;

        for item in items {
            if item.start > cursor {
                gaps.push(Gap::new(cursor, item.start));
            }
            // Overlapping items never move the cursor backward.
            cursor = cursor.max(item.end);
        }

        if cursor < window.end {
            gaps.push(Gap::new(cursor, window.end));
        }

        gaps
    }
}

/// Convenience function to extract gaps with the default extractor
pub fn extract_gaps(items: &[ScheduleItem], window: &DayWindow) -> Vec<Gap> {
    GapExtractor::new().extract(items, window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::item::ItemHandle;
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 15, h, m, 0).unwrap()
    }

    fn item(idx: usize, start: DateTime<Utc>, end: DateTime<Utc>) -> ScheduleItem {
        ScheduleItem::new(ItemHandle(idx), start, end)
    }

    #[test]
    fn empty_schedule_is_one_gap() {
        let window = DayWindow::new(at(8, 0), at(18, 0));
        let gaps = extract_gaps(&[], &window);
        assert_eq!(gaps, vec![Gap::new(at(8, 0), at(18, 0))]);
        assert_eq!(gaps[0].duration_minutes(), 600.0);
    }

    #[test]
    fn leading_middle_and_trailing_gaps() {
        let window = DayWindow::new(at(8, 0), at(18, 0));
        let items = vec![item(0, at(9, 0), at(10, 0)), item(1, at(11, 0), at(12, 0))];

        let gaps = extract_gaps(&items, &window);
        assert_eq!(
            gaps,
            vec![
                Gap::new(at(8, 0), at(9, 0)),
                Gap::new(at(10, 0), at(11, 0)),
                Gap::new(at(12, 0), at(18, 0)),
            ]
        );
    }

    #[test]
    fn back_to_back_items_leave_no_gap() {
        let window = DayWindow::new(at(9, 0), at(11, 0));
        let items = vec![item(0, at(9, 0), at(10, 0)), item(1, at(10, 0), at(11, 0))];
        assert!(extract_gaps(&items, &window).is_empty());
    }

    #[test]
    fn overlapping_items_do_not_rewind_cursor() {
        let window = DayWindow::new(at(9, 0), at(13, 0));
        // Second item is nested inside the first one.
        let items = vec![
            item(0, at(9, 0), at(12, 0)),
            item(1, at(10, 0), at(10, 30)),
            item(2, at(12, 30), at(13, 0)),
        ];

        let gaps = extract_gaps(&items, &window);
        assert_eq!(gaps, vec![Gap::new(at(12, 0), at(12, 30))]);
    }

    #[test]
    fn items_past_window_end_suppress_trailing_gap() {
        let window = DayWindow::new(at(9, 0), at(10, 0));
        let items = vec![item(0, at(9, 30), at(10, 0) + Duration::minutes(30))];
        assert_eq!(
            extract_gaps(&items, &window),
            vec![Gap::new(at(9, 0), at(9, 30))]
        );
    }
}
