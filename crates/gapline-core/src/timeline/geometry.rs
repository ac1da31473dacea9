//! Wall-clock time to compressed vertical offset.
//!
//! Busy time maps 1:1 to minutes of vertical space. Time spent inside an
//! idle gap is run through a [`CompressionPolicy`]: the first `threshold`
//! minutes of a gap count fully, the remainder counts at `factor` weight.
//!
//! ```text
//! real:        |--item--|..........gap (105 min)..........|--item--|
//! compressed:  |--item--|...45...|.60 x 0.35.|            |--item--|
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::gap::Gap;
use super::item::minutes_between;

/// Default number of gap minutes that are rendered at full scale.
pub const COMPRESS_THRESHOLD_MIN: f64 = 45.0;

/// Default weight of gap minutes beyond the threshold.
pub const COMPRESS_FACTOR: f64 = 0.35;

/// How idle minutes are converted to visual minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressionPolicy {
    pub threshold_min: f64,
    pub factor: f64,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self {
            threshold_min: COMPRESS_THRESHOLD_MIN,
            factor: COMPRESS_FACTOR,
        }
    }
}

impl CompressionPolicy {
    pub fn new(threshold_min: f64, factor: f64) -> Self {
        Self {
            threshold_min,
            factor,
        }
    }

    /// Visual minutes contributed by `minutes` of idle time.
    ///
    /// Identity up to the threshold; never exceeds `minutes` for factors in `[0, 1]`.
    pub fn compress(&self, minutes: f64) -> f64 {
        if minutes <= self.threshold_min {
            minutes
        } else {
            self.threshold_min + (minutes - self.threshold_min) * self.factor
        }
    }
}

/// Compressed time axis for one day, closed over that day's gaps.
#[derive(Debug, Clone)]
pub struct TimeGeometry<'a> {
    day_start: DateTime<Utc>,
    gaps: &'a [Gap],
    policy: CompressionPolicy,
}

impl<'a> TimeGeometry<'a> {
    /// `gaps` must be ordered by start and non-overlapping.
    pub fn new(day_start: DateTime<Utc>, gaps: &'a [Gap], policy: CompressionPolicy) -> Self {
        Self {
            day_start,
            gaps,
            policy,
        }
    }

    /// Compressed minutes elapsed from the day start to `instant`.
    ///
    /// Instants at or before the day start map to zero. An instant inside a
    /// gap only picks up the covered part of that gap.
    pub fn compressed_offset(&self, instant: DateTime<Utc>) -> f64 {
        if instant <= self.day_start {
            return 0.0;
        }

        let mut minutes = 0.0;
        let mut pos = self.day_start;

        for gap in self.gaps {
            // Busy stretch before this gap.
            let seg_end = instant.min(gap.start);
            if seg_end > pos {
                minutes += minutes_between(pos, seg_end);
                pos = seg_end;
            }
            if instant <= gap.start {
                break;
            }

            let covered_start = pos.max(gap.start);
            let covered_end = instant.min(gap.end);
            if covered_end > covered_start {
                minutes += self
                    .policy
                    .compress(minutes_between(covered_start, covered_end));
                pos = covered_end;
            }
            if instant <= gap.end {
                break;
            }
        }

        if instant > pos {
            minutes += minutes_between(pos, instant);
        }

        minutes
    }

    /// Pixel offset of `instant` at the given scale.
    pub fn offset_px(&self, instant: DateTime<Utc>, px_per_minute: f64) -> f64 {
        self.compressed_offset(instant) * px_per_minute
    }

    /// Pixel distance between two instants on the compressed axis.
    pub fn span_px(&self, from: DateTime<Utc>, to: DateTime<Utc>, px_per_minute: f64) -> f64 {
        self.offset_px(to, px_per_minute) - self.offset_px(from, px_per_minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 15, h, m, 0).unwrap()
    }

    #[test]
    fn compress_is_identity_below_threshold() {
        let policy = CompressionPolicy::default();
        assert_eq!(policy.compress(0.0), 0.0);
        assert_eq!(policy.compress(30.0), 30.0);
        assert_eq!(policy.compress(45.0), 45.0);
    }

    #[test]
    fn compress_weights_minutes_past_threshold() {
        let policy = CompressionPolicy::default();
        assert!((policy.compress(105.0) - 66.0).abs() < 1e-9);
        assert!((policy.compress(60.0) - 50.25).abs() < 1e-9);
        assert!(policy.compress(46.0) < 46.0);
    }

    #[test]
    fn no_gaps_is_real_time() {
        let geometry = TimeGeometry::new(at(8, 0), &[], CompressionPolicy::default());
        assert_eq!(geometry.compressed_offset(at(9, 30)), 90.0);
        assert_eq!(geometry.offset_px(at(9, 30), 2.0), 180.0);
    }

    #[test]
    fn before_day_start_clamps_to_zero() {
        let geometry = TimeGeometry::new(at(8, 0), &[], CompressionPolicy::default());
        assert_eq!(geometry.compressed_offset(at(7, 0)), 0.0);
        assert_eq!(geometry.compressed_offset(DateTime::<Utc>::MIN_UTC), 0.0);
    }

    #[test]
    fn whole_gap_is_compressed() {
        // Busy 8:00-9:00, idle 9:00-10:45, busy afterwards.
        let gaps = [Gap::new(at(9, 0), at(10, 45))];
        let geometry = TimeGeometry::new(at(8, 0), &gaps, CompressionPolicy::default());

        assert_eq!(geometry.compressed_offset(at(9, 0)), 60.0);
        assert!((geometry.compressed_offset(at(10, 45)) - 126.0).abs() < 1e-9);
        assert!((geometry.compressed_offset(at(11, 0)) - 141.0).abs() < 1e-9);
    }

    #[test]
    fn instant_inside_gap_counts_partial_coverage() {
        let gaps = [Gap::new(at(9, 0), at(12, 0))];
        let geometry = TimeGeometry::new(at(8, 0), &gaps, CompressionPolicy::default());

        // 30 minutes into the gap: still under threshold.
        assert_eq!(geometry.compressed_offset(at(9, 30)), 90.0);
        // 65 minutes in: 45 + 20 * 0.35.
        let offset = geometry.compressed_offset(at(9, 0) + Duration::minutes(65));
        assert!((offset - (60.0 + 45.0 + 7.0)).abs() < 1e-9);
    }

    #[test]
    fn span_px_of_busy_interval_is_real_length() {
        let gaps = [Gap::new(at(8, 0), at(9, 0))];
        let geometry = TimeGeometry::new(at(8, 0), &gaps, CompressionPolicy::default());
        assert!((geometry.span_px(at(9, 0), at(9, 30), 1.25) - 37.5).abs() < 1e-9);
    }
}
