//! Timeline model and compressed time axis.
//!
//! This module provides:
//! - Schedule item and day window types
//! - Idle gap extraction between items
//! - The gap-compressing time geometry used by the layout engine

mod gap;
mod geometry;
mod item;

pub use gap::{extract_gaps, Gap, GapExtractor};
pub use geometry::{CompressionPolicy, TimeGeometry, COMPRESS_FACTOR, COMPRESS_THRESHOLD_MIN};
pub use item::{
    parse_instant_or_earliest, sort_by_start, try_parse_instant, DayWindow, ItemHandle,
    ScheduleItem,
};
