//! Layout engine: compressed time axis to per-item top/height.
//!
//! ## Pass
//!
//! ```text
//! items (sorted) -> gaps -> TimeGeometry -> ideal top/height -> gap correction
//! ```
//!
//! Items are placed once, in start order. Each item's top is corrected
//! against the bottom edge of the previously placed item so that the visual
//! gap lies in `[min_gap, max_gap]` whenever the ideal gap falls outside it.
//! Heights are never reduced to resolve a collision; later items move down.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::profile::ViewportProfile;
use crate::timeline::{
    extract_gaps, sort_by_start, CompressionPolicy, DayWindow, ScheduleItem, TimeGeometry,
};

/// Fixed paddings and floors of a layout pass, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutSettings {
    pub top_padding: f64,
    pub bottom_padding: f64,
    /// Smallest time-driven height, keeps zero-length items visible.
    pub min_time_height: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            top_padding: 12.0,
            bottom_padding: 20.0,
            min_time_height: 6.0,
        }
    }
}

/// Final placement of one item in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutAssignment {
    pub item: ScheduleItem,
    /// Top offset driven purely by compressed time, before gap correction.
    pub ideal_top: f64,
    pub top: f64,
    pub height: f64,
}

impl LayoutAssignment {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Result of a full layout pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub profile: ViewportProfile,
    /// In start order.
    pub assignments: Vec<LayoutAssignment>,
    pub container_height: f64,
}

impl Layout {
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Computes layouts; stateless between passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutEngine {
    settings: LayoutSettings,
    policy: CompressionPolicy,
}

impl LayoutEngine {
    pub fn new(settings: LayoutSettings, policy: CompressionPolicy) -> Self {
        Self { settings, policy }
    }

    pub fn settings(&self) -> LayoutSettings {
        self.settings
    }

    pub fn policy(&self) -> CompressionPolicy {
        self.policy
    }

    /// Lay out `items`, which must already be sorted ascending by start.
    pub fn layout(
        &self,
        items: &[ScheduleItem],
        window: &DayWindow,
        profile: ViewportProfile,
    ) -> Layout {
        let gaps = extract_gaps(items, window);
        let geometry = TimeGeometry::new(window.start, &gaps, self.policy);
        let px = profile.px_per_minute;

        let mut container_height = self.settings.top_padding;
        let mut last_bottom: Option<f64> = None;
        let mut assignments = Vec::with_capacity(items.len());

        for item in items {
            let start_px = geometry.offset_px(item.start, px);
            let end_px = geometry.offset_px(item.end, px);

            let ideal_top = self.settings.top_padding + start_px;
            let time_height = (end_px - start_px).max(self.settings.min_time_height);
            let height = time_height
                .max(profile.min_block_height)
                .max(item.content_height);

            let top = match last_bottom {
                Some(bottom) => correct_top(ideal_top, bottom, &profile),
                None => ideal_top,
            };

            let bottom = top + height;
            last_bottom = Some(bottom);
            container_height = container_height.max(bottom + self.settings.bottom_padding);

            assignments.push(LayoutAssignment {
                item: item.clone(),
                ideal_top,
                top,
                height,
            });
        }

        debug!(
            items = assignments.len(),
            gaps = gaps.len(),
            container_height,
            px_per_minute = px,
            "layout pass complete"
        );

        Layout {
            profile,
            assignments,
            container_height,
        }
    }
}

/// Clamp an oversized gap down to `max_gap`, then push an undersized or
/// negative gap up to `min_gap`.
fn correct_top(ideal_top: f64, last_bottom: f64, profile: &ViewportProfile) -> f64 {
    let mut top = ideal_top;
    if top - last_bottom > profile.max_gap {
        top = last_bottom + profile.max_gap;
    }
    if top < last_bottom + profile.min_gap {
        top = last_bottom + profile.min_gap;
    }
    top
}

/// Lay out items in any order with default settings for `viewport_width`.
pub fn compute_layout(items: &[ScheduleItem], window: &DayWindow, viewport_width: f64) -> Layout {
    let mut sorted = items.to_vec();
    sort_by_start(&mut sorted);
    LayoutEngine::default().layout(&sorted, window, ViewportProfile::for_width(viewport_width))
}
