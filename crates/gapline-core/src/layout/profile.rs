//! Viewport-dependent layout constants.

use serde::{Deserialize, Serialize};

/// Layout constants for one viewport width.
///
/// Narrow viewports get a denser vertical scale and taller minimum blocks so
/// that wrapped text stays legible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportProfile {
    pub px_per_minute: f64,
    pub min_block_height: f64,
    pub min_gap: f64,
    pub max_gap: f64,
}

impl ViewportProfile {
    /// Step function of the viewport width in CSS pixels.
    pub fn for_width(width: f64) -> Self {
        let px_per_minute = if width >= 1600.0 {
            1.0
        } else if width >= 1200.0 {
            1.15
        } else if width >= 900.0 {
            1.25
        } else if width >= 520.0 {
            1.6
        } else {
            2.2
        };

        let min_block_height = if width < 520.0 {
            64.0
        } else if width < 900.0 {
            56.0
        } else {
            48.0
        };

        let min_gap = if width < 520.0 { 12.0 } else { 10.0 };

        let max_gap = if width >= 1400.0 {
            16.0
        } else if width >= 900.0 {
            14.0
        } else {
            12.0
        };

        Self {
            px_per_minute,
            min_block_height,
            min_gap,
            max_gap,
        }
    }
}
