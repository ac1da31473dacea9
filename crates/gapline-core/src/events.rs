use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reactivity::Trigger;
use crate::timeline::ItemHandle;

/// Every observable state change of a schedule produces an Event.
/// Front-ends print or forward them; the core never stores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A full layout pass was written back to the surface.
    LayoutApplied {
        trigger: Trigger,
        item_count: usize,
        container_height: f64,
        px_per_minute: f64,
        at: DateTime<Utc>,
    },
    /// An item entered or left the "current" state.
    HighlightChanged {
        handle: ItemHandle,
        current: bool,
        at: DateTime<Utc>,
    },
    TrackerStarted {
        interval_secs: u64,
        at: DateTime<Utc>,
    },
    TrackerStopped {
        at: DateTime<Utc>,
    },
}
