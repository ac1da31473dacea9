//! # Gapline Core Library
//!
//! This library lays out a vertical, clock-time schedule in which long idle
//! stretches between events are visually shortened while busy periods keep
//! proportional spacing.
//!
//! ## Architecture
//!
//! - **Timeline**: Items, the day window, idle gap extraction and the
//!   gap-compressing time axis
//! - **Layout**: Viewport profiles and the single-pass layout engine that
//!   turns the time axis into per-item top/height with bounded gaps
//! - **Tracker**: "Happening now" highlighting in a fixed reference timezone
//! - **Reactivity**: Re-runs the layout whenever the rendering surface
//!   reports a change, and owns the tracker timer
//!
//! ## Key Components
//!
//! - [`compute_layout`]: Pure layout of an item list for a viewport width
//! - [`LayoutEngine`]: Configurable layout engine
//! - [`ReactivityController`]: Trigger-driven re-layout over a [`ScheduleSurface`]
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod layout;
pub mod reactivity;
pub mod storage;
pub mod surface;
pub mod timeline;
pub mod tracker;

pub use error::{ConfigError, ConversionError, CoreError, ParseError};
pub use events::Event;
pub use layout::{compute_layout, Layout, LayoutAssignment, LayoutEngine, LayoutSettings, ViewportProfile};
pub use reactivity::{ReactivityController, Trigger};
pub use storage::Config;
pub use surface::{DocumentItem, MemorySurface, ScheduleDocument, ScheduleSurface};
pub use timeline::{extract_gaps, CompressionPolicy, DayWindow, Gap, ItemHandle, ScheduleItem, TimeGeometry};
pub use tracker::{start_tracker, Clock, CurrentItemTracker, ReferenceZone, SystemClock, TrackerHandle};
