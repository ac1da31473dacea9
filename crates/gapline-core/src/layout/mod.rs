//! Viewport profiles and the layout engine.

mod engine;
mod profile;

pub use engine::{compute_layout, Layout, LayoutAssignment, LayoutEngine, LayoutSettings};
pub use profile::ViewportProfile;
