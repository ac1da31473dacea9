pub mod config;
pub mod current;
pub mod gaps;
pub mod layout;
pub mod profile;
pub mod watch;

use std::path::{Path, PathBuf};

use gapline_core::error::ConfigError;
use gapline_core::surface::read_items;
use gapline_core::timeline::{sort_by_start, DayWindow, ScheduleItem};
use gapline_core::{Config, MemorySurface, ScheduleDocument, ScheduleSurface};
use tracing::debug;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Config file in effect: the `--config` override or the default location.
pub fn config_path(overridden: Option<&Path>) -> Result<PathBuf, ConfigError> {
    match overridden {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::default_path(),
    }
}

pub fn load_config(overridden: Option<&Path>) -> Result<Config, ConfigError> {
    match overridden {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// A loaded schedule file, read the way a layout pass reads its surface.
pub struct LoadedSchedule {
    pub document: ScheduleDocument,
    pub window: DayWindow,
    /// Sorted by start.
    pub items: Vec<ScheduleItem>,
}

impl LoadedSchedule {
    pub fn load(path: &Path, viewport_width: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let document = ScheduleDocument::load(path)?;
        let surface = MemorySurface::new(document.clone(), viewport_width);
        let window = surface
            .window()
            .map(|raw| DayWindow::parse_lenient(&raw.start, &raw.end))
            .ok_or("schedule has no day window")?;
        let mut items = read_items(&surface);
        sort_by_start(&mut items);
        debug!(path = %path.display(), items = items.len(), "schedule loaded");
        Ok(Self {
            document,
            window,
            items,
        })
    }

    /// Document id of the item with `index`, or `#index` if it has none.
    pub fn label(&self, index: usize) -> String {
        match self.document.items.get(index) {
            Some(item) if !item.id.is_empty() => item.id.clone(),
            _ => format!("#{index}"),
        }
    }

    pub fn title(&self, index: usize) -> &str {
        self.document
            .items
            .get(index)
            .map(|item| item.title.as_str())
            .unwrap_or("")
    }
}
