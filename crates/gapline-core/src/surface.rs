//! The rendering surface a schedule is read from and written back to.
//!
//! In a browser this is the DOM: a container carrying the day window and
//! one element per item. [`MemorySurface`] is an in-process stand-in backed
//! by a [`ScheduleDocument`], used by the CLI and the tests.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::error::Result;
use crate::reactivity::Trigger;
use crate::timeline::{parse_instant_or_earliest, ItemHandle, ScheduleItem};

/// Day window bounds exactly as the container carries them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawWindow {
    pub start: String,
    pub end: String,
}

/// One item exactly as the surface carries it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawItem {
    pub handle: ItemHandle,
    pub start: String,
    pub end: String,
    /// Intrinsic content height, independent of any previous placement.
    pub content_height: f64,
}

/// Read/write access to a rendered schedule.
pub trait ScheduleSurface {
    /// Day window of the schedule container, or `None` if there is no container.
    fn window(&self) -> Option<RawWindow>;

    /// Items in surface order.
    fn items(&self) -> Vec<RawItem>;

    fn viewport_width(&self) -> f64;

    fn apply_assignment(&mut self, handle: ItemHandle, top: f64, height: f64);

    fn set_container_height(&mut self, height: f64);

    fn set_current(&mut self, handle: ItemHandle, current: bool);
}

/// Read the surface's items, applying the earliest-instant policy to
/// malformed bounds. Order is surface order.
pub fn read_items<S: ScheduleSurface + ?Sized>(surface: &S) -> Vec<ScheduleItem> {
    surface
        .items()
        .into_iter()
        .map(|raw| {
            ScheduleItem::new(
                raw.handle,
                parse_instant_or_earliest(&raw.start),
                parse_instant_or_earliest(&raw.end),
            )
            .with_content_height(raw.content_height)
        })
        .collect()
}

/// Serialized schedule: a day window plus its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDocument {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub items: Vec<DocumentItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub content_height: f64,
}

impl DocumentItem {
    pub fn new(id: impl Into<String>, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            start: start.into(),
            end: end.into(),
            content_height: 0.0,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_content_height(mut self, height: f64) -> Self {
        self.content_height = height;
        self
    }
}

impl ScheduleDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

/// Rendered state of one item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RenderedItem {
    pub top: Option<f64>,
    pub height: Option<f64>,
    pub current: bool,
}

/// In-memory surface.
///
/// With a notifier attached, external edits are reported the way browser
/// observers would report them: content size changes as
/// [`Trigger::ItemResized`], structure and text edits as
/// [`Trigger::SubtreeMutated`] and viewport changes as [`Trigger::Resize`].
/// Writes made by a layout pass are not reported.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    document: Option<ScheduleDocument>,
    rendered: Vec<RenderedItem>,
    container_height: Option<f64>,
    viewport_width: f64,
    notifier: Option<UnboundedSender<Trigger>>,
}

impl MemorySurface {
    pub fn new(document: ScheduleDocument, viewport_width: f64) -> Self {
        let rendered = vec![RenderedItem::default(); document.items.len()];
        Self {
            document: Some(document),
            rendered,
            container_height: None,
            viewport_width,
            notifier: None,
        }
    }

    /// A page with no schedule container.
    pub fn without_container(viewport_width: f64) -> Self {
        Self {
            document: None,
            rendered: Vec::new(),
            container_height: None,
            viewport_width,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: UnboundedSender<Trigger>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn rendered(&self, handle: ItemHandle) -> Option<&RenderedItem> {
        self.rendered.get(handle.0)
    }

    pub fn container_height(&self) -> Option<f64> {
        self.container_height
    }

    pub fn current_handles(&self) -> Vec<ItemHandle> {
        self.rendered
            .iter()
            .enumerate()
            .filter(|(_, r)| r.current)
            .map(|(idx, _)| ItemHandle(idx))
            .collect()
    }

    /// Handle of the item with the given document id.
    pub fn handle_of(&self, id: &str) -> Option<ItemHandle> {
        self.document
            .as_ref()?
            .items
            .iter()
            .position(|item| item.id == id)
            .map(ItemHandle)
    }

    pub fn set_viewport_width(&mut self, width: f64) {
        if width != self.viewport_width {
            self.viewport_width = width;
            self.notify(Trigger::Resize);
        }
    }

    pub fn set_content_height(&mut self, handle: ItemHandle, height: f64) {
        let Some(item) = self.item_mut(handle) else {
            return;
        };
        if item.content_height != height {
            item.content_height = height;
            self.notify(Trigger::ItemResized { handle });
        }
    }

    pub fn set_title(&mut self, handle: ItemHandle, title: impl Into<String>) {
        let Some(item) = self.item_mut(handle) else {
            return;
        };
        item.title = title.into();
        self.notify(Trigger::SubtreeMutated);
    }

    pub fn push_item(&mut self, item: DocumentItem) -> Option<ItemHandle> {
        let document = self.document.as_mut()?;
        document.items.push(item);
        self.rendered.push(RenderedItem::default());
        let handle = ItemHandle(document.items.len() - 1);
        self.notify(Trigger::SubtreeMutated);
        Some(handle)
    }

    pub fn remove_item(&mut self, handle: ItemHandle) -> Option<DocumentItem> {
        let document = self.document.as_mut()?;
        if handle.0 >= document.items.len() {
            return None;
        }
        let removed = document.items.remove(handle.0);
        self.rendered.remove(handle.0);
        self.notify(Trigger::SubtreeMutated);
        Some(removed)
    }

    /// Take the whole schedule container off the page.
    pub fn remove_container(&mut self) -> Option<ScheduleDocument> {
        let document = self.document.take()?;
        self.rendered.clear();
        self.container_height = None;
        self.notify(Trigger::SubtreeMutated);
        Some(document)
    }

    fn item_mut(&mut self, handle: ItemHandle) -> Option<&mut DocumentItem> {
        self.document.as_mut()?.items.get_mut(handle.0)
    }

    fn notify(&self, trigger: Trigger) {
        if let Some(tx) = &self.notifier {
            // A closed channel only means nobody observes the surface anymore.
            let _ = tx.send(trigger);
        }
    }
}

impl ScheduleSurface for MemorySurface {
    fn window(&self) -> Option<RawWindow> {
        self.document.as_ref().map(|doc| RawWindow {
            start: doc.start.clone(),
            end: doc.end.clone(),
        })
    }

    fn items(&self) -> Vec<RawItem> {
        let Some(document) = &self.document else {
            return Vec::new();
        };
        document
            .items
            .iter()
            .enumerate()
            .map(|(idx, item)| RawItem {
                handle: ItemHandle(idx),
                start: item.start.clone(),
                end: item.end.clone(),
                content_height: item.content_height,
            })
            .collect()
    }

    fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    fn apply_assignment(&mut self, handle: ItemHandle, top: f64, height: f64) {
        if let Some(rendered) = self.rendered.get_mut(handle.0) {
            rendered.top = Some(top);
            rendered.height = Some(height);
        }
    }

    fn set_container_height(&mut self, height: f64) {
        self.container_height = Some(height);
    }

    fn set_current(&mut self, handle: ItemHandle, current: bool) {
        if let Some(rendered) = self.rendered.get_mut(handle.0) {
            rendered.current = current;
        }
    }
}
