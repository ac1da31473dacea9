//! Re-layout on surface changes.
//!
//! The controller owns the subscription side of a schedule: every trigger
//! runs a complete layout pass (read, extract gaps, lay out, write back)
//! and then re-arms the current-item tracker. Passes are synchronous and
//! never debounced; the engine is linear in the item count.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::events::Event;
use crate::layout::{Layout, LayoutEngine, ViewportProfile};
use crate::storage::Config;
use crate::surface::{read_items, ScheduleSurface};
use crate::timeline::{sort_by_start, DayWindow, ItemHandle};
use crate::tracker::{lock, start_tracker, Clock, CurrentItemTracker, TrackerHandle};

/// Something that invalidates the current layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// Initial page load.
    Load,
    /// The viewport changed size.
    Resize,
    /// An item's rendered size changed.
    ItemResized { handle: ItemHandle },
    /// The container's children or text changed.
    SubtreeMutated,
}

/// Drives layout passes and the tracker timer for one schedule.
pub struct ReactivityController<S> {
    surface: Arc<Mutex<S>>,
    engine: LayoutEngine,
    tracker: Arc<Mutex<CurrentItemTracker>>,
    tick_interval: Duration,
    clock: Arc<dyn Clock>,
    runtime: Option<Handle>,
    timer: Option<TrackerHandle>,
    events: Option<UnboundedSender<Event>>,
}

impl<S> ReactivityController<S>
where
    S: ScheduleSurface + Send + 'static,
{
    /// Attach to a surface. Returns `None` if the surface has no schedule
    /// container, in which case there is nothing to manage.
    ///
    /// No pass runs yet; feed [`Trigger::Load`] to lay out for the first time.
    pub fn init(surface: Arc<Mutex<S>>, config: &Config, clock: Arc<dyn Clock>) -> Option<Self> {
        if lock(&surface).window().is_none() {
            debug!("no schedule container, nothing to lay out");
            return None;
        }

        Some(Self {
            surface,
            engine: config.layout_engine(),
            tracker: Arc::new(Mutex::new(CurrentItemTracker::empty(
                config.tracker.reference_timezone.clone(),
            ))),
            tick_interval: config.tick_interval(),
            clock,
            runtime: None,
            timer: None,
            events: None,
        })
    }

    /// Run the tracker timer on `runtime`. Without a runtime the owner
    /// drives the tracker through [`tick_now`](Self::tick_now).
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Forward every produced event to `events`.
    pub fn with_event_sink(mut self, events: UnboundedSender<Event>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn surface(&self) -> &Arc<Mutex<S>> {
        &self.surface
    }

    pub fn tracker_running(&self) -> bool {
        self.timer.as_ref().is_some_and(TrackerHandle::is_running)
    }

    /// Re-run the full layout pass for `trigger`.
    ///
    /// Returns `None` if the container has disappeared since `init`; the
    /// tracker timer is stopped in that case.
    pub fn on_trigger(&mut self, trigger: Trigger) -> Option<Layout> {
        debug!(?trigger, "layout triggered");

        let (layout, window) = {
            let mut surface = lock(&self.surface);
            let Some(raw) = surface.window() else {
                drop(surface);
                debug!("schedule container gone");
                self.stop();
                return None;
            };
            let window = DayWindow::parse_lenient(&raw.start, &raw.end);

            let mut items = read_items(&*surface);
            sort_by_start(&mut items);

            let profile = ViewportProfile::for_width(surface.viewport_width());
            let layout = self.engine.layout(&items, &window, profile);

            for assignment in &layout.assignments {
                surface.apply_assignment(assignment.item.handle, assignment.top, assignment.height);
            }
            surface.set_container_height(layout.container_height);
            (layout, window)
        };

        self.emit(Event::LayoutApplied {
            trigger,
            item_count: layout.assignments.len(),
            container_height: layout.container_height,
            px_per_minute: layout.profile.px_per_minute,
            at: self.clock.now(),
        });

        self.restart_tracker(window.start, &layout);
        Some(layout)
    }

    /// Tick the tracker once against the controller's clock.
    pub fn tick_now(&self) -> Vec<Event> {
        let now = self.clock.now();
        let events = {
            let mut tracker = lock(&self.tracker);
            let mut surface = lock(&self.surface);
            tracker.tick(now, &mut *surface)
        };
        for event in &events {
            self.emit(event.clone());
        }
        events
    }

    /// Handle triggers until every sender is dropped, then stop the tracker.
    pub async fn run(mut self, mut triggers: UnboundedReceiver<Trigger>) {
        while let Some(trigger) = triggers.recv().await {
            self.on_trigger(trigger);
        }
        self.stop();
    }

    /// Cancel the tracker timer, if one is running.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            let event = timer.stop(self.clock.now());
            self.emit(event);
        }
    }

    fn restart_tracker(&mut self, day_start: DateTime<Utc>, layout: &Layout) {
        // Never stack timers.
        self.stop();

        lock(&self.tracker).rebind(day_start, layout.assignments.iter().map(|a| &a.item));
        self.tick_now();

        if let Some(runtime) = &self.runtime {
            let handle = start_tracker(
                runtime,
                Arc::clone(&self.tracker),
                Arc::clone(&self.surface),
                Arc::clone(&self.clock),
                self.tick_interval,
                self.events.clone(),
            );
            self.emit(Event::TrackerStarted {
                interval_secs: handle.interval().as_secs(),
                at: self.clock.now(),
            });
            self.timer = Some(handle);
        }
    }

    fn emit(&self, event: Event) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}
