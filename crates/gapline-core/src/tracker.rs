//! "Happening now" highlighting.
//!
//! The tracker compares the present instant against each item's half-open
//! interval, but only on the schedule's own calendar day as seen from a
//! fixed reference timezone. Like the layout engine it has no thread of its
//! own: the owner calls [`CurrentItemTracker::tick`], or hands it to
//! [`start_tracker`] to have a tokio task do so periodically.
//!
//! ## Usage
//!
//! ```ignore
//! let handle = start_tracker(&runtime, tracker, surface, Arc::clone(&clock), period, None);
//! // Re-initialization:
//! handle.stop(clock.now());
//! let handle = start_tracker(&runtime, tracker, surface, Arc::clone(&clock), period, None);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::ConversionError;
use crate::events::Event;
use crate::surface::ScheduleSurface;
use crate::timeline::{ItemHandle, ScheduleItem};

/// Default reference zone of the schedule.
pub const DEFAULT_REFERENCE_ZONE: &str = "Australia/Perth";

/// Default period between tracker ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(30);

/// Source of the present instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *lock(&self.now) = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *lock(&self.now)
    }
}

/// Civil timezone in which "today" is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceZone {
    Named(Tz),
    /// The system's local zone; used when a named zone cannot be resolved.
    Local,
}

impl ReferenceZone {
    /// Resolve an IANA zone name such as `Australia/Perth`.
    pub fn resolve(name: &str) -> Result<Self, ConversionError> {
        name.trim()
            .parse::<Tz>()
            .map(Self::Named)
            .map_err(|_| ConversionError::UnknownZone {
                name: name.to_string(),
            })
    }

    /// Resolve `name`, falling back to the local zone.
    pub fn resolve_or_local(name: &str) -> Self {
        Self::resolve(name).unwrap_or_else(|err| {
            warn!(%err, "reference timezone unavailable, using local time");
            Self::Local
        })
    }

    pub fn name(&self) -> String {
        match self {
            Self::Named(tz) => tz.name().to_string(),
            Self::Local => "local".to_string(),
        }
    }

    /// Calendar date of `instant` in this zone, or `None` when the shifted
    /// civil time falls outside chrono's range (the earliest-instant
    /// placeholder near a negative offset, for example).
    pub fn date_of(&self, instant: DateTime<Utc>) -> Option<NaiveDate> {
        if instant == DateTime::<Utc>::MIN_UTC || instant == DateTime::<Utc>::MAX_UTC {
            return None;
        }
        let utc = instant.naive_utc();
        let offset = match self {
            Self::Named(tz) => tz.offset_from_utc_datetime(&utc).fix(),
            Self::Local => Local.offset_from_utc_datetime(&utc).fix(),
        };
        utc.checked_add_signed(ChronoDuration::seconds(i64::from(offset.local_minus_utc())))
            .map(|civil| civil.date())
    }

    /// Interpret a civil time in this zone.
    pub fn to_instant(&self, civil: NaiveDateTime) -> Result<DateTime<Utc>, ConversionError> {
        let resolved = match self {
            Self::Named(tz) => tz
                .from_local_datetime(&civil)
                .single()
                .map(|dt| dt.with_timezone(&Utc)),
            Self::Local => Local
                .from_local_datetime(&civil)
                .single()
                .map(|dt| dt.with_timezone(&Utc)),
        };
        resolved.ok_or_else(|| ConversionError::AmbiguousLocalTime {
            zone: self.name(),
            time: civil.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct TrackedRow {
    handle: ItemHandle,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TrackedRow {
    fn keyed(&self) -> (ItemHandle, (DateTime<Utc>, DateTime<Utc>)) {
        (self.handle, (self.start, self.end))
    }
}

/// Decides which items are current and remembers the last decision.
#[derive(Debug, Clone)]
pub struct CurrentItemTracker {
    zone_name: String,
    day_start: DateTime<Utc>,
    rows: Vec<TrackedRow>,
    current: HashSet<ItemHandle>,
}

impl CurrentItemTracker {
    pub fn new<'a>(
        zone_name: impl Into<String>,
        day_start: DateTime<Utc>,
        items: impl IntoIterator<Item = &'a ScheduleItem>,
    ) -> Self {
        let mut tracker = Self {
            zone_name: zone_name.into(),
            day_start,
            rows: Vec::new(),
            current: HashSet::new(),
        };
        tracker.rebind(day_start, items);
        tracker
    }

    /// Tracker with no rows, for owners that bind items later.
    pub fn empty(zone_name: impl Into<String>) -> Self {
        Self {
            zone_name: zone_name.into(),
            day_start: DateTime::<Utc>::MIN_UTC,
            rows: Vec::new(),
            current: HashSet::new(),
        }
    }

    /// Point the tracker at a fresh item list.
    ///
    /// Handles are positional, so a remembered highlight only survives if
    /// the same handle still carries the same interval.
    pub fn rebind<'a>(
        &mut self,
        day_start: DateTime<Utc>,
        items: impl IntoIterator<Item = &'a ScheduleItem>,
    ) {
        let previous: HashMap<_, _> = self.rows.iter().map(TrackedRow::keyed).collect();
        self.day_start = day_start;
        self.rows = items
            .into_iter()
            .map(|item| TrackedRow {
                handle: item.handle,
                start: item.start,
                end: item.end,
            })
            .collect();
        let live: HashMap<_, _> = self.rows.iter().map(TrackedRow::keyed).collect();
        self.current
            .retain(|h| live.get(h).is_some_and(|span| previous.get(h) == Some(span)));
    }

    /// Handles marked current by the last tick.
    pub fn current_handles(&self) -> Vec<ItemHandle> {
        let mut handles: Vec<_> = self.current.iter().copied().collect();
        handles.sort();
        handles
    }

    /// Current flag of every row at `now`, in row order.
    pub fn evaluate(&self, now: DateTime<Utc>) -> Vec<(ItemHandle, bool)> {
        let zone = ReferenceZone::resolve_or_local(&self.zone_name);
        self.evaluate_in(zone, now)
    }

    /// Same as [`evaluate`](Self::evaluate) with an already resolved zone.
    pub fn evaluate_in(&self, zone: ReferenceZone, now: DateTime<Utc>) -> Vec<(ItemHandle, bool)> {
        let same_day = match (zone.date_of(now), zone.date_of(self.day_start)) {
            (Some(today), Some(day)) => today == day,
            _ => false,
        };
        self.rows
            .iter()
            .map(|row| {
                let active = same_day && row.start <= now && now < row.end;
                (row.handle, active)
            })
            .collect()
    }

    /// Write the current flag of every row to `surface` and report the
    /// rows whose flag changed since the previous tick.
    pub fn tick<S>(&mut self, now: DateTime<Utc>, surface: &mut S) -> Vec<Event>
    where
        S: ScheduleSurface + ?Sized,
    {
        let flags = self.evaluate(now);
        let mut events = Vec::new();

        for (handle, active) in flags {
            surface.set_current(handle, active);
            let changed = if active {
                self.current.insert(handle)
            } else {
                self.current.remove(&handle)
            };
            if changed {
                events.push(Event::HighlightChanged {
                    handle,
                    current: active,
                    at: now,
                });
            }
        }

        debug!(
            rows = self.rows.len(),
            current = self.current.len(),
            changed = events.len(),
            "tracker tick"
        );
        events
    }
}

/// Owner of a running tracker timer.
///
/// At most one of these should exist per schedule; stop it before
/// starting a replacement. Dropping the handle also stops the timer.
#[derive(Debug)]
pub struct TrackerHandle {
    task: Option<JoinHandle<()>>,
    interval: Duration,
}

impl TrackerHandle {
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel the timer. `at` stamps the returned event.
    pub fn stop(mut self, at: DateTime<Utc>) -> Event {
        self.cancel();
        info!("tracker stopped");
        Event::TrackerStopped { at }
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TrackerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Spawn a task on `runtime` that ticks `tracker` every `period`.
///
/// The first periodic tick happens one `period` from now; owners that need
/// an immediate result tick once themselves before starting the timer.
pub fn start_tracker<S>(
    runtime: &Handle,
    tracker: Arc<Mutex<CurrentItemTracker>>,
    surface: Arc<Mutex<S>>,
    clock: Arc<dyn Clock>,
    period: Duration,
    events: Option<UnboundedSender<Event>>,
) -> TrackerHandle
where
    S: ScheduleSurface + Send + 'static,
{
    let period = period.max(Duration::from_millis(1));
    let task = runtime.spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let now = clock.now();
            let changes = {
                let mut tracker = lock(&tracker);
                let mut surface = lock(&surface);
                tracker.tick(now, &mut *surface)
            };
            if let Some(tx) = &events {
                for event in changes {
                    // Nobody listening is fine.
                    let _ = tx.send(event);
                }
            }
        }
    });

    info!(interval_secs = period.as_secs(), "tracker started");
    TrackerHandle {
        task: Some(task),
        interval: period,
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DocumentItem, MemorySurface, ScheduleDocument};

    fn perth(h: u32, m: u32) -> DateTime<Utc> {
        // Perth is UTC+8 without DST.
        Utc.with_ymd_and_hms(2025, 11, 15, h, m, 0).unwrap() - ChronoDuration::hours(8)
    }

    fn items() -> Vec<ScheduleItem> {
        vec![
            ScheduleItem::new(ItemHandle(0), perth(9, 0), perth(10, 0)),
            ScheduleItem::new(ItemHandle(1), perth(10, 0), perth(11, 0)),
        ]
    }

    fn surface() -> MemorySurface {
        let doc = ScheduleDocument {
            start: "2025-11-15T08:00:00+08:00".into(),
            end: "2025-11-15T18:00:00+08:00".into(),
            items: vec![
                DocumentItem::new("a", "2025-11-15T09:00:00+08:00", "2025-11-15T10:00:00+08:00"),
                DocumentItem::new("b", "2025-11-15T10:00:00+08:00", "2025-11-15T11:00:00+08:00"),
            ],
        };
        MemorySurface::new(doc, 1920.0)
    }

    #[test]
    fn resolves_named_zone() {
        let zone = ReferenceZone::resolve("Australia/Perth").unwrap();
        assert_eq!(zone.name(), "Australia/Perth");
        assert!(ReferenceZone::resolve("Mars/Olympus").is_err());
        assert_eq!(ReferenceZone::resolve_or_local("Mars/Olympus"), ReferenceZone::Local);
    }

    #[test]
    fn date_is_taken_in_reference_zone() {
        let zone = ReferenceZone::resolve("Australia/Perth").unwrap();
        // 17:30 UTC on the 14th is already the 15th in Perth.
        let instant = Utc.with_ymd_and_hms(2025, 11, 14, 17, 30, 0).unwrap();
        assert_eq!(zone.date_of(instant), NaiveDate::from_ymd_opt(2025, 11, 15));
    }

    #[test]
    fn civil_time_to_instant() {
        let zone = ReferenceZone::resolve("Australia/Perth").unwrap();
        let civil = NaiveDate::from_ymd_opt(2025, 11, 15)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(zone.to_instant(civil).unwrap(), perth(9, 0));
    }

    #[test]
    fn skipped_civil_time_is_an_error() {
        let zone = ReferenceZone::resolve("Europe/Berlin").unwrap();
        // Clocks jump from 02:00 to 03:00 on 2025-03-30.
        let civil = NaiveDate::from_ymd_opt(2025, 3, 30)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert!(matches!(
            zone.to_instant(civil),
            Err(ConversionError::AmbiguousLocalTime { .. })
        ));
    }

    #[test]
    fn interval_is_half_open() {
        let items = items();
        let tracker = CurrentItemTracker::new(DEFAULT_REFERENCE_ZONE, perth(8, 0), &items);

        let at_start = tracker.evaluate(perth(9, 0));
        assert_eq!(at_start, vec![(ItemHandle(0), true), (ItemHandle(1), false)]);

        // The boundary belongs to the second item only.
        let at_boundary = tracker.evaluate(perth(10, 0));
        assert_eq!(at_boundary, vec![(ItemHandle(0), false), (ItemHandle(1), true)]);

        let at_end = tracker.evaluate(perth(11, 0));
        assert!(at_end.iter().all(|(_, current)| !current));
    }

    #[test]
    fn other_day_marks_nothing_current() {
        let items = vec![ScheduleItem::new(
            ItemHandle(0),
            perth(9, 0),
            perth(9, 0) + ChronoDuration::days(2),
        )];
        let tracker = CurrentItemTracker::new(DEFAULT_REFERENCE_ZONE, perth(8, 0), &items);
        let next_day = perth(12, 0) + ChronoDuration::days(1);
        assert_eq!(tracker.evaluate(next_day), vec![(ItemHandle(0), false)]);
    }

    #[test]
    fn unknown_zone_falls_back_without_failing() {
        let items = items();
        let tracker = CurrentItemTracker::new("Not/AZone", perth(8, 0), &items);
        // Evaluation still yields one flag per row.
        assert_eq!(tracker.evaluate(perth(9, 30)).len(), 2);
    }

    #[test]
    fn tick_writes_flags_and_reports_changes() {
        let items = items();
        let mut surface = surface();
        let mut tracker = CurrentItemTracker::new(DEFAULT_REFERENCE_ZONE, perth(8, 0), &items);

        let events = tracker.tick(perth(9, 30), &mut surface);
        assert_eq!(events.len(), 1);
        assert_eq!(surface.current_handles(), vec![ItemHandle(0)]);

        // Nothing changes within the same item.
        assert!(tracker.tick(perth(9, 45), &mut surface).is_empty());

        let events = tracker.tick(perth(10, 15), &mut surface);
        assert_eq!(events.len(), 2);
        assert_eq!(surface.current_handles(), vec![ItemHandle(1)]);
        assert_eq!(tracker.current_handles(), vec![ItemHandle(1)]);
    }

    #[test]
    fn rebind_keeps_state_of_surviving_handles() {
        let items = items();
        let mut surface = surface();
        let mut tracker = CurrentItemTracker::new(DEFAULT_REFERENCE_ZONE, perth(8, 0), &items);
        tracker.tick(perth(9, 30), &mut surface);

        tracker.rebind(perth(8, 0), &items);
        assert!(tracker.tick(perth(9, 31), &mut surface).is_empty());

        tracker.rebind(perth(8, 0), &items[1..]);
        assert!(tracker.current_handles().is_empty());
    }

    #[test]
    fn rebind_forgets_highlight_when_handle_moves_to_another_item() {
        let items = items();
        let mut surface = surface();
        let mut tracker = CurrentItemTracker::new(DEFAULT_REFERENCE_ZONE, perth(8, 0), &items);
        tracker.tick(perth(9, 30), &mut surface);
        assert_eq!(tracker.current_handles(), vec![ItemHandle(0)]);

        // The first item is removed; the second one now sits at handle 0.
        let shifted = vec![ScheduleItem::new(ItemHandle(0), perth(10, 0), perth(11, 0))];
        tracker.rebind(perth(8, 0), &shifted);
        assert!(tracker.current_handles().is_empty());

        let events = tracker.tick(perth(10, 15), &mut surface);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Event::HighlightChanged { handle: ItemHandle(0), current: true, .. }
        ));
    }

    #[test]
    fn earliest_instant_has_no_date_in_any_zone() {
        for name in ["America/New_York", "Australia/Perth", "UTC"] {
            let zone = ReferenceZone::resolve(name).unwrap();
            assert_eq!(zone.date_of(DateTime::<Utc>::MIN_UTC), None);
        }
        assert_eq!(ReferenceZone::Local.date_of(DateTime::<Utc>::MIN_UTC), None);
    }

    #[test]
    fn unparsed_day_start_marks_nothing_current_west_of_utc() {
        let items = items();
        let tracker = CurrentItemTracker::new("America/New_York", DateTime::<Utc>::MIN_UTC, &items);
        let flags = tracker.evaluate(perth(9, 30));
        assert_eq!(flags, vec![(ItemHandle(0), false), (ItemHandle(1), false)]);

        let empty = CurrentItemTracker::empty("America/Los_Angeles");
        assert!(empty.evaluate(Utc::now()).is_empty());
    }

    #[tokio::test]
    async fn stopped_handle_aborts_task() {
        let tracker = Arc::new(Mutex::new(CurrentItemTracker::empty(DEFAULT_REFERENCE_ZONE)));
        let surface = Arc::new(Mutex::new(surface()));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let handle = start_tracker(
            &Handle::current(),
            tracker,
            surface,
            clock,
            Duration::from_secs(30),
            None,
        );
        assert!(handle.is_running());
        assert_eq!(handle.interval(), Duration::from_secs(30));
        let at = perth(9, 0);
        assert_eq!(handle.stop(at), Event::TrackerStopped { at });
    }
}
