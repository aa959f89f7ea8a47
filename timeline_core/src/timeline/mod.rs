//! # Timeline Manager
//!
//! [`TimelineManager`] owns the ordered sequence of
//! [`TimelineEvent`]s that make up a construction schedule and keeps it
//! consistent as it is edited.
//!
//! ## Invariants
//!
//! After every public mutation:
//!
//! 1. Events are in non-decreasing day order.
//! 2. Each event starts no earlier than the previous event's day plus its
//!    minimum elapsed time. [`TimelineManager::sort`] restores this by pushing
//!    later events forward; the shift is returned as a [`Reflow`].
//! 3. Each [`SingleOccurrence`] activity is enabled in at most one event. The
//!    first one in day order is kept.
//! 4. A structural element is claimed by at most one event per activity kind.
//!    Adding or replacing an event evicts its elements from every other event.
//!
//! ## Strict mode
//!
//! Mutations that take an `adjust` flag reflow the timeline when it is `true`.
//! When it is `false` the edit is first checked with
//! [`TimelineManager::validate_event`] and rejected with a
//! [`PlacementError`] if it would overlap a neighbour. A rejected edit leaves
//! the timeline unchanged.
//!
//! ## Example
//!
//! ```rust
//! use timeline_core::event::TimelineEvent;
//! use timeline_core::ids::SegmentId;
//! use timeline_core::timeline::TimelineManager;
//!
//! let mut timeline = TimelineManager::new();
//!
//! let mut cast = TimelineEvent::new("Cast segments", 0.0);
//! cast.construct_segments_mut().add_segment(SegmentId(0));
//! cast.construct_segments_mut().set_total_curing_duration(10.0);
//! timeline.add_timeline_event(cast, true).unwrap();
//!
//! // Too early: the segments are still curing
//! let erect = TimelineEvent::new("Erect segments", 4.0);
//! assert!(timeline.add_timeline_event(erect.clone(), false).is_err());
//!
//! // In adjust mode the event is pushed to day 10 instead
//! let (index, reflow) = timeline.add_timeline_event(erect, true).unwrap();
//! assert_eq!(reflow.max_delay(), 6.0);
//! assert_eq!(timeline.start(index), Some(10.0));
//! ```

mod queries;
mod validate;

pub use validate::{TimelineErrors, TimelineIssue, ValidationReport};

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::activities::{Activity, GeometryControlKind};
use crate::errors::PlacementError;
use crate::event::{SingleOccurrence, TimelineEvent};
use crate::ids::EventId;

/// Current timeline data format version
pub const TIMELINE_FORMAT_VERSION: u32 = 2;

/// Tolerance used when comparing event days
pub const DAY_TOLERANCE: f64 = 1.0e-6;

fn legacy_format_version() -> u32 {
    1
}

// ============================================================================
// Reflow
// ============================================================================

/// An event that was pushed later by [`TimelineManager::sort`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftedEvent {
    pub event_id: Option<EventId>,
    pub description: String,
    pub from_day: f64,
    pub to_day: f64,
}

/// What a sort changed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reflow {
    /// Events moved later to respect the previous event's minimum elapsed time
    pub shifted: Vec<ShiftedEvent>,
    /// Duplicate single-occurrence activities that were switched off
    pub cleared: Vec<(Option<EventId>, SingleOccurrence)>,
}

impl Reflow {
    pub fn is_empty(&self) -> bool {
        self.shifted.is_empty() && self.cleared.is_empty()
    }

    /// Largest shift applied to any event (days)
    pub fn max_delay(&self) -> f64 {
        self.shifted
            .iter()
            .map(|s| s.to_day - s.from_day)
            .fold(0.0, f64::max)
    }
}

// ============================================================================
// Timeline Manager
// ============================================================================

/// Ordered collection of timeline events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineManager {
    events: Vec<TimelineEvent>,

    #[serde(skip)]
    next_event_id: u32,

    /// Version the timeline data was written with
    #[serde(default = "legacy_format_version")]
    format_version: u32,
}

impl Default for TimelineManager {
    fn default() -> Self {
        TimelineManager::new()
    }
}

impl TimelineManager {
    pub fn new() -> Self {
        TimelineManager {
            events: Vec::new(),
            next_event_id: 0,
            format_version: TIMELINE_FORMAT_VERSION,
        }
    }

    pub fn format_version(&self) -> u32 {
        self.format_version
    }

    /// Remove every event
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn event_by_index(&self, index: usize) -> Option<&TimelineEvent> {
        self.events.get(index)
    }

    pub fn event_by_id(&self, id: EventId) -> Option<&TimelineEvent> {
        self.events.iter().find(|e| e.id() == Some(id))
    }

    pub fn event_index(&self, id: EventId) -> Option<usize> {
        self.events.iter().position(|e| e.id() == Some(id))
    }

    /// Borrow an event for editing. The timeline is re-sorted when the
    /// returned guard is dropped.
    pub fn event_mut(&mut self, index: usize) -> Option<EventGuard<'_>> {
        if index < self.events.len() {
            Some(EventGuard { manager: self, index })
        } else {
            None
        }
    }

    /// Raw mutable access without re-sorting; for convenience setters that
    /// only change membership.
    pub(crate) fn event_slot(&mut self, index: usize) -> Option<&mut TimelineEvent> {
        self.events.get_mut(index)
    }

    pub(crate) fn events_mut(&mut self) -> impl Iterator<Item = &mut TimelineEvent> {
        self.events.iter_mut()
    }

    /// Advance the id counter past every id on the timeline
    fn sync_event_id_counter(&mut self) {
        let floor = self
            .events
            .iter()
            .filter_map(|e| e.id())
            .map(|id| id.0 + 1)
            .max()
            .unwrap_or(0);
        self.next_event_id = self.next_event_id.max(floor);
    }

    fn allocate_event_id(&mut self) -> EventId {
        self.sync_event_id_counter();

        let id = EventId(self.next_event_id);
        self.next_event_id += 1;
        id
    }

    // ------------------------------------------------------------------------
    // Add / remove / replace
    // ------------------------------------------------------------------------

    /// Add an event and return its index after sorting, along with any
    /// shifts the sort made.
    ///
    /// The event gets a fresh id unless it carries one not already in use.
    /// Elements it claims are evicted from every other event. An event on the
    /// same day as existing ones is placed after them.
    pub fn add_timeline_event(
        &mut self,
        mut event: TimelineEvent,
        adjust: bool,
    ) -> Result<(usize, Reflow), PlacementError> {
        if !adjust {
            self.validate_event(&event)?;
        }

        let needs_id = match event.id() {
            None => true,
            Some(id) => self.event_index(id).is_some(),
        };
        if needs_id {
            let id = self.allocate_event_id();
            debug!(event_id = %id, description = event.description(), "Assigned event id");
            event.set_id(Some(id));
        }

        self.evict_owners(&event, None);

        let id = event.id();
        self.events.push(event);
        let reflow = self.sort();

        let index = self
            .events
            .iter()
            .position(|e| e.id() == id)
            .ok_or(PlacementError::EventNotFound)?;
        Ok((index, reflow))
    }

    /// Remove an event. Elements it owned become unscheduled.
    pub fn remove_event_by_index(&mut self, index: usize) -> Result<TimelineEvent, PlacementError> {
        if index >= self.events.len() {
            return Err(PlacementError::EventNotFound);
        }
        let event = self.events.remove(index);
        debug!(index, description = event.description(), "Removed timeline event");
        Ok(event)
    }

    pub fn remove_event_by_id(&mut self, id: EventId) -> Result<TimelineEvent, PlacementError> {
        let index = self.event_index(id).ok_or(PlacementError::EventNotFound)?;
        self.remove_event_by_index(index)
    }

    /// Replace the event at `index`, keeping its id.
    ///
    /// The replacement is re-placed as if newly added: after any events
    /// sharing its day.
    pub fn set_event_by_index(
        &mut self,
        index: usize,
        mut event: TimelineEvent,
        adjust: bool,
    ) -> Result<Reflow, PlacementError> {
        if index >= self.events.len() {
            return Err(PlacementError::EventNotFound);
        }

        if !adjust {
            // check against the neighbours with the old event out of the way
            let old = self.events.remove(index);
            let result = self.validate_event(&event);
            self.events.insert(index, old);
            result?;
        }

        event.set_id(self.events[index].id());
        self.evict_owners(&event, Some(index));
        self.events.remove(index);
        self.events.push(event);
        Ok(self.sort())
    }

    pub fn set_event_by_id(
        &mut self,
        id: EventId,
        event: TimelineEvent,
        adjust: bool,
    ) -> Result<Reflow, PlacementError> {
        let index = self.event_index(id).ok_or(PlacementError::EventNotFound)?;
        self.set_event_by_index(index, event, adjust)
    }

    /// Move an event to a different day. Like [`Self::set_event_by_index`],
    /// the moved event lands after any events already on that day.
    pub fn adjust_day_by_index(
        &mut self,
        index: usize,
        day: f64,
        adjust: bool,
    ) -> Result<Reflow, PlacementError> {
        if index >= self.events.len() {
            return Err(PlacementError::EventNotFound);
        }

        let mut moved = self.events.remove(index);
        if !adjust {
            let mut candidate = moved.clone();
            candidate.set_day_raw(day);
            if let Err(e) = self.validate_event(&candidate) {
                self.events.insert(index, moved);
                return Err(e);
            }
        }

        moved.set_day_raw(day);
        self.events.push(moved);
        Ok(self.sort())
    }

    pub fn adjust_day_by_id(&mut self, id: EventId, day: f64, adjust: bool) -> Result<Reflow, PlacementError> {
        let index = self.event_index(id).ok_or(PlacementError::EventNotFound)?;
        self.adjust_day_by_index(index, day, adjust)
    }

    /// Stretch or compress the gap after event `index` to `elapsed` days.
    ///
    /// Every later event moves by the same amount; order is unchanged and no
    /// sort is done. Has no effect on the last event.
    pub fn set_elapsed_time(&mut self, index: usize, elapsed: f64) {
        if index + 1 >= self.events.len() {
            return;
        }

        let current = self.events[index + 1].day() - self.events[index].day();
        let delta = elapsed - current;
        for event in &mut self.events[index + 1..] {
            let day = event.day();
            event.set_day_raw(day + delta);
        }
    }

    // ------------------------------------------------------------------------
    // Sorting
    // ------------------------------------------------------------------------

    /// Sort by day, push overlapping events later and drop duplicate
    /// single-occurrence activities.
    pub fn sort(&mut self) -> Reflow {
        self.events.sort_by(|a, b| a.cmp_day(b));

        let mut reflow = Reflow::default();

        if let Some(first) = self.events.first() {
            let mut end = first.day() + first.min_elapsed_time();
            let mut running_offset = 0.0;

            for event in self.events.iter_mut().skip(1) {
                let start = event.day();

                let gap = start - end;
                if gap < 0.0 {
                    running_offset -= gap;
                }

                if running_offset > 0.0 {
                    event.set_day_raw(start + running_offset);
                    reflow.shifted.push(ShiftedEvent {
                        event_id: event.id(),
                        description: event.description().to_string(),
                        from_day: start,
                        to_day: start + running_offset,
                    });
                }

                end = start + event.min_elapsed_time();
            }
        }

        for kind in SingleOccurrence::ALL {
            let mut seen = false;
            for event in self.events.iter_mut() {
                if !event.has_occurrence(kind) {
                    continue;
                }
                if seen {
                    event.set_occurrence(kind, false);
                    reflow.cleared.push((event.id(), kind));
                } else {
                    seen = true;
                }
            }
        }

        if !reflow.shifted.is_empty() {
            info!(
                shifted = reflow.shifted.len(),
                max_delay = reflow.max_delay(),
                "Timeline reflowed to respect minimum elapsed times"
            );
        }
        for (event_id, kind) in &reflow.cleared {
            info!(
                event_id = ?event_id,
                activity = kind.label(),
                "Cleared duplicate single-occurrence activity"
            );
        }

        reflow
    }

    // ------------------------------------------------------------------------
    // Placement
    // ------------------------------------------------------------------------

    /// Check whether `candidate` fits between its neighbours without
    /// modifying the timeline.
    ///
    /// The neighbours are the ones it would have once added: events on the
    /// same day come before it.
    pub fn validate_event(&self, candidate: &TimelineEvent) -> Result<(), PlacementError> {
        if self.events.is_empty() {
            return Ok(());
        }

        let day = candidate.day();
        let (prev, next) = match self.events.iter().position(|e| day < e.day()) {
            None => (self.events.last(), None),
            Some(0) => (None, self.events.first()),
            Some(i) => (self.events.get(i - 1), self.events.get(i)),
        };

        if let Some(prev) = prev {
            if day < prev.day() + prev.min_elapsed_time() {
                return Err(PlacementError::OverlapsPreviousEvent);
            }
        }

        if let Some(next) = next {
            if next.day() < day + candidate.min_elapsed_time() {
                return Err(PlacementError::OverrunsNextEvent);
            }
        }

        Ok(())
    }

    // ------------------------------------------------------------------------
    // Ownership
    // ------------------------------------------------------------------------

    /// Remove every element claimed by `incoming` from the other events.
    fn evict_owners(&mut self, incoming: &TimelineEvent, skip: Option<usize>) {
        for (index, other) in self.events.iter_mut().enumerate() {
            if Some(index) == skip {
                continue;
            }
            let other_id = other.id();

            if incoming.construct_segments().is_enabled() {
                for &segment in incoming.construct_segments().segments() {
                    if other.construct_segments().has_segment(segment) {
                        debug!(segment = %segment, from = ?other_id, "Evicted segment construction");
                        other.construct_segments_mut().remove_segment(segment);
                    }
                }
            }

            if incoming.erect_segments().is_enabled() {
                for &segment in incoming.erect_segments().segments() {
                    if other.erect_segments().has_segment(segment) {
                        debug!(segment = %segment, from = ?other_id, "Evicted segment erection");
                        other.erect_segments_mut().remove_segment(segment);
                    }
                }
            }

            if incoming.erect_piers().is_enabled() {
                for &pier in incoming.erect_piers().piers() {
                    if other.erect_piers().has_pier(pier) {
                        debug!(pier = %pier, from = ?other_id, "Evicted pier erection");
                        other.erect_piers_mut().remove_pier(pier);
                    }
                }
                for &ts in incoming.erect_piers().temporary_supports() {
                    if other.erect_piers().has_temporary_support(ts) {
                        debug!(support = %ts, from = ?other_id, "Evicted temporary support erection");
                        other.erect_piers_mut().remove_temporary_support(ts);
                    }
                }
            }

            if incoming.remove_temporary_supports().is_enabled() {
                for &ts in incoming.remove_temporary_supports().temporary_supports() {
                    if other.remove_temporary_supports().has_temporary_support(ts) {
                        debug!(support = %ts, from = ?other_id, "Evicted temporary support removal");
                        other.remove_temporary_supports_mut().remove_temporary_support(ts);
                    }
                }
            }

            if incoming.cast_closure_joint().is_enabled() {
                for &pier in incoming.cast_closure_joint().piers() {
                    if other.cast_closure_joint().has_pier(pier) {
                        debug!(pier = %pier, from = ?other_id, "Evicted closure joint casting");
                        other.cast_closure_joint_mut().remove_pier(pier);
                    }
                }
                for &ts in incoming.cast_closure_joint().temporary_supports() {
                    if other.cast_closure_joint().has_temporary_support(ts) {
                        debug!(support = %ts, from = ?other_id, "Evicted closure joint casting");
                        other.cast_closure_joint_mut().remove_temporary_support(ts);
                    }
                }
            }

            if incoming.stress_tendon().is_enabled() {
                for key in incoming.stress_tendon().tendons() {
                    if other.stress_tendon().is_tendon_stressed(key.girder, key.duct) {
                        debug!(tendon = %key, from = ?other_id, "Evicted tendon stressing");
                        other.stress_tendon_mut().remove_tendon(key.girder, key.duct);
                    }
                }
            }

            if incoming.apply_load().is_enabled() {
                for &load in incoming.apply_load().user_loads() {
                    if other.apply_load().has_user_load(load) {
                        debug!(load = %load, from = ?other_id, "Evicted user load");
                        other.apply_load_mut().remove_user_load(load);
                    }
                }
            }

            for kind in SingleOccurrence::ALL {
                if incoming.has_occurrence(kind) && other.has_occurrence(kind) {
                    debug!(activity = kind.label(), from = ?other_id, "Evicted single-occurrence activity");
                    other.set_occurrence(kind, false);
                }
            }

            if incoming.geometry_control().is_primary() && other.geometry_control().is_primary() {
                debug!(from = ?other_id, "Demoted geometry control primary event");
                other
                    .geometry_control_mut()
                    .set_kind(GeometryControlKind::SecondaryEvent);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Load-time normalization
    // ------------------------------------------------------------------------

    /// Repair a timeline that was just deserialized. Returns a note for each
    /// repair made.
    pub(crate) fn normalize_loaded(&mut self) -> Vec<String> {
        let mut repairs = Vec::new();

        // ids: keep declared ones, fill in the missing and duplicated
        let mut seen = std::collections::BTreeSet::new();
        for index in 0..self.events.len() {
            let duplicate = match self.events[index].id() {
                Some(id) => !seen.insert(id),
                None => true,
            };
            if duplicate {
                self.events[index].set_id(None);
            }
        }
        for index in 0..self.events.len() {
            if self.events[index].id().is_none() {
                let id = self.allocate_event_id();
                debug!(event_id = %id, index, "Assigned id to loaded event");
                self.events[index].set_id(Some(id));
            }
        }
        self.sync_event_id_counter();

        if self.format_version < TIMELINE_FORMAT_VERSION {
            if let Some(note) = self.repair_reversed_live_load() {
                repairs.push(note);
            }
        }

        let duplicates = self.remove_duplicate_tendon_stressing();
        if duplicates > 0 {
            repairs.push(format!(
                "Removed {} duplicate tendon stressing assignment(s)",
                duplicates
            ));
        }

        for note in &repairs {
            info!(repair = note.as_str(), "Normalized loaded timeline");
        }

        self.format_version = TIMELINE_FORMAT_VERSION;
        repairs
    }

    /// Older files could end with the live load on the second-to-last event
    /// and the final loading event without it.
    fn repair_reversed_live_load(&mut self) -> Option<String> {
        let n = self.events.len();
        if n < 2 {
            return None;
        }

        let prev = &self.events[n - 2];
        let last = &self.events[n - 1];
        if !(prev.apply_load().is_live_load_applied()
            && last.apply_load().is_enabled()
            && !last.apply_load().is_live_load_applied())
        {
            return None;
        }

        let rating = prev.apply_load().is_rating_live_load_applied();

        let prev = &mut self.events[n - 2];
        prev.apply_load_mut().apply_live_load(false);
        if rating {
            prev.apply_load_mut().apply_rating_live_load(false);
        }

        let last = &mut self.events[n - 1];
        last.apply_load_mut().apply_live_load(true);
        if rating {
            last.apply_load_mut().apply_rating_live_load(true);
        }

        Some("Moved live load onto the final event".to_string())
    }

    /// Keep each tendon in the first event that stresses it
    fn remove_duplicate_tendon_stressing(&mut self) -> usize {
        let mut seen = std::collections::BTreeSet::new();
        let mut removed = 0;
        for event in self.events.iter_mut() {
            let keys: Vec<_> = event.stress_tendon().tendons().iter().copied().collect();
            for key in keys {
                if !seen.insert(key) {
                    event.stress_tendon_mut().remove_tendon(key.girder, key.duct);
                    removed += 1;
                }
            }
        }
        removed
    }
}

// ============================================================================
// Event Guard
// ============================================================================

/// Mutable borrow of one event that re-sorts the timeline when dropped
pub struct EventGuard<'a> {
    manager: &'a mut TimelineManager,
    index: usize,
}

impl Deref for EventGuard<'_> {
    type Target = TimelineEvent;

    fn deref(&self) -> &TimelineEvent {
        &self.manager.events[self.index]
    }
}

impl DerefMut for EventGuard<'_> {
    fn deref_mut(&mut self) -> &mut TimelineEvent {
        &mut self.manager.events[self.index]
    }
}

impl Drop for EventGuard<'_> {
    fn drop(&mut self) {
        self.manager.sort();
    }
}
