//! # User-Defined Loads
//!
//! [`LoadManager`] stores the point, distributed and moment loads a user adds
//! to the bridge. Every load belongs to exactly one timeline event: the
//! manager registers its id with that event's `ApplyLoad` activity, so the
//! timeline is the record of *when* each load is applied.
//!
//! Load ids come from one counter shared by all three kinds and are unique
//! across them.
//!
//! # Example
//!
//! ```
//! use timeline_core::event::TimelineEvent;
//! use timeline_core::loads::{LoadManager, PointLoad, SpanKey, UserLoadCase};
//! use timeline_core::timeline::TimelineManager;
//!
//! let mut timeline = TimelineManager::new();
//! timeline.add_timeline_event(TimelineEvent::new("Utilities", 60.0), true).unwrap();
//! let event = timeline.events()[0].id().unwrap();
//!
//! let mut loads = LoadManager::new();
//! let load = PointLoad::new(SpanKey::ALL, UserLoadCase::DW, 0.5, -12.0);
//! let index = loads.add_point_load(&mut timeline, event, load).unwrap();
//!
//! let id = loads.point_load(index).unwrap().id;
//! assert_eq!(timeline.find_user_load_event_id(id), Some(event));
//! ```

pub mod user_loads;

pub use user_loads::{
    DistributedLoad, DistributedLoadKind, MomentLoad, PointLoad, SpanKey, UserLoad, UserLoadCase,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{TimelineError, TimelineResult};
use crate::ids::{EventId, LoadId};
use crate::timeline::TimelineManager;

/// Outcome of an `update_*_load` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadUpdate {
    /// False when neither the load nor its event changed
    pub changed: bool,
    /// Previous span / girder selection, when the load moved
    pub moved_from: Option<SpanKey>,
}

/// Owner of every user-defined load
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadManager {
    #[serde(default)]
    point_loads: Vec<PointLoad>,
    #[serde(default)]
    distributed_loads: Vec<DistributedLoad>,
    #[serde(default)]
    moment_loads: Vec<MomentLoad>,
    #[serde(skip)]
    next_load_id: u32,
}

/// Two managers are equal when they hold the same loads
impl PartialEq for LoadManager {
    fn eq(&self, other: &Self) -> bool {
        self.point_loads == other.point_loads
            && self.distributed_loads == other.distributed_loads
            && self.moment_loads == other.moment_loads
    }
}

// ============================================================================
// Generic list operations
// ============================================================================

fn add_load<T: UserLoad>(
    list: &mut Vec<T>,
    next_id: &mut u32,
    timeline: &mut TimelineManager,
    event: EventId,
    mut load: T,
) -> TimelineResult<usize> {
    let event_index = timeline.event_index(event).ok_or(TimelineError::event_not_found(event))?;

    let id = LoadId(*next_id);
    *next_id += 1;
    load.set_id(id);

    timeline.set_user_load_event_by_index(id, Some(event_index))?;
    list.push(load);
    debug!(load = %id, event = %event, kind = T::KIND, "Added user load");
    Ok(list.len() - 1)
}

fn update_load<T: UserLoad>(
    list: &mut [T],
    timeline: &mut TimelineManager,
    index: usize,
    event: EventId,
    mut load: T,
) -> TimelineResult<LoadUpdate> {
    let existing = list
        .get(index)
        .ok_or_else(|| TimelineError::load_index_not_found(T::KIND, index))?;
    let event_index = timeline.event_index(event).ok_or(TimelineError::event_not_found(event))?;

    let id = existing.id();
    load.set_id(id);
    let old_event = timeline.find_user_load_event_id(id);
    if *existing == load && old_event == Some(event) {
        return Ok(LoadUpdate::default());
    }

    let moved_from = (existing.span_key() != load.span_key()).then(|| existing.span_key());

    timeline.set_user_load_event_by_index(id, Some(event_index))?;
    list[index] = load;
    debug!(load = %id, event = %event, "Updated user load");
    Ok(LoadUpdate {
        changed: true,
        moved_from,
    })
}

fn delete_load<T: UserLoad>(
    list: &mut Vec<T>,
    timeline: &mut TimelineManager,
    index: usize,
) -> TimelineResult<SpanKey> {
    if index >= list.len() {
        return Err(TimelineError::load_index_not_found(T::KIND, index));
    }
    let load = list.remove(index);
    if timeline.find_user_load_event_index(load.id()).is_none() {
        warn!(load = %load.id(), "Deleted user load was not applied in any event");
    }
    timeline.set_user_load_event_by_index(load.id(), None)?;
    Ok(load.span_key())
}

/// Drop the loads matching `is_bad`, returning their summaries
fn drop_loads<T: UserLoad>(list: &mut Vec<T>, is_bad: &impl Fn(LoadId) -> bool) -> Vec<String> {
    let mut dropped = Vec::new();
    list.retain(|load| {
        if is_bad(load.id()) {
            warn!(load = %load.id(), kind = T::KIND, "Dropping user load with no owning event");
            dropped.push(load.summary());
            false
        } else {
            true
        }
    });
    dropped
}

impl LoadManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every load. Timeline registrations are left as they are.
    pub fn clear(&mut self) {
        self.point_loads.clear();
        self.distributed_loads.clear();
        self.moment_loads.clear();
    }

    pub fn user_load_count(&self) -> usize {
        self.point_loads.len() + self.distributed_loads.len() + self.moment_loads.len()
    }

    /// Id and span / girder target of every load
    pub fn load_targets(&self) -> impl Iterator<Item = (LoadId, SpanKey)> + '_ {
        let point = self.point_loads.iter().map(|l| (l.id, l.span_key));
        let distributed = self.distributed_loads.iter().map(|l| (l.id, l.span_key));
        let moment = self.moment_loads.iter().map(|l| (l.id, l.span_key));
        point.chain(distributed).chain(moment)
    }

    /// True when any load of `load_case` applies to girder `girder`
    pub fn has_user_load(&self, girder: usize, load_case: UserLoadCase) -> bool {
        let matches = |key: SpanKey, case: UserLoadCase| case == load_case && key.includes_girder(girder);
        self.point_loads.iter().any(|l| matches(l.span_key, l.load_case))
            || self.distributed_loads.iter().any(|l| matches(l.span_key, l.load_case))
            || self.moment_loads.iter().any(|l| matches(l.span_key, l.load_case))
    }

    /// Advance the id counter past every stored id. Used after loading.
    pub(crate) fn sync_load_id_counter(&mut self) {
        self.next_load_id = self
            .load_targets()
            .map(|(id, _)| id.0 + 1)
            .max()
            .unwrap_or(0)
            .max(self.next_load_id);
    }

    // ------------------------------------------------------------------------
    // Point loads
    // ------------------------------------------------------------------------

    pub fn point_loads(&self) -> &[PointLoad] {
        &self.point_loads
    }

    pub fn point_load_count(&self) -> usize {
        self.point_loads.len()
    }

    pub fn point_load(&self, index: usize) -> Option<&PointLoad> {
        self.point_loads.get(index)
    }

    pub fn find_point_load(&self, id: LoadId) -> Option<&PointLoad> {
        self.point_loads.iter().find(|l| l.id == id)
    }

    /// Add a point load applied in `event`. Returns its index.
    pub fn add_point_load(
        &mut self,
        timeline: &mut TimelineManager,
        event: EventId,
        load: PointLoad,
    ) -> TimelineResult<usize> {
        add_load(&mut self.point_loads, &mut self.next_load_id, timeline, event, load)
    }

    pub fn update_point_load(
        &mut self,
        timeline: &mut TimelineManager,
        index: usize,
        event: EventId,
        load: PointLoad,
    ) -> TimelineResult<LoadUpdate> {
        update_load(&mut self.point_loads, timeline, index, event, load)
    }

    /// Delete a point load, returning the span / girder it was applied to
    pub fn delete_point_load(&mut self, timeline: &mut TimelineManager, index: usize) -> TimelineResult<SpanKey> {
        delete_load(&mut self.point_loads, timeline, index)
    }

    // ------------------------------------------------------------------------
    // Distributed loads
    // ------------------------------------------------------------------------

    pub fn distributed_loads(&self) -> &[DistributedLoad] {
        &self.distributed_loads
    }

    pub fn distributed_load_count(&self) -> usize {
        self.distributed_loads.len()
    }

    pub fn distributed_load(&self, index: usize) -> Option<&DistributedLoad> {
        self.distributed_loads.get(index)
    }

    pub fn find_distributed_load(&self, id: LoadId) -> Option<&DistributedLoad> {
        self.distributed_loads.iter().find(|l| l.id == id)
    }

    pub fn add_distributed_load(
        &mut self,
        timeline: &mut TimelineManager,
        event: EventId,
        load: DistributedLoad,
    ) -> TimelineResult<usize> {
        add_load(&mut self.distributed_loads, &mut self.next_load_id, timeline, event, load)
    }

    pub fn update_distributed_load(
        &mut self,
        timeline: &mut TimelineManager,
        index: usize,
        event: EventId,
        load: DistributedLoad,
    ) -> TimelineResult<LoadUpdate> {
        update_load(&mut self.distributed_loads, timeline, index, event, load)
    }

    pub fn delete_distributed_load(&mut self, timeline: &mut TimelineManager, index: usize) -> TimelineResult<SpanKey> {
        delete_load(&mut self.distributed_loads, timeline, index)
    }

    // ------------------------------------------------------------------------
    // Moment loads
    // ------------------------------------------------------------------------

    pub fn moment_loads(&self) -> &[MomentLoad] {
        &self.moment_loads
    }

    pub fn moment_load_count(&self) -> usize {
        self.moment_loads.len()
    }

    pub fn moment_load(&self, index: usize) -> Option<&MomentLoad> {
        self.moment_loads.get(index)
    }

    pub fn find_moment_load(&self, id: LoadId) -> Option<&MomentLoad> {
        self.moment_loads.iter().find(|l| l.id == id)
    }

    pub fn add_moment_load(
        &mut self,
        timeline: &mut TimelineManager,
        event: EventId,
        load: MomentLoad,
    ) -> TimelineResult<usize> {
        add_load(&mut self.moment_loads, &mut self.next_load_id, timeline, event, load)
    }

    pub fn update_moment_load(
        &mut self,
        timeline: &mut TimelineManager,
        index: usize,
        event: EventId,
        load: MomentLoad,
    ) -> TimelineResult<LoadUpdate> {
        update_load(&mut self.moment_loads, timeline, index, event, load)
    }

    pub fn delete_moment_load(&mut self, timeline: &mut TimelineManager, index: usize) -> TimelineResult<SpanKey> {
        delete_load(&mut self.moment_loads, timeline, index)
    }

    // ------------------------------------------------------------------------
    // Repair
    // ------------------------------------------------------------------------

    /// Delete every load that no timeline event applies.
    ///
    /// Returns a report listing the deleted loads, or `None` when every load
    /// is accounted for.
    pub fn fix_bad_loads(&mut self, timeline: &TimelineManager) -> Option<String> {
        let is_bad = |id: LoadId| timeline.find_user_load_event_index(id).is_none();

        let mut dropped = drop_loads(&mut self.point_loads, &is_bad);
        dropped.extend(drop_loads(&mut self.distributed_loads, &is_bad));
        dropped.extend(drop_loads(&mut self.moment_loads, &is_bad));

        if dropped.is_empty() {
            return None;
        }

        let mut report = String::from("The following loads could no longer be modeled and have been deleted:");
        for line in &dropped {
            report.push('\n');
            report.push_str(line);
        }
        Some(report)
    }
}
