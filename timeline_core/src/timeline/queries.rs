//! Lookups, predicates and per-element convenience setters
//!
//! Every lookup is a linear scan; timelines hold tens of events. An activity
//! only counts while it is enabled.
//!
//! The `set_*_event_by_index` setters move one element to a target event (or
//! unschedule it with `None`). They change membership only and do not
//! re-sort, except the deck and longitudinal joint setters which change the
//! target event's curing duration and so go through
//! [`TimelineManager::set_event_by_index`].

use tracing::{debug, warn};

use super::{Reflow, TimelineManager, DAY_TOLERANCE};
use crate::activities::{Activity, GeometryControlKind};
use crate::bridge::{BridgeDescription, SupportRef};
use crate::errors::{PlacementError, TimelineError, TimelineResult};
use crate::event::{SingleOccurrence, TimelineEvent};
use crate::ids::{ClosureId, DuctIndex, EventId, GirderId, LoadId, PierId, SegmentId, SupportId};

impl TimelineManager {
    // ========================================================================
    // Timing
    // ========================================================================

    /// Day the event starts
    pub fn start(&self, index: usize) -> Option<f64> {
        self.event_by_index(index).map(|e| e.day())
    }

    /// Day the event ends: the start of the next event, or its own start for
    /// the last event
    pub fn end(&self, index: usize) -> Option<f64> {
        self.event_by_index(index)?;
        self.event_by_index(index + 1)
            .or_else(|| self.event_by_index(index))
            .map(|e| e.day())
    }

    /// Days until the next event starts (0 for the last event)
    pub fn duration(&self, index: usize) -> Option<f64> {
        Some(self.end(index)? - self.start(index)?)
    }

    /// True when an event starts on `day`
    pub fn has_event(&self, day: f64) -> bool {
        self.events().iter().any(|e| (e.day() - day).abs() < DAY_TOLERANCE)
    }

    /// First event with an exactly matching description
    pub fn find_event(&self, description: &str) -> Option<(usize, &TimelineEvent)> {
        self.events()
            .iter()
            .enumerate()
            .find(|(_, e)| e.description() == description)
    }

    fn position_where(&self, pred: impl Fn(&TimelineEvent) -> bool) -> Option<usize> {
        self.events().iter().position(pred)
    }

    fn id_where(&self, pred: impl Fn(&TimelineEvent) -> bool) -> Option<EventId> {
        self.events().iter().find(|e| pred(e)).and_then(|e| e.id())
    }

    fn checked_target(&self, target: Option<usize>) -> TimelineResult<Option<usize>> {
        match target {
            Some(index) if index >= self.event_count() => Err(TimelineError::EventIndexOutOfRange {
                index,
                count: self.event_count(),
            }),
            other => Ok(other),
        }
    }

    fn resolve_target(&self, target: Option<EventId>) -> TimelineResult<Option<usize>> {
        target
            .map(|id| self.event_index(id).ok_or(TimelineError::event_not_found(id)))
            .transpose()
    }

    // ========================================================================
    // Single-occurrence activities
    // ========================================================================

    pub fn occurrence_event_index(&self, kind: SingleOccurrence) -> Option<usize> {
        self.position_where(|e| e.has_occurrence(kind))
    }

    pub fn occurrence_event_id(&self, kind: SingleOccurrence) -> Option<EventId> {
        self.id_where(|e| e.has_occurrence(kind))
    }

    /// Move a single-occurrence activity to `target`, or remove it with `None`
    pub fn set_occurrence_event_by_index(
        &mut self,
        kind: SingleOccurrence,
        target: Option<usize>,
    ) -> TimelineResult<()> {
        let target = self.checked_target(target)?;
        for event in self.events_mut() {
            event.set_occurrence(kind, false);
        }
        if let Some(index) = target {
            if let Some(event) = self.event_slot(index) {
                event.set_occurrence(kind, true);
            }
        }
        debug!(activity = kind.label(), target = ?target, "Moved single-occurrence activity");
        Ok(())
    }

    pub fn set_occurrence_event_by_id(
        &mut self,
        kind: SingleOccurrence,
        target: Option<EventId>,
    ) -> TimelineResult<()> {
        let index = self.resolve_target(target)?;
        self.set_occurrence_event_by_index(kind, index)
    }

    pub fn is_deck_cast(&self) -> bool {
        self.occurrence_event_index(SingleOccurrence::CastDeck).is_some()
    }

    pub fn cast_deck_event_index(&self) -> Option<usize> {
        self.occurrence_event_index(SingleOccurrence::CastDeck)
    }

    pub fn cast_deck_event_id(&self) -> Option<EventId> {
        self.occurrence_event_id(SingleOccurrence::CastDeck)
    }

    pub fn is_longitudinal_joint_cast(&self) -> bool {
        self.occurrence_event_index(SingleOccurrence::CastLongitudinalJoint).is_some()
    }

    pub fn cast_longitudinal_joint_event_index(&self) -> Option<usize> {
        self.occurrence_event_index(SingleOccurrence::CastLongitudinalJoint)
    }

    pub fn cast_longitudinal_joint_event_id(&self) -> Option<EventId> {
        self.occurrence_event_id(SingleOccurrence::CastLongitudinalJoint)
    }

    pub fn is_railing_system_installed(&self) -> bool {
        self.occurrence_event_index(SingleOccurrence::RailingSystem).is_some()
    }

    pub fn railing_system_load_event_index(&self) -> Option<usize> {
        self.occurrence_event_index(SingleOccurrence::RailingSystem)
    }

    pub fn railing_system_load_event_id(&self) -> Option<EventId> {
        self.occurrence_event_id(SingleOccurrence::RailingSystem)
    }

    pub fn set_railing_system_load_event_by_index(&mut self, target: Option<usize>) -> TimelineResult<()> {
        self.set_occurrence_event_by_index(SingleOccurrence::RailingSystem, target)
    }

    pub fn is_overlay_installed(&self) -> bool {
        self.occurrence_event_index(SingleOccurrence::Overlay).is_some()
    }

    pub fn overlay_load_event_index(&self) -> Option<usize> {
        self.occurrence_event_index(SingleOccurrence::Overlay)
    }

    pub fn overlay_load_event_id(&self) -> Option<EventId> {
        self.occurrence_event_id(SingleOccurrence::Overlay)
    }

    pub fn set_overlay_load_event_by_index(&mut self, target: Option<usize>) -> TimelineResult<()> {
        self.set_occurrence_event_by_index(SingleOccurrence::Overlay, target)
    }

    pub fn is_live_load_applied(&self) -> bool {
        self.occurrence_event_index(SingleOccurrence::LiveLoad).is_some()
    }

    pub fn live_load_event_index(&self) -> Option<usize> {
        self.occurrence_event_index(SingleOccurrence::LiveLoad)
    }

    pub fn live_load_event_id(&self) -> Option<EventId> {
        self.occurrence_event_id(SingleOccurrence::LiveLoad)
    }

    pub fn set_live_load_event_by_index(&mut self, target: Option<usize>) -> TimelineResult<()> {
        self.set_occurrence_event_by_index(SingleOccurrence::LiveLoad, target)
    }

    pub fn load_rating_event_index(&self) -> Option<usize> {
        self.occurrence_event_index(SingleOccurrence::RatingLiveLoad)
    }

    pub fn load_rating_event_id(&self) -> Option<EventId> {
        self.occurrence_event_id(SingleOccurrence::RatingLiveLoad)
    }

    pub fn set_load_rating_event_by_index(&mut self, target: Option<usize>) -> TimelineResult<()> {
        self.set_occurrence_event_by_index(SingleOccurrence::RatingLiveLoad, target)
    }

    pub fn intermediate_diaphragm_load_event_index(&self) -> Option<usize> {
        self.occurrence_event_index(SingleOccurrence::IntermediateDiaphragm)
    }

    pub fn intermediate_diaphragm_load_event_id(&self) -> Option<EventId> {
        self.occurrence_event_id(SingleOccurrence::IntermediateDiaphragm)
    }

    pub fn set_intermediate_diaphragm_load_event_by_index(&mut self, target: Option<usize>) -> TimelineResult<()> {
        self.set_occurrence_event_by_index(SingleOccurrence::IntermediateDiaphragm, target)
    }

    /// Move deck casting to `target`, keeping its curing duration.
    ///
    /// If the target event cannot take the longer curing time in strict mode
    /// the previous deck casting event is restored.
    pub fn set_cast_deck_event_by_index(
        &mut self,
        target: Option<usize>,
        adjust: bool,
    ) -> Result<Reflow, PlacementError> {
        self.move_curing_occurrence(SingleOccurrence::CastDeck, target, adjust)
    }

    pub fn set_cast_deck_event_by_id(&mut self, target: EventId, adjust: bool) -> Result<Reflow, PlacementError> {
        let index = self.event_index(target).ok_or(PlacementError::EventNotFound)?;
        self.set_cast_deck_event_by_index(Some(index), adjust)
    }

    /// Move longitudinal joint casting to `target`, keeping its curing duration
    pub fn set_cast_longitudinal_joint_event_by_index(
        &mut self,
        target: Option<usize>,
        adjust: bool,
    ) -> Result<Reflow, PlacementError> {
        self.move_curing_occurrence(SingleOccurrence::CastLongitudinalJoint, target, adjust)
    }

    pub fn set_cast_longitudinal_joint_event_by_id(
        &mut self,
        target: EventId,
        adjust: bool,
    ) -> Result<Reflow, PlacementError> {
        let index = self.event_index(target).ok_or(PlacementError::EventNotFound)?;
        self.set_cast_longitudinal_joint_event_by_index(Some(index), adjust)
    }

    fn move_curing_occurrence(
        &mut self,
        kind: SingleOccurrence,
        target: Option<usize>,
        adjust: bool,
    ) -> Result<Reflow, PlacementError> {
        if let Some(index) = target {
            if index >= self.event_count() {
                return Err(PlacementError::EventNotFound);
            }
        }

        let curing_of = |event: &TimelineEvent| match kind {
            SingleOccurrence::CastDeck => event.cast_deck().total_curing_duration(),
            _ => event.cast_longitudinal_joint().total_curing_duration(),
        };

        let old_index = self.occurrence_event_index(kind);
        let old_id = old_index.and_then(|i| self.event_by_index(i)).and_then(|e| e.id());
        let curing = old_index.and_then(|i| self.event_by_index(i)).map(curing_of);

        if let Some(index) = old_index {
            if let Some(event) = self.event_slot(index) {
                event.set_occurrence(kind, false);
            }
        }

        let Some(index) = target else {
            return Ok(Reflow::default());
        };

        let Some(mut updated) = self.event_by_index(index).cloned() else {
            return Err(PlacementError::EventNotFound);
        };
        updated.set_occurrence(kind, true);
        if let Some(days) = curing {
            match kind {
                SingleOccurrence::CastDeck => updated.cast_deck_mut().set_total_curing_duration(days),
                _ => updated.cast_longitudinal_joint_mut().set_total_curing_duration(days),
            }
        }

        let result = self.set_event_by_index(index, updated, adjust);
        if result.is_err() {
            // roll back
            if let Some(index) = old_id.and_then(|id| self.event_index(id)) {
                if let Some(event) = self.event_slot(index) {
                    event.set_occurrence(kind, true);
                }
            }
        }
        result
    }

    /// Take the overlay off the timeline.
    ///
    /// Refused when the bridge has an overlay wearing surface, since the
    /// overlay must then be installed at some point.
    pub fn remove_overlay_load_event(&mut self, bridge: &BridgeDescription) -> Result<(), super::TimelineErrors> {
        if self.overlay_load_event_index().is_none() {
            return Ok(());
        }
        if bridge.has_overlay() {
            return Err(super::TimelineErrors::OVERLAY_ACTIVITY_REQUIRED);
        }
        for event in self.events_mut() {
            event.set_occurrence(SingleOccurrence::Overlay, false);
        }
        Ok(())
    }

    // ========================================================================
    // Piers and temporary supports
    // ========================================================================

    pub fn is_pier_erected(&self, pier: PierId) -> bool {
        self.pier_erection_event_index(pier).is_some()
    }

    pub fn pier_erection_event_index(&self, pier: PierId) -> Option<usize> {
        self.position_where(|e| e.erect_piers().is_enabled() && e.erect_piers().has_pier(pier))
    }

    pub fn pier_erection_event_id(&self, pier: PierId) -> Option<EventId> {
        self.id_where(|e| e.erect_piers().is_enabled() && e.erect_piers().has_pier(pier))
    }

    pub fn set_pier_erection_event_by_index(&mut self, pier: PierId, target: Option<usize>) -> TimelineResult<()> {
        let target = self.checked_target(target)?;
        for event in self.events_mut() {
            event.erect_piers_mut().remove_pier(pier);
        }
        if let Some(event) = target.and_then(|i| self.event_slot(i)) {
            event.erect_piers_mut().add_pier(pier);
        }
        Ok(())
    }

    pub fn set_pier_erection_event_by_id(&mut self, pier: PierId, target: Option<EventId>) -> TimelineResult<()> {
        let index = self.resolve_target(target)?;
        self.set_pier_erection_event_by_index(pier, index)
    }

    pub fn is_temporary_support_erected(&self, ts: SupportId) -> bool {
        self.temporary_support_events(ts).0.is_some()
    }

    pub fn is_temporary_support_removed(&self, ts: SupportId) -> bool {
        self.temporary_support_events(ts).1.is_some()
    }

    /// Indices of the events that erect and remove a temporary support
    pub fn temporary_support_events(&self, ts: SupportId) -> (Option<usize>, Option<usize>) {
        let erect = self.position_where(|e| e.erect_piers().is_enabled() && e.erect_piers().has_temporary_support(ts));
        let remove = self.position_where(|e| {
            e.remove_temporary_supports().is_enabled() && e.remove_temporary_supports().has_temporary_support(ts)
        });
        (erect, remove)
    }

    /// Schedule the erection and removal of a temporary support together
    pub fn set_temporary_support_events(
        &mut self,
        ts: SupportId,
        erect: Option<usize>,
        remove: Option<usize>,
    ) -> TimelineResult<()> {
        let erect = self.checked_target(erect)?;
        let remove = self.checked_target(remove)?;

        for event in self.events_mut() {
            event.erect_piers_mut().remove_temporary_support(ts);
            event.remove_temporary_supports_mut().remove_temporary_support(ts);
        }
        if let Some(event) = erect.and_then(|i| self.event_slot(i)) {
            event.erect_piers_mut().add_temporary_support(ts);
        }
        if let Some(event) = remove.and_then(|i| self.event_slot(i)) {
            event.remove_temporary_supports_mut().add_temporary_support(ts);
        }
        Ok(())
    }

    pub fn is_closure_joint_at_pier(&self, pier: PierId) -> bool {
        self.events()
            .iter()
            .any(|e| e.cast_closure_joint().is_enabled() && e.cast_closure_joint().has_pier(pier))
    }

    pub fn is_closure_joint_at_temporary_support(&self, ts: SupportId) -> bool {
        self.events()
            .iter()
            .any(|e| e.cast_closure_joint().is_enabled() && e.cast_closure_joint().has_temporary_support(ts))
    }

    // ========================================================================
    // Segments
    // ========================================================================

    pub fn is_segment_constructed(&self, segment: SegmentId) -> bool {
        self.segment_construction_event_index(segment).is_some()
    }

    pub fn segment_construction_event_index(&self, segment: SegmentId) -> Option<usize> {
        self.position_where(|e| e.construct_segments().is_enabled() && e.construct_segments().has_segment(segment))
    }

    pub fn segment_construction_event_id(&self, segment: SegmentId) -> Option<EventId> {
        self.id_where(|e| e.construct_segments().is_enabled() && e.construct_segments().has_segment(segment))
    }

    /// Move segment construction to `target`, carrying the curing and
    /// relaxation times from the event that used to build it.
    pub fn set_segment_construction_event_by_index(
        &mut self,
        segment: SegmentId,
        target: Option<usize>,
    ) -> TimelineResult<()> {
        let target = self.checked_target(target)?;

        let current = self
            .events()
            .iter()
            .position(|e| e.construct_segments().has_segment(segment));
        if current.is_some() && current == target {
            return Ok(());
        }

        let mut timing = None;
        if let Some(event) = current.and_then(|i| self.event_slot(i)) {
            let construct = event.construct_segments_mut();
            timing = Some((construct.total_curing_duration(), construct.relaxation_time()));
            construct.remove_segment(segment);
        }

        if let Some(event) = target.and_then(|i| self.event_slot(i)) {
            let construct = event.construct_segments_mut();
            construct.add_segment(segment);
            if let Some((curing, relaxation)) = timing {
                construct.set_total_curing_duration(curing);
                construct.set_relaxation_time(relaxation);
            }
        }
        Ok(())
    }

    pub fn set_segment_construction_event_by_id(
        &mut self,
        segment: SegmentId,
        target: Option<EventId>,
    ) -> TimelineResult<()> {
        let index = self.resolve_target(target)?;
        self.set_segment_construction_event_by_index(segment, index)
    }

    pub fn is_segment_erected(&self, segment: SegmentId) -> bool {
        self.segment_erection_event_index(segment).is_some()
    }

    /// True when the segment is erected in or before event `index`
    pub fn is_segment_erected_by(&self, segment: SegmentId, index: usize) -> bool {
        self.segment_erection_event_index(segment)
            .is_some_and(|erected| erected <= index)
    }

    pub fn segment_erection_event_index(&self, segment: SegmentId) -> Option<usize> {
        self.position_where(|e| e.erect_segments().is_enabled() && e.erect_segments().has_segment(segment))
    }

    pub fn segment_erection_event_id(&self, segment: SegmentId) -> Option<EventId> {
        self.id_where(|e| e.erect_segments().is_enabled() && e.erect_segments().has_segment(segment))
    }

    pub fn set_segment_erection_event_by_index(
        &mut self,
        segment: SegmentId,
        target: Option<usize>,
    ) -> TimelineResult<()> {
        let target = self.checked_target(target)?;
        for event in self.events_mut() {
            event.erect_segments_mut().remove_segment(segment);
        }
        if let Some(event) = target.and_then(|i| self.event_slot(i)) {
            event.erect_segments_mut().add_segment(segment);
        }
        Ok(())
    }

    pub fn set_segment_erection_event_by_id(
        &mut self,
        segment: SegmentId,
        target: Option<EventId>,
    ) -> TimelineResult<()> {
        let index = self.resolve_target(target)?;
        self.set_segment_erection_event_by_index(segment, index)
    }

    fn erects_segments(event: &TimelineEvent) -> bool {
        event.erect_segments().is_enabled() && !event.erect_segments().segments().is_empty()
    }

    pub fn first_segment_erection_event_index(&self) -> Option<usize> {
        self.position_where(Self::erects_segments)
    }

    pub fn first_segment_erection_event_id(&self) -> Option<EventId> {
        self.id_where(Self::erects_segments)
    }

    pub fn last_segment_erection_event_index(&self) -> Option<usize> {
        self.events().iter().rposition(Self::erects_segments)
    }

    pub fn last_segment_erection_event_id(&self) -> Option<EventId> {
        self.events()
            .iter()
            .rev()
            .find(|e| Self::erects_segments(e))
            .and_then(|e| e.id())
    }

    // ========================================================================
    // Closure joints
    // ========================================================================

    fn casts_at(event: &TimelineEvent, support: SupportRef) -> bool {
        let cast = event.cast_closure_joint();
        cast.is_enabled()
            && match support {
                SupportRef::Pier(pier) => cast.has_pier(pier),
                SupportRef::TemporarySupport(ts) => cast.has_temporary_support(ts),
            }
    }

    pub fn cast_closure_joint_event_index(&self, bridge: &BridgeDescription, closure: ClosureId) -> Option<usize> {
        let support = bridge.find_closure(closure)?.support;
        self.position_where(|e| Self::casts_at(e, support))
    }

    pub fn cast_closure_joint_event_id(&self, bridge: &BridgeDescription, closure: ClosureId) -> Option<EventId> {
        let support = bridge.find_closure(closure)?.support;
        self.id_where(|e| Self::casts_at(e, support))
    }

    pub fn is_closure_joint_cast(&self, bridge: &BridgeDescription, closure: ClosureId) -> bool {
        self.cast_closure_joint_event_index(bridge, closure).is_some()
    }

    /// True when the closure joint is cast in or before event `index`
    pub fn is_closure_joint_cast_by(&self, bridge: &BridgeDescription, closure: ClosureId, index: usize) -> bool {
        self.cast_closure_joint_event_index(bridge, closure)
            .is_some_and(|cast| cast <= index)
    }

    /// Move casting of a closure joint to `target`, carrying its curing
    /// duration. The closure is located through the support it sits on.
    pub fn set_cast_closure_joint_event_by_index(
        &mut self,
        bridge: &BridgeDescription,
        closure: ClosureId,
        target: Option<usize>,
    ) -> TimelineResult<()> {
        let target = self.checked_target(target)?;
        let Some(joint) = bridge.find_closure(closure) else {
            warn!(closure = %closure, "Closure joint is not in the bridge");
            return Err(TimelineError::invalid_input(
                "closure",
                closure.to_string(),
                "Closure joint is not in the bridge",
            ));
        };
        let support = joint.support;

        let mut curing = None;
        for event in self.events_mut() {
            let cast = event.cast_closure_joint_mut();
            let owned = match support {
                SupportRef::Pier(pier) => cast.has_pier(pier),
                SupportRef::TemporarySupport(ts) => cast.has_temporary_support(ts),
            };
            if owned {
                curing = Some(cast.total_curing_duration());
                match support {
                    SupportRef::Pier(pier) => cast.remove_pier(pier),
                    SupportRef::TemporarySupport(ts) => cast.remove_temporary_support(ts),
                }
            }
        }

        if let Some(event) = target.and_then(|i| self.event_slot(i)) {
            let cast = event.cast_closure_joint_mut();
            match support {
                SupportRef::Pier(pier) => cast.add_pier(pier),
                SupportRef::TemporarySupport(ts) => cast.add_temporary_support(ts),
            }
            if let Some(days) = curing {
                cast.set_total_curing_duration(days);
            }
        }
        Ok(())
    }

    pub fn set_cast_closure_joint_event_by_id(
        &mut self,
        bridge: &BridgeDescription,
        closure: ClosureId,
        target: Option<EventId>,
    ) -> TimelineResult<()> {
        let index = self.resolve_target(target)?;
        self.set_cast_closure_joint_event_by_index(bridge, closure, index)
    }

    // ========================================================================
    // Tendons
    // ========================================================================

    pub fn is_tendon_stressed(&self, girder: GirderId, duct: DuctIndex) -> bool {
        self.stress_tendon_event_index(girder, duct).is_some()
    }

    /// True when event `index` stresses any tendon
    pub fn is_tendon_stressed_by_index(&self, index: usize) -> bool {
        self.event_by_index(index)
            .is_some_and(|e| e.stress_tendon().is_enabled() && !e.stress_tendon().tendons().is_empty())
    }

    pub fn stress_tendon_event_index(&self, girder: GirderId, duct: DuctIndex) -> Option<usize> {
        self.position_where(|e| e.stress_tendon().is_enabled() && e.stress_tendon().is_tendon_stressed(girder, duct))
    }

    pub fn stress_tendon_event_id(&self, girder: GirderId, duct: DuctIndex) -> Option<EventId> {
        self.id_where(|e| e.stress_tendon().is_enabled() && e.stress_tendon().is_tendon_stressed(girder, duct))
    }

    pub fn set_stress_tendon_event_by_index(
        &mut self,
        girder: GirderId,
        duct: DuctIndex,
        target: Option<usize>,
    ) -> TimelineResult<()> {
        let target = self.checked_target(target)?;
        for event in self.events_mut() {
            event.stress_tendon_mut().remove_tendon(girder, duct);
        }
        if let Some(event) = target.and_then(|i| self.event_slot(i)) {
            event.stress_tendon_mut().add_tendon(girder, duct);
        }
        Ok(())
    }

    pub fn set_stress_tendon_event_by_id(
        &mut self,
        girder: GirderId,
        duct: DuctIndex,
        target: Option<EventId>,
    ) -> TimelineResult<()> {
        let index = self.resolve_target(target)?;
        self.set_stress_tendon_event_by_index(girder, duct, index)
    }

    // ========================================================================
    // Geometry control and user loads
    // ========================================================================

    /// Indices of every event marked as the primary geometry control event
    pub fn geometry_control_primary_event_indices(&self) -> Vec<usize> {
        self.events()
            .iter()
            .enumerate()
            .filter(|(_, e)| e.geometry_control().is_primary())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn geometry_control_primary_event_id(&self) -> Option<EventId> {
        self.id_where(|e| e.geometry_control().is_primary())
    }

    /// Make `target` the primary geometry control event. Any other primary
    /// event becomes a secondary event.
    pub fn set_geometry_control_primary_event_by_index(&mut self, target: Option<usize>) -> TimelineResult<()> {
        let target = self.checked_target(target)?;
        for event in self.events_mut() {
            if event.geometry_control().is_primary() {
                event.geometry_control_mut().set_kind(GeometryControlKind::SecondaryEvent);
            }
        }
        if let Some(event) = target.and_then(|i| self.event_slot(i)) {
            event.geometry_control_mut().set_kind(GeometryControlKind::PrimaryEvent);
        }
        Ok(())
    }

    pub fn find_user_load_event_index(&self, load: LoadId) -> Option<usize> {
        self.position_where(|e| e.apply_load().is_enabled() && e.apply_load().has_user_load(load))
    }

    pub fn find_user_load_event_id(&self, load: LoadId) -> Option<EventId> {
        self.id_where(|e| e.apply_load().is_enabled() && e.apply_load().has_user_load(load))
    }

    pub fn set_user_load_event_by_index(&mut self, load: LoadId, target: Option<usize>) -> TimelineResult<()> {
        let target = self.checked_target(target)?;
        for event in self.events_mut() {
            event.apply_load_mut().remove_user_load(load);
        }
        if let Some(event) = target.and_then(|i| self.event_slot(i)) {
            event.apply_load_mut().add_user_load(load);
        }
        Ok(())
    }

    pub fn set_user_load_event_by_id(&mut self, load: LoadId, target: Option<EventId>) -> TimelineResult<()> {
        let index = self.resolve_target(target)?;
        self.set_user_load_event_by_index(load, index)
    }

    // ========================================================================
    // Whole-bridge predicates
    // ========================================================================

    pub fn are_all_piers_erected(&self, bridge: &BridgeDescription) -> bool {
        bridge.piers.iter().all(|p| self.is_pier_erected(p.id))
    }

    pub fn are_all_temporary_supports_erected(&self, bridge: &BridgeDescription) -> bool {
        bridge
            .temporary_supports
            .iter()
            .all(|ts| self.is_temporary_support_erected(ts.id))
    }

    pub fn are_all_temporary_supports_removed(&self, bridge: &BridgeDescription) -> bool {
        bridge
            .temporary_supports
            .iter()
            .all(|ts| self.is_temporary_support_removed(ts.id))
    }

    pub fn are_all_segments_erected(&self, bridge: &BridgeDescription) -> bool {
        bridge.segments().all(|s| self.is_segment_erected(s.id))
    }

    /// True when every segment of a girder is erected in or before event `index`
    pub fn are_girder_segments_erected_by(&self, bridge: &BridgeDescription, girder: GirderId, index: usize) -> bool {
        bridge
            .girder(girder)
            .is_some_and(|g| g.segments.iter().all(|s| self.is_segment_erected_by(s.id, index)))
    }

    pub fn are_all_closure_joints_cast(&self, bridge: &BridgeDescription) -> bool {
        bridge.closures().all(|c| self.is_closure_joint_cast(bridge, c.id))
    }

    pub fn are_all_tendons_stressed(&self, bridge: &BridgeDescription) -> bool {
        bridge
            .girders
            .iter()
            .all(|g| (0..g.ducts.len()).all(|duct| self.is_tendon_stressed(g.id, duct)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_timeline(days: &[f64]) -> TimelineManager {
        let mut timeline = TimelineManager::new();
        for (i, day) in days.iter().enumerate() {
            timeline
                .add_timeline_event(TimelineEvent::new(format!("Event {}", i), *day), true)
                .unwrap();
        }
        timeline
    }

    #[test]
    fn test_timing_queries() {
        let timeline = blank_timeline(&[0.0, 10.0, 25.0]);
        assert_eq!(timeline.start(1), Some(10.0));
        assert_eq!(timeline.end(1), Some(25.0));
        assert_eq!(timeline.duration(1), Some(15.0));
        assert_eq!(timeline.duration(2), Some(0.0));
        assert_eq!(timeline.end(3), None);
        assert!(timeline.has_event(25.0 + 1.0e-9));
        assert!(!timeline.has_event(24.0));
        assert_eq!(timeline.find_event("Event 2").map(|(i, _)| i), Some(2));
        assert!(timeline.find_event("Missing").is_none());
    }

    #[test]
    fn test_pier_erection_moves_between_events() {
        let mut timeline = blank_timeline(&[0.0, 10.0]);
        timeline.set_pier_erection_event_by_index(PierId(3), Some(0)).unwrap();
        assert_eq!(timeline.pier_erection_event_index(PierId(3)), Some(0));

        timeline.set_pier_erection_event_by_index(PierId(3), Some(1)).unwrap();
        assert!(!timeline.events()[0].erect_piers().has_pier(PierId(3)));
        assert!(timeline.events()[1].erect_piers().has_pier(PierId(3)));
        assert_eq!(timeline.pier_erection_event_id(PierId(3)), timeline.events()[1].id());

        timeline.set_pier_erection_event_by_index(PierId(3), None).unwrap();
        assert!(!timeline.is_pier_erected(PierId(3)));

        assert!(timeline.set_pier_erection_event_by_index(PierId(3), Some(7)).is_err());
    }

    #[test]
    fn test_segment_construction_carries_timing() {
        let mut timeline = blank_timeline(&[0.0, 10.0]);
        timeline.set_segment_construction_event_by_index(SegmentId(0), Some(0)).unwrap();
        {
            let construct = timeline.event_slot(0).unwrap().construct_segments_mut();
            construct.set_total_curing_duration(4.0);
            construct.set_relaxation_time(2.0);
        }

        timeline.set_segment_construction_event_by_index(SegmentId(0), Some(1)).unwrap();

        let construct = timeline.events()[1].construct_segments();
        assert!(construct.has_segment(SegmentId(0)));
        assert_eq!(construct.total_curing_duration(), 4.0);
        assert_eq!(construct.relaxation_time(), 2.0);
        assert!(!timeline.events()[0].construct_segments().has_segment(SegmentId(0)));
    }

    #[test]
    fn test_temporary_support_pair() {
        let mut timeline = blank_timeline(&[0.0, 10.0, 20.0]);
        timeline.set_temporary_support_events(SupportId(0), Some(0), Some(2)).unwrap();
        assert_eq!(timeline.temporary_support_events(SupportId(0)), (Some(0), Some(2)));

        timeline.set_temporary_support_events(SupportId(0), Some(1), None).unwrap();
        assert_eq!(timeline.temporary_support_events(SupportId(0)), (Some(1), None));
        assert!(!timeline.is_temporary_support_removed(SupportId(0)));
    }

    #[test]
    fn test_closure_setter_resolves_support() {
        let bridge = BridgeDescription::sample_two_span();
        let mut timeline = blank_timeline(&[0.0, 10.0]);

        timeline
            .set_cast_closure_joint_event_by_index(&bridge, ClosureId(1), Some(0))
            .unwrap();
        timeline
            .event_slot(0)
            .unwrap()
            .cast_closure_joint_mut()
            .set_total_curing_duration(3.0);
        assert!(timeline.is_closure_joint_at_temporary_support(SupportId(1)));

        timeline
            .set_cast_closure_joint_event_by_index(&bridge, ClosureId(1), Some(1))
            .unwrap();
        assert_eq!(timeline.cast_closure_joint_event_index(&bridge, ClosureId(1)), Some(1));
        assert_eq!(timeline.events()[1].cast_closure_joint().total_curing_duration(), 3.0);
        assert!(timeline.is_closure_joint_cast_by(&bridge, ClosureId(1), 1));
        assert!(!timeline.is_closure_joint_cast_by(&bridge, ClosureId(1), 0));

        assert!(timeline
            .set_cast_closure_joint_event_by_index(&bridge, ClosureId(42), Some(0))
            .is_err());
    }

    #[test]
    fn test_single_occurrence_setters() {
        let mut timeline = blank_timeline(&[0.0, 10.0, 20.0]);
        timeline.set_live_load_event_by_index(Some(1)).unwrap();
        timeline.set_live_load_event_by_index(Some(2)).unwrap();
        assert_eq!(timeline.live_load_event_index(), Some(2));
        assert!(!timeline.events()[1].has_occurrence(SingleOccurrence::LiveLoad));

        let id = timeline.events()[0].id();
        timeline.set_occurrence_event_by_id(SingleOccurrence::RailingSystem, id).unwrap();
        assert_eq!(timeline.railing_system_load_event_index(), Some(0));

        timeline.set_live_load_event_by_index(None).unwrap();
        assert!(!timeline.is_live_load_applied());
    }

    #[test]
    fn test_cast_deck_setter_keeps_curing() {
        let mut timeline = blank_timeline(&[0.0, 10.0, 30.0]);
        timeline.set_cast_deck_event_by_index(Some(0), true).unwrap();
        timeline
            .event_slot(0)
            .unwrap()
            .cast_deck_mut()
            .set_total_curing_duration(5.0);

        timeline.set_cast_deck_event_by_index(Some(1), true).unwrap();

        assert_eq!(timeline.cast_deck_event_index(), Some(1));
        assert!(!timeline.events()[0].cast_deck().is_enabled());
        assert_eq!(timeline.events()[1].cast_deck().total_curing_duration(), 5.0);
    }

    #[test]
    fn test_cast_deck_setter_rolls_back() {
        let mut timeline = blank_timeline(&[0.0, 10.0, 12.0]);
        timeline.set_cast_deck_event_by_index(Some(0), true).unwrap();

        // 7 days of curing at day 10 overruns the event at day 12
        let result = timeline.set_cast_deck_event_by_index(Some(1), false);

        assert_eq!(result, Err(PlacementError::OverrunsNextEvent));
        assert_eq!(timeline.cast_deck_event_index(), Some(0));
        assert!(!timeline.events()[1].cast_deck().is_enabled());
    }

    #[test]
    fn test_cast_deck_setter_reports_reflow() {
        let mut timeline = blank_timeline(&[0.0, 3.0]);

        let reflow = timeline.set_cast_deck_event_by_index(Some(0), true).unwrap();
        assert_eq!(reflow.shifted.len(), 1);
        assert_eq!(reflow.shifted[0].from_day, 3.0);
        assert_eq!(reflow.shifted[0].to_day, 7.0);

        let reflow = timeline.set_cast_deck_event_by_index(None, true).unwrap();
        assert!(reflow.is_empty());
        assert_eq!(timeline.cast_deck_event_index(), None);
    }

    #[test]
    fn test_remove_overlay_event() {
        let mut bridge = BridgeDescription::sample_two_span();
        let mut timeline = blank_timeline(&[0.0, 10.0]);
        timeline.set_overlay_load_event_by_index(Some(1)).unwrap();

        bridge.wearing_surface = crate::bridge::WearingSurface::Overlay;
        assert!(timeline.remove_overlay_load_event(&bridge).is_err());
        assert!(timeline.is_overlay_installed());

        bridge.wearing_surface = crate::bridge::WearingSurface::SacrificialDepth;
        timeline.remove_overlay_load_event(&bridge).unwrap();
        assert!(!timeline.is_overlay_installed());
    }

    #[test]
    fn test_segment_erection_lookups() {
        let mut timeline = blank_timeline(&[0.0, 10.0, 20.0]);
        timeline.set_segment_erection_event_by_index(SegmentId(0), Some(1)).unwrap();
        timeline.set_segment_erection_event_by_index(SegmentId(1), Some(2)).unwrap();

        assert_eq!(timeline.first_segment_erection_event_index(), Some(1));
        assert_eq!(timeline.last_segment_erection_event_index(), Some(2));
        assert!(timeline.is_segment_erected_by(SegmentId(0), 1));
        assert!(!timeline.is_segment_erected_by(SegmentId(1), 1));
        assert_eq!(timeline.last_segment_erection_event_id(), timeline.events()[2].id());
    }

    #[test]
    fn test_whole_bridge_predicates() {
        let bridge = BridgeDescription::sample_two_span();
        let mut timeline = blank_timeline(&[0.0, 10.0]);
        assert!(!timeline.are_all_piers_erected(&bridge));

        for pier in &bridge.piers {
            timeline.set_pier_erection_event_by_index(pier.id, Some(0)).unwrap();
        }
        for segment in bridge.segments() {
            timeline.set_segment_erection_event_by_index(segment.id, Some(1)).unwrap();
        }
        for duct in 0..3 {
            timeline.set_stress_tendon_event_by_index(GirderId(0), duct, Some(1)).unwrap();
        }

        assert!(timeline.are_all_piers_erected(&bridge));
        assert!(timeline.are_all_segments_erected(&bridge));
        assert!(timeline.are_girder_segments_erected_by(&bridge, GirderId(0), 1));
        assert!(!timeline.are_girder_segments_erected_by(&bridge, GirderId(0), 0));
        assert!(timeline.are_all_tendons_stressed(&bridge));
        assert!(!timeline.are_all_temporary_supports_erected(&bridge));
        assert!(!timeline.are_all_closure_joints_cast(&bridge));
        assert!(timeline.is_tendon_stressed_by_index(1));
    }

    #[test]
    fn test_geometry_control_primary() {
        let mut timeline = blank_timeline(&[0.0, 10.0]);
        timeline.set_geometry_control_primary_event_by_index(Some(0)).unwrap();
        timeline.set_geometry_control_primary_event_by_index(Some(1)).unwrap();

        assert_eq!(timeline.geometry_control_primary_event_indices(), vec![1]);
        assert_eq!(
            timeline.events()[0].geometry_control().kind(),
            GeometryControlKind::SecondaryEvent
        );
    }

    #[test]
    fn test_user_load_lookup() {
        let mut timeline = blank_timeline(&[0.0, 10.0]);
        timeline.set_user_load_event_by_index(LoadId(5), Some(1)).unwrap();
        assert_eq!(timeline.find_user_load_event_index(LoadId(5)), Some(1));

        let first = timeline.events()[0].id();
        timeline.set_user_load_event_by_id(LoadId(5), first).unwrap();
        assert_eq!(timeline.find_user_load_event_id(LoadId(5)), first);
        assert!(timeline.set_user_load_event_by_id(LoadId(5), Some(EventId(77))).is_err());
    }
}
