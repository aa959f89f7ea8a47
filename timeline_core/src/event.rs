//! # Timeline Events
//!
//! A [`TimelineEvent`] is a point on the construction timeline: a day, a
//! description and one instance of every activity kind.
//!
//! The event's *minimum elapsed time* is the longest duration required by any
//! enabled activity (curing, strand relaxation). The next event on the
//! timeline may not start before it is over.
//!
//! ## Ordering
//!
//! Events order by day only. Equality ([`PartialEq`]) compares every field, so
//! two events on the same day with different activities are *not* equal; use
//! [`TimelineEvent::cmp_day`] when sorting.
//!
//! ## Example
//!
//! ```rust
//! use timeline_core::event::TimelineEvent;
//! use timeline_core::ids::SegmentId;
//!
//! let mut event = TimelineEvent::new("Cast segments", 0.0);
//! event.construct_segments_mut().add_segment(SegmentId(0));
//! event.construct_segments_mut().set_total_curing_duration(3.0);
//!
//! assert_eq!(event.min_elapsed_time(), 3.0);
//! ```

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::activities::{
    Activity, ApplyLoad, CastClosureJoint, CastDeck, CastLongitudinalJoint, ConstructSegments, ErectPiers,
    ErectSegments, GeometryControl, RemoveTemporarySupports, StressTendon,
};
use crate::ids::EventId;

/// A dated step in the construction sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Assigned by the timeline when the event is added
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<EventId>,

    #[serde(default)]
    description: String,

    /// Day the event starts, counted from the start of the project
    day: f64,

    #[serde(default)]
    construct_segments: ConstructSegments,
    #[serde(default)]
    erect_piers: ErectPiers,
    #[serde(default)]
    erect_segments: ErectSegments,
    #[serde(default)]
    remove_temporary_supports: RemoveTemporarySupports,
    #[serde(default)]
    cast_closure_joint: CastClosureJoint,
    #[serde(default)]
    cast_deck: CastDeck,
    #[serde(default)]
    cast_longitudinal_joint: CastLongitudinalJoint,
    #[serde(default)]
    stress_tendon: StressTendon,
    #[serde(default)]
    apply_load: ApplyLoad,
    #[serde(default)]
    geometry_control: GeometryControl,
}

macro_rules! activity_accessors {
    ($($field:ident, $field_mut:ident: $ty:ty;)*) => {
        $(
            pub fn $field(&self) -> &$ty {
                &self.$field
            }

            pub fn $field_mut(&mut self) -> &mut $ty {
                &mut self.$field
            }
        )*
    };
}

impl TimelineEvent {
    /// Create an event with every activity disabled
    pub fn new(description: impl Into<String>, day: f64) -> Self {
        TimelineEvent {
            description: description.into(),
            day,
            ..Default::default()
        }
    }

    pub fn id(&self) -> Option<EventId> {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: Option<EventId>) {
        self.id = id;
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn day(&self) -> f64 {
        self.day
    }

    /// Set the day of a free-standing event.
    ///
    /// Events borrowed from a [`TimelineManager`](crate::timeline::TimelineManager)
    /// through `event_mut` are re-sorted when the borrow ends.
    pub fn set_day(&mut self, day: f64) {
        self.day = day;
    }

    /// Move the event without any re-sorting; used while reflowing the timeline
    pub(crate) fn set_day_raw(&mut self, day: f64) {
        self.day = day;
    }

    /// Compare two events by day
    pub fn cmp_day(&self, other: &TimelineEvent) -> Ordering {
        self.day.total_cmp(&other.day)
    }

    activity_accessors! {
        construct_segments, construct_segments_mut: ConstructSegments;
        erect_piers, erect_piers_mut: ErectPiers;
        erect_segments, erect_segments_mut: ErectSegments;
        remove_temporary_supports, remove_temporary_supports_mut: RemoveTemporarySupports;
        cast_closure_joint, cast_closure_joint_mut: CastClosureJoint;
        cast_deck, cast_deck_mut: CastDeck;
        cast_longitudinal_joint, cast_longitudinal_joint_mut: CastLongitudinalJoint;
        stress_tendon, stress_tendon_mut: StressTendon;
        apply_load, apply_load_mut: ApplyLoad;
        geometry_control, geometry_control_mut: GeometryControl;
    }

    fn activities(&self) -> [&dyn Activity; 10] {
        [
            &self.construct_segments,
            &self.erect_piers,
            &self.erect_segments,
            &self.remove_temporary_supports,
            &self.cast_closure_joint,
            &self.cast_deck,
            &self.cast_longitudinal_joint,
            &self.stress_tendon,
            &self.apply_load,
            &self.geometry_control,
        ]
    }

    /// Minimum number of days before the next event may start
    pub fn min_elapsed_time(&self) -> f64 {
        self.activities()
            .iter()
            .filter_map(|a| a.effective_duration())
            .fold(0.0, f64::max)
    }

    /// True when any activity is enabled
    pub fn has_any_activity(&self) -> bool {
        self.activities().iter().any(|a| a.is_enabled())
    }

    /// Short labels of the enabled activities, for listings
    pub fn activity_labels(&self) -> Vec<&'static str> {
        let mut labels = Vec::new();
        if self.construct_segments.is_enabled() {
            labels.push("Construct segments");
        }
        if self.erect_piers.is_enabled() {
            labels.push("Erect piers");
        }
        if self.erect_segments.is_enabled() {
            labels.push("Erect segments");
        }
        if self.remove_temporary_supports.is_enabled() {
            labels.push("Remove temporary supports");
        }
        if self.cast_closure_joint.is_enabled() {
            labels.push("Cast closure joints");
        }
        if self.cast_deck.is_enabled() {
            labels.push("Cast deck");
        }
        if self.cast_longitudinal_joint.is_enabled() {
            labels.push("Cast longitudinal joints");
        }
        if self.stress_tendon.is_enabled() {
            labels.push("Stress tendons");
        }
        if self.apply_load.is_enabled() {
            labels.push("Apply loads");
        }
        if self.geometry_control.is_enabled() {
            labels.push("Geometry control");
        }
        labels
    }
}

/// Activities that may happen in at most one event of the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SingleOccurrence {
    CastDeck,
    CastLongitudinalJoint,
    LiveLoad,
    RatingLiveLoad,
    RailingSystem,
    Overlay,
    IntermediateDiaphragm,
}

impl SingleOccurrence {
    pub const ALL: [SingleOccurrence; 7] = [
        SingleOccurrence::CastDeck,
        SingleOccurrence::CastLongitudinalJoint,
        SingleOccurrence::LiveLoad,
        SingleOccurrence::RatingLiveLoad,
        SingleOccurrence::RailingSystem,
        SingleOccurrence::Overlay,
        SingleOccurrence::IntermediateDiaphragm,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SingleOccurrence::CastDeck => "cast deck",
            SingleOccurrence::CastLongitudinalJoint => "cast longitudinal joints",
            SingleOccurrence::LiveLoad => "live load",
            SingleOccurrence::RatingLiveLoad => "load rating",
            SingleOccurrence::RailingSystem => "railing system",
            SingleOccurrence::Overlay => "overlay",
            SingleOccurrence::IntermediateDiaphragm => "intermediate diaphragms",
        }
    }
}

impl TimelineEvent {
    /// True when this event carries the single-occurrence activity (enabled)
    pub fn has_occurrence(&self, kind: SingleOccurrence) -> bool {
        match kind {
            SingleOccurrence::CastDeck => self.cast_deck.is_enabled(),
            SingleOccurrence::CastLongitudinalJoint => self.cast_longitudinal_joint.is_enabled(),
            SingleOccurrence::LiveLoad => self.apply_load.is_live_load_applied(),
            SingleOccurrence::RatingLiveLoad => self.apply_load.is_rating_live_load_applied(),
            SingleOccurrence::RailingSystem => self.apply_load.is_railing_system_load_applied(),
            SingleOccurrence::Overlay => self.apply_load.is_overlay_load_applied(),
            SingleOccurrence::IntermediateDiaphragm => self.apply_load.is_intermediate_diaphragm_load_applied(),
        }
    }

    /// Turn a single-occurrence activity on or off
    pub fn set_occurrence(&mut self, kind: SingleOccurrence, on: bool) {
        match kind {
            SingleOccurrence::CastDeck => self.cast_deck.enable(on),
            SingleOccurrence::CastLongitudinalJoint => self.cast_longitudinal_joint.enable(on),
            SingleOccurrence::LiveLoad => self.apply_load.apply_live_load(on),
            SingleOccurrence::RatingLiveLoad => self.apply_load.apply_rating_live_load(on),
            SingleOccurrence::RailingSystem => self.apply_load.apply_railing_system_load(on),
            SingleOccurrence::Overlay => self.apply_load.apply_overlay_load(on),
            SingleOccurrence::IntermediateDiaphragm => self.apply_load.apply_intermediate_diaphragm_load(on),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{PierId, SegmentId};

    #[test]
    fn test_single_occurrence_toggle() {
        let mut event = TimelineEvent::new("Open", 90.0);
        for kind in SingleOccurrence::ALL {
            assert!(!event.has_occurrence(kind));
            event.set_occurrence(kind, true);
            assert!(event.has_occurrence(kind), "{}", kind.label());
            event.set_occurrence(kind, false);
            assert!(!event.has_occurrence(kind));
        }
    }

    #[test]
    fn test_min_elapsed_time_empty() {
        let event = TimelineEvent::new("Empty", 5.0);
        assert_eq!(event.min_elapsed_time(), 0.0);
        assert!(!event.has_any_activity());
    }

    #[test]
    fn test_min_elapsed_time_is_max_of_enabled() {
        let mut event = TimelineEvent::new("Busy", 0.0);
        event.construct_segments_mut().add_segment(SegmentId(0));
        event.cast_closure_joint_mut().add_pier(PierId(1));
        event.cast_closure_joint_mut().set_total_curing_duration(10.0);
        assert_eq!(event.min_elapsed_time(), 10.0);

        event.cast_closure_joint_mut().enable(false);
        assert_eq!(event.min_elapsed_time(), 1.0);
    }

    #[test]
    fn test_deep_equality() {
        let mut a = TimelineEvent::new("A", 1.0);
        let b = a.clone();
        assert_eq!(a, b);

        a.erect_segments_mut().add_segment(SegmentId(2));
        assert_ne!(a, b);
        assert_eq!(a.cmp_day(&b), Ordering::Equal);
    }

    #[test]
    fn test_event_serialization() {
        let mut event = TimelineEvent::new("Erect", 12.0);
        event.erect_piers_mut().add_pier(PierId(0));
        event.apply_load_mut().apply_live_load(true);

        let json = serde_json::to_string(&event).unwrap();
        let roundtrip: TimelineEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, roundtrip);
        assert!(!json.contains("\"id\""));
    }

    #[test]
    fn test_activity_labels() {
        let mut event = TimelineEvent::new("Deck", 30.0);
        event.cast_deck_mut().enable(true);
        event.apply_load_mut().apply_railing_system_load(true);
        assert_eq!(event.activity_labels(), vec!["Cast deck", "Apply loads"]);
    }
}
