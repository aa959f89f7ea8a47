//! Construction activities carried by timeline events
//!
//! Every [`TimelineEvent`](crate::event::TimelineEvent) holds exactly one
//! instance of each activity kind. Each can be enabled or disabled
//! independently; disabling keeps the activity's data so re-enabling restores
//! it.
//!
//! # Overview
//!
//! - [`ConstructSegments`], [`ErectSegments`], [`ErectPiers`],
//!   [`RemoveTemporarySupports`] - membership sets of structural elements
//! - [`CastClosureJoint`], [`CastDeck`], [`CastLongitudinalJoint`] - concrete
//!   placements with a curing duration
//! - [`StressTendon`] - tendons keyed by `(girder, duct)`
//! - [`ApplyLoad`] - load category flags plus user-defined loads
//! - [`GeometryControl`] - roadway geometry control marker
//!
//! Membership mutators are idempotent: adding a member twice is the same as
//! adding it once, removing a non-member does nothing. Adding the first member
//! (or applying a load) enables the activity.
//!
//! # Example
//!
//! ```
//! use timeline_core::activities::{Activity, ErectPiers};
//! use timeline_core::ids::PierId;
//!
//! let mut erect = ErectPiers::default();
//! assert!(!erect.is_enabled());
//!
//! erect.add_pier(PierId(1));
//! erect.add_pier(PierId(1));
//! assert!(erect.is_enabled());
//! assert_eq!(erect.piers().len(), 1);
//! ```

pub mod casting;
pub mod construction;
pub mod loading;
pub mod tendon;

pub use casting::{CastClosureJoint, CastDeck, CastLongitudinalJoint};
pub use construction::{ConstructSegments, ErectPiers, ErectSegments, RemoveTemporarySupports};
pub use loading::{ApplyLoad, GeometryControl, GeometryControlKind};
pub use tendon::{StressTendon, TendonKey};

/// Default durations (days) for activities that hold up the next event
pub mod defaults {
    /// Time from casting a segment until the strands are released
    pub const SEGMENT_CURING_DURATION: f64 = 1.0;
    /// Strand relaxation time before release
    pub const SEGMENT_RELAXATION_TIME: f64 = 1.0;
    /// Closure joint concrete age at continuity
    pub const CLOSURE_CURING_DURATION: f64 = 7.0;
    /// Deck concrete age at continuity
    pub const DECK_CURING_DURATION: f64 = 7.0;
    /// Longitudinal joint concrete age before it is loaded
    pub const LONGITUDINAL_JOINT_CURING_DURATION: f64 = 7.0;
}

/// Contract shared by every activity kind
pub trait Activity {
    fn is_enabled(&self) -> bool;

    /// Enable or disable the activity. Data is kept when disabling.
    fn enable(&mut self, enable: bool);

    /// Minimum time (days) that must pass after this activity before the next
    /// event may start, for activities that have one.
    fn required_duration(&self) -> Option<f64> {
        None
    }

    /// Duration counted toward the event's minimum elapsed time
    fn effective_duration(&self) -> Option<f64> {
        if self.is_enabled() {
            self.required_duration()
        } else {
            None
        }
    }
}

/// Implements the enable flag half of [`Activity`] for a struct with an
/// `enabled: bool` field.
macro_rules! enable_flag {
    () => {
        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn enable(&mut self, enable: bool) {
            self.enabled = enable;
        }
    };
}

pub(crate) use enable_flag;
