//! # Timeline Validation
//!
//! [`TimelineManager::validate`] audits a timeline against the bridge it
//! schedules and the user loads applied to it. Validation is a report, not a
//! gate: it never fails, and an inconsistent timeline can exist in memory.
//! Every violation is collected into a [`ValidationReport`]:
//!
//! - [`TimelineErrors`] - one bit per violation class
//! - [`TimelineIssue`] - detail rows naming the elements and events involved
//!
//! Event numbers in messages are 1-based; indices stored in
//! [`TimelineIssue`] are 0-based.
//!
//! ## Example
//!
//! ```rust
//! use timeline_core::bridge::BridgeDescription;
//! use timeline_core::loads::LoadManager;
//! use timeline_core::timeline::{TimelineErrors, TimelineManager};
//!
//! let bridge = BridgeDescription::sample_two_span();
//! let report = TimelineManager::new().validate(&bridge, &LoadManager::new());
//!
//! assert!(!report.is_valid());
//! assert!(report.errors.contains(TimelineErrors::CAST_DECK_ACTIVITY_REQUIRED));
//! assert!(report.errors.contains(TimelineErrors::LIVELOAD_ACTIVITY_REQUIRED));
//! ```

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TimelineManager;
use crate::activities::{Activity, TendonKey};
use crate::bridge::{BridgeDescription, Girder, SupportRef, TemporarySupportKind};
use crate::event::SingleOccurrence;
use crate::ids::{ClosureId, DuctIndex, LoadId, PierId, SegmentId, SupportId};
use crate::loads::LoadManager;

// ============================================================================
// Error Flags
// ============================================================================

/// Bit set of timeline violation classes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimelineErrors(u64);

macro_rules! timeline_errors {
    ($($name:ident = $bit:expr => $message:expr;)*) => {
        impl TimelineErrors {
            $(pub const $name: TimelineErrors = TimelineErrors(1 << $bit);)*

            const TABLE: &'static [(TimelineErrors, &'static str, &'static str)] = &[
                $((TimelineErrors::$name, stringify!($name), $message),)*
            ];
        }
    };
}

timeline_errors! {
    CAST_DECK_ACTIVITY_REQUIRED = 0
        => "The timeline does not include an activity for casting the deck.";
    OVERLAY_ACTIVITY_REQUIRED = 1
        => "The timeline does not include an activity for installing the overlay.";
    RAILING_SYSTEM_ACTIVITY_REQUIRED = 2
        => "The timeline does not include an activity for installing the traffic barrier/railing system.";
    LIVELOAD_ACTIVITY_REQUIRED = 3
        => "The timeline does not include an activity for opening the bridge to traffic.";
    USER_LOAD_ACTIVITY_REQUIRED = 4
        => "The timeline does not include activities for one or more user defined loads.";
    CONSTRUCT_SEGMENTS_ACTIVITY_REQUIRED = 5
        => "The timeline does not include activities for constructing one or more segments.";
    ERECT_PIERS_ACTIVITY_REQUIRED = 6
        => "The timeline does not include activities for constructing one or more piers or temporary supports.";
    ERECT_SEGMENTS_ACTIVITY_REQUIRED = 7
        => "The timeline does not include activities for erecting one or more segments.";
    REMOVE_TEMPORARY_SUPPORTS_ACTIVITY_REQUIRED = 8
        => "The timeline does not include activities for removing one or more of the temporary supports.";
    CAST_CLOSURE_JOINT_ACTIVITY_REQUIRED = 9
        => "The timeline does not include activities for casting one or more of the closure joints.";
    STRESS_TENDONS_ACTIVITY_REQUIRED = 10
        => "The timeline does not include activities for stressing one or more tendons.";
    TEMPORARY_SUPPORT_REMOVAL_ERROR = 11
        => "A temporary support has been removed while it is still supporting a segment.";
    SEGMENT_ERECTION_ERROR = 12
        => "A segment has been erected before its supporting elements (Pier or Temporary Support) have been erected.";
    CLOSURE_JOINT_ERROR = 13
        => "A closure joint has been cast before its adjacent segments have been erected.";
    RAILING_SYSTEM_ERROR = 14
        => "The traffic barrier/railing system has been installed before the deck was cast.";
    STRESS_TENDON_ERROR = 15
        => "A tendon has been stressed before the segments and closure joints have been assembled.";
    LOAD_RATING_ERROR = 16
        => "The bridge is load rated before it is opened to traffic.";
    INTERMEDIATE_DIAPHRAGM_LOADING_REQUIRED = 17
        => "The timeline does not include an activity for casting the intermediate diaphragms.";
    INTERMEDIATE_DIAPHRAGM_LOADING_ERROR = 18
        => "The intermediate diaphragms are cast before all segments are erected or after the deck is cast.";
    CAST_LONGITUDINAL_JOINT_ACTIVITY_REQUIRED = 19
        => "The timeline does not include an activity for casting the longitudinal joints.";
    USER_LOAD_ERROR = 20
        => "A user defined load is applied before the segments it is applied to have been erected.";
    GEOMETRY_CONTROL_ACTIVITY_REQUIRED = 21
        => "The timeline does not include a primary geometry control event.";
    GEOMETRY_CONTROL_DUPLICATE = 22
        => "The timeline includes more than one primary geometry control event.";
    GEOMETRY_CONTROL_ERROR = 23
        => "The primary geometry control event occurs before the deck is cast.";
    STRONGBACK_ERECTION_ERROR = 24
        => "A strongback has been erected outside of the erection of the segments it connects.";
    DUCT_GEOMETRY_ERROR = 25
        => "The path of one or more ducts could not be determined.";
}

impl TimelineErrors {
    pub const NONE: TimelineErrors = TimelineErrors(0);

    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every flag of `other` is set
    pub fn contains(self, other: TimelineErrors) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: TimelineErrors) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: TimelineErrors) {
        self.0 &= !other.0;
    }

    /// Individual flags that are set, in declaration order
    pub fn iter(self) -> impl Iterator<Item = TimelineErrors> {
        TimelineErrors::TABLE
            .iter()
            .filter(move |(flag, _, _)| self.contains(*flag))
            .map(|(flag, _, _)| *flag)
    }

    /// Flag name, for a single flag
    pub fn name(self) -> Option<&'static str> {
        TimelineErrors::TABLE
            .iter()
            .find(|(flag, _, _)| *flag == self)
            .map(|(_, name, _)| *name)
    }

    /// Human readable text, one line per flag
    pub fn message(self) -> String {
        TimelineErrors::TABLE
            .iter()
            .filter(|(flag, _, _)| self.contains(*flag))
            .map(|(_, _, message)| *message)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl BitOr for TimelineErrors {
    type Output = TimelineErrors;

    fn bitor(self, rhs: TimelineErrors) -> TimelineErrors {
        TimelineErrors(self.0 | rhs.0)
    }
}

impl BitOrAssign for TimelineErrors {
    fn bitor_assign(&mut self, rhs: TimelineErrors) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for TimelineErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "OK");
        }
        let names: Vec<&str> = self.iter().filter_map(|flag| flag.name()).collect();
        write!(f, "{}", names.join(" | "))
    }
}

// ============================================================================
// Detail Rows
// ============================================================================

/// One violation, with the elements and event indices involved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "issue")]
pub enum TimelineIssue {
    RailingBeforeDeck {
        railing_event: usize,
        deck_event: usize,
    },
    RatingBeforeLiveLoad {
        rating_event: usize,
        live_load_event: usize,
    },
    UserLoadNotApplied {
        load: LoadId,
    },
    UserLoadBeforeErection {
        load: LoadId,
        load_event: usize,
        erection_event: usize,
    },
    GeometryControlDuplicate {
        events: Vec<usize>,
    },
    GeometryControlTooEarly {
        event: usize,
        earliest_event: usize,
    },
    PierNotErected {
        pier: PierId,
    },
    TemporarySupportNotErected {
        support: SupportId,
    },
    TemporarySupportNotRemoved {
        support: SupportId,
    },
    TemporarySupportRemovedBeforeErected {
        support: SupportId,
        erection_event: usize,
        removal_event: usize,
    },
    TemporarySupportStillSupporting {
        support: SupportId,
        removal_event: usize,
        segment: SegmentId,
        erection_event: usize,
    },
    TemporarySupportStillHosting {
        support: SupportId,
        removal_event: usize,
        closure: ClosureId,
        cast_event: usize,
    },
    StrongbackOutsideWindow {
        support: SupportId,
        erection_event: usize,
        window: (usize, usize),
    },
    SegmentNotConstructed {
        segment: SegmentId,
    },
    SegmentNotErected {
        segment: SegmentId,
    },
    SegmentErectedBeforeConstructed {
        segment: SegmentId,
        construction_event: usize,
        erection_event: usize,
    },
    SegmentErectedBeforeSupport {
        segment: SegmentId,
        support: SupportRef,
        support_event: usize,
        erection_event: usize,
    },
    IntermediateDiaphragmOutsideWindow {
        event: usize,
        earliest_event: Option<usize>,
        latest_event: Option<usize>,
    },
    ClosureJointNotCast {
        closure: ClosureId,
    },
    ClosureJointCastBeforeErection {
        closure: ClosureId,
        cast_event: usize,
        segment: SegmentId,
        erection_event: usize,
    },
    TendonNotStressed {
        tendon: TendonKey,
    },
    TendonBeforeSegmentErected {
        tendon: TendonKey,
        stress_event: usize,
        segment: SegmentId,
        erection_event: usize,
    },
    TendonBeforeClosureCast {
        tendon: TendonKey,
        stress_event: usize,
        closure: ClosureId,
        cast_event: usize,
    },
    DuctGeometry {
        tendon: TendonKey,
        reason: String,
    },
}

fn number(index: usize) -> usize {
    index + 1
}

impl TimelineIssue {
    /// The violation class this row belongs to
    pub fn flag(&self) -> TimelineErrors {
        use TimelineIssue::*;
        match self {
            RailingBeforeDeck { .. } => TimelineErrors::RAILING_SYSTEM_ERROR,
            RatingBeforeLiveLoad { .. } => TimelineErrors::LOAD_RATING_ERROR,
            UserLoadNotApplied { .. } => TimelineErrors::USER_LOAD_ACTIVITY_REQUIRED,
            UserLoadBeforeErection { .. } => TimelineErrors::USER_LOAD_ERROR,
            GeometryControlDuplicate { .. } => TimelineErrors::GEOMETRY_CONTROL_DUPLICATE,
            GeometryControlTooEarly { .. } => TimelineErrors::GEOMETRY_CONTROL_ERROR,
            PierNotErected { .. } | TemporarySupportNotErected { .. } => TimelineErrors::ERECT_PIERS_ACTIVITY_REQUIRED,
            TemporarySupportNotRemoved { .. } => TimelineErrors::REMOVE_TEMPORARY_SUPPORTS_ACTIVITY_REQUIRED,
            TemporarySupportRemovedBeforeErected { .. }
            | TemporarySupportStillSupporting { .. }
            | TemporarySupportStillHosting { .. } => TimelineErrors::TEMPORARY_SUPPORT_REMOVAL_ERROR,
            StrongbackOutsideWindow { .. } => TimelineErrors::STRONGBACK_ERECTION_ERROR,
            SegmentNotConstructed { .. } => TimelineErrors::CONSTRUCT_SEGMENTS_ACTIVITY_REQUIRED,
            SegmentNotErected { .. } => TimelineErrors::ERECT_SEGMENTS_ACTIVITY_REQUIRED,
            SegmentErectedBeforeConstructed { .. } | SegmentErectedBeforeSupport { .. } => {
                TimelineErrors::SEGMENT_ERECTION_ERROR
            }
            IntermediateDiaphragmOutsideWindow { .. } => TimelineErrors::INTERMEDIATE_DIAPHRAGM_LOADING_ERROR,
            ClosureJointNotCast { .. } => TimelineErrors::CAST_CLOSURE_JOINT_ACTIVITY_REQUIRED,
            ClosureJointCastBeforeErection { .. } => TimelineErrors::CLOSURE_JOINT_ERROR,
            TendonNotStressed { .. } => TimelineErrors::STRESS_TENDONS_ACTIVITY_REQUIRED,
            TendonBeforeSegmentErected { .. } | TendonBeforeClosureCast { .. } => TimelineErrors::STRESS_TENDON_ERROR,
            DuctGeometry { .. } => TimelineErrors::DUCT_GEOMETRY_ERROR,
        }
    }
}

impl fmt::Display for TimelineIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TimelineIssue::*;
        match self {
            RailingBeforeDeck { railing_event, deck_event } => write!(
                f,
                "Railing system installed in event {} but the deck is cast in event {}",
                number(*railing_event),
                number(*deck_event)
            ),
            RatingBeforeLiveLoad { rating_event, live_load_event } => write!(
                f,
                "Load rating in event {} but the bridge opens to traffic in event {}",
                number(*rating_event),
                number(*live_load_event)
            ),
            UserLoadNotApplied { load } => write!(f, "User load {} is not applied in any event", load),
            UserLoadBeforeErection {
                load,
                load_event,
                erection_event,
            } => write!(
                f,
                "User load {} is applied in event {} but its segments are erected in event {}",
                load,
                number(*load_event),
                number(*erection_event)
            ),
            GeometryControlDuplicate { events } => {
                let list: Vec<String> = events.iter().map(|e| number(*e).to_string()).collect();
                write!(f, "Events {} are all primary geometry control events", list.join(", "))
            }
            GeometryControlTooEarly { event, earliest_event } => write!(
                f,
                "Primary geometry control event {} must be at or after event {}",
                number(*event),
                number(*earliest_event)
            ),
            PierNotErected { pier } => write!(f, "Pier {} is not erected", pier),
            TemporarySupportNotErected { support } => write!(f, "Temporary support {} is not erected", support),
            TemporarySupportNotRemoved { support } => write!(f, "Temporary support {} is not removed", support),
            TemporarySupportRemovedBeforeErected {
                support,
                erection_event,
                removal_event,
            } => write!(
                f,
                "Temporary support {} is removed in event {} before it is erected in event {}",
                support,
                number(*removal_event),
                number(*erection_event)
            ),
            TemporarySupportStillSupporting {
                support,
                removal_event,
                segment,
                erection_event,
            } => write!(
                f,
                "Temporary support {} is removed in event {} but segment {} is erected on it in event {}",
                support,
                number(*removal_event),
                segment,
                number(*erection_event)
            ),
            TemporarySupportStillHosting {
                support,
                removal_event,
                closure,
                cast_event,
            } => write!(
                f,
                "Temporary support {} is removed in event {} but closure joint {} is cast on it in event {}",
                support,
                number(*removal_event),
                closure,
                number(*cast_event)
            ),
            StrongbackOutsideWindow {
                support,
                erection_event,
                window,
            } => write!(
                f,
                "Strongback {} is erected in event {}; it must be erected between events {} and {}",
                support,
                number(*erection_event),
                number(window.0),
                number(window.1)
            ),
            SegmentNotConstructed { segment } => write!(f, "Segment {} is not constructed", segment),
            SegmentNotErected { segment } => write!(f, "Segment {} is not erected", segment),
            SegmentErectedBeforeConstructed {
                segment,
                construction_event,
                erection_event,
            } => write!(
                f,
                "Segment {} is erected in event {} before it is constructed in event {}",
                segment,
                number(*erection_event),
                number(*construction_event)
            ),
            SegmentErectedBeforeSupport {
                segment,
                support,
                support_event,
                erection_event,
            } => write!(
                f,
                "Segment {} is erected in event {} before {} is erected in event {}",
                segment,
                number(*erection_event),
                support,
                number(*support_event)
            ),
            IntermediateDiaphragmOutsideWindow {
                event,
                earliest_event,
                latest_event,
            } => {
                write!(f, "Intermediate diaphragms are cast in event {}", number(*event))?;
                match earliest_event {
                    Some(first) => write!(f, "; they must be cast at or after event {}", number(*first))?,
                    None => write!(f, "; not every segment is erected")?,
                }
                if let Some(last) = latest_event {
                    write!(f, " and no later than event {}", number(*last))?;
                }
                Ok(())
            }
            ClosureJointNotCast { closure } => write!(f, "Closure joint {} is not cast", closure),
            ClosureJointCastBeforeErection {
                closure,
                cast_event,
                segment,
                erection_event,
            } => write!(
                f,
                "Closure joint {} is cast in event {} before segment {} is erected in event {}",
                closure,
                number(*cast_event),
                segment,
                number(*erection_event)
            ),
            TendonNotStressed { tendon } => write!(f, "Tendon {} is not stressed", tendon),
            TendonBeforeSegmentErected {
                tendon,
                stress_event,
                segment,
                erection_event,
            } => write!(
                f,
                "Tendon {} is stressed in event {} but segment {} is erected in event {}",
                tendon,
                number(*stress_event),
                segment,
                number(*erection_event)
            ),
            TendonBeforeClosureCast {
                tendon,
                stress_event,
                closure,
                cast_event,
            } => write!(
                f,
                "Tendon {} is stressed in event {} but closure joint {} is cast in event {}",
                tendon,
                number(*stress_event),
                closure,
                number(*cast_event)
            ),
            DuctGeometry { tendon, reason } => write!(f, "Tendon {}: {}", tendon, reason),
        }
    }
}

// ============================================================================
// Report
// ============================================================================

/// Result of [`TimelineManager::validate`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: TimelineErrors,
    pub issues: Vec<TimelineIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn flag(&mut self, flag: TimelineErrors) {
        self.errors.insert(flag);
    }

    fn push(&mut self, issue: TimelineIssue) {
        self.errors.insert(issue.flag());
        self.issues.push(issue);
    }

    /// Issues belonging to one violation class
    pub fn issues_for(&self, flag: TimelineErrors) -> impl Iterator<Item = &TimelineIssue> {
        self.issues.iter().filter(move |issue| flag.contains(issue.flag()))
    }

    /// Each flag's message followed by its detail rows
    pub fn messages(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for flag in self.errors.iter() {
            lines.push(flag.message());
            for issue in self.issues_for(flag) {
                lines.push(format!("  - {}", issue));
            }
        }
        lines
    }
}

// ============================================================================
// Validation
// ============================================================================

impl TimelineManager {
    /// Audit the timeline against the bridge and the user loads.
    pub fn validate(&self, bridge: &BridgeDescription, loads: &LoadManager) -> ValidationReport {
        let mut report = ValidationReport::default();

        self.validate_single_occurrences(bridge, &mut report);
        self.validate_user_loads(bridge, loads, &mut report);
        self.validate_geometry_control(bridge, &mut report);
        self.validate_supports(bridge, &mut report);
        self.validate_intermediate_diaphragms(bridge, &mut report);

        for girder in &bridge.girders {
            self.validate_segments(girder, &mut report);
            self.validate_closures(girder, &mut report);
            for duct in 0..girder.ducts.len() {
                self.validate_duct(bridge, girder, duct, &mut report);
            }
        }

        debug!(errors = %report.errors, issues = report.issues.len(), "Validated timeline");
        report
    }

    fn validate_single_occurrences(&self, bridge: &BridgeDescription, report: &mut ValidationReport) {
        let deck = self.cast_deck_event_index();
        if bridge.has_deck() && deck.is_none() {
            report.flag(TimelineErrors::CAST_DECK_ACTIVITY_REQUIRED);
        }
        if bridge.has_overlay() && !self.is_overlay_installed() {
            report.flag(TimelineErrors::OVERLAY_ACTIVITY_REQUIRED);
        }
        if bridge.has_intermediate_diaphragms && self.intermediate_diaphragm_load_event_index().is_none() {
            report.flag(TimelineErrors::INTERMEDIATE_DIAPHRAGM_LOADING_REQUIRED);
        }
        if bridge.has_longitudinal_joints && !self.is_longitudinal_joint_cast() {
            report.flag(TimelineErrors::CAST_LONGITUDINAL_JOINT_ACTIVITY_REQUIRED);
        }

        let railing = self.railing_system_load_event_index();
        match (railing, deck) {
            (None, _) => report.flag(TimelineErrors::RAILING_SYSTEM_ACTIVITY_REQUIRED),
            (Some(railing_event), Some(deck_event)) if railing_event <= deck_event => {
                report.push(TimelineIssue::RailingBeforeDeck {
                    railing_event,
                    deck_event,
                });
            }
            _ => {}
        }

        let live_load = self.live_load_event_index();
        if live_load.is_none() {
            report.flag(TimelineErrors::LIVELOAD_ACTIVITY_REQUIRED);
        }
        if let (Some(rating_event), Some(live_load_event)) = (self.load_rating_event_index(), live_load) {
            if rating_event < live_load_event {
                report.push(TimelineIssue::RatingBeforeLiveLoad {
                    rating_event,
                    live_load_event,
                });
            }
        }
    }

    fn validate_user_loads(&self, bridge: &BridgeDescription, loads: &LoadManager, report: &mut ValidationReport) {
        for (load, key) in loads.load_targets() {
            let Some(load_event) = self.find_user_load_event_index(load) else {
                report.push(TimelineIssue::UserLoadNotApplied { load });
                continue;
            };

            let erection_event = bridge
                .segments_in(key.span, key.girder)
                .into_iter()
                .filter_map(|segment| self.segment_erection_event_index(segment))
                .max();

            if let Some(erection_event) = erection_event {
                if load_event < erection_event {
                    report.push(TimelineIssue::UserLoadBeforeErection {
                        load,
                        load_event,
                        erection_event,
                    });
                }
            }
        }
    }

    fn validate_geometry_control(&self, bridge: &BridgeDescription, report: &mut ValidationReport) {
        let primaries = self.geometry_control_primary_event_indices();
        if primaries.is_empty() {
            report.flag(TimelineErrors::GEOMETRY_CONTROL_ACTIVITY_REQUIRED);
            return;
        }
        if primaries.len() > 1 {
            report.push(TimelineIssue::GeometryControlDuplicate {
                events: primaries.clone(),
            });
        }

        let earliest = if bridge.has_deck() {
            self.cast_deck_event_index()
        } else {
            self.last_segment_erection_event_index()
        };
        if let Some(earliest_event) = earliest {
            for &event in primaries.iter().filter(|&&e| e < earliest_event) {
                report.push(TimelineIssue::GeometryControlTooEarly { event, earliest_event });
            }
        }
    }

    fn validate_supports(&self, bridge: &BridgeDescription, report: &mut ValidationReport) {
        for pier in &bridge.piers {
            if !self.is_pier_erected(pier.id) {
                report.push(TimelineIssue::PierNotErected { pier: pier.id });
            }
        }

        for ts in &bridge.temporary_supports {
            let (erect, remove) = self.temporary_support_events(ts.id);
            let Some(erection_event) = erect else {
                report.push(TimelineIssue::TemporarySupportNotErected { support: ts.id });
                continue;
            };
            let Some(removal_event) = remove else {
                report.push(TimelineIssue::TemporarySupportNotRemoved { support: ts.id });
                continue;
            };

            if removal_event < erection_event {
                report.push(TimelineIssue::TemporarySupportRemovedBeforeErected {
                    support: ts.id,
                    erection_event,
                    removal_event,
                });
            }

            let here = SupportRef::TemporarySupport(ts.id);
            for segment in bridge.segments().filter(|s| s.supports.contains(&here)) {
                if let Some(segment_event) = self.segment_erection_event_index(segment.id) {
                    if removal_event <= segment_event {
                        report.push(TimelineIssue::TemporarySupportStillSupporting {
                            support: ts.id,
                            removal_event,
                            segment: segment.id,
                            erection_event: segment_event,
                        });
                    }
                }
            }

            for closure in bridge.closures().filter(|c| c.support == here) {
                if let Some(cast_event) = self.cast_closure_joint_event_index(bridge, closure.id) {
                    if removal_event < cast_event {
                        report.push(TimelineIssue::TemporarySupportStillHosting {
                            support: ts.id,
                            removal_event,
                            closure: closure.id,
                            cast_event,
                        });
                    }
                }
            }
        }

        // strongbacks hang from one segment and carry the next
        for ts in bridge
            .temporary_supports
            .iter()
            .filter(|ts| ts.kind == TemporarySupportKind::StrongBack)
        {
            let Some(erection_event) = self.temporary_support_events(ts.id).0 else {
                continue;
            };
            let here = SupportRef::TemporarySupport(ts.id);
            for closure in bridge.closures().filter(|c| c.support == here) {
                let left = self.segment_erection_event_index(closure.left_segment);
                let right = self.segment_erection_event_index(closure.right_segment);
                if let (Some(left), Some(right)) = (left, right) {
                    let window = (left.min(right), left.max(right));
                    if erection_event < window.0 || window.1 < erection_event {
                        report.push(TimelineIssue::StrongbackOutsideWindow {
                            support: ts.id,
                            erection_event,
                            window,
                        });
                    }
                }
            }
        }
    }

    fn validate_intermediate_diaphragms(&self, bridge: &BridgeDescription, report: &mut ValidationReport) {
        let Some(event) = self.intermediate_diaphragm_load_event_index() else {
            return;
        };

        let earliest_event = if self.are_all_segments_erected(bridge) {
            self.last_segment_erection_event_index()
        } else {
            None
        };
        let latest_event = self.cast_deck_event_index();

        let too_early = earliest_event.map_or(true, |first| event < first);
        let too_late = latest_event.is_some_and(|last| event > last);
        if too_early || too_late {
            report.push(TimelineIssue::IntermediateDiaphragmOutsideWindow {
                event,
                earliest_event,
                latest_event,
            });
        }
    }

    fn validate_segments(&self, girder: &Girder, report: &mut ValidationReport) {
        for segment in &girder.segments {
            let construction_event = self.segment_construction_event_index(segment.id);
            if construction_event.is_none() {
                report.push(TimelineIssue::SegmentNotConstructed { segment: segment.id });
            }

            let Some(erection_event) = self.segment_erection_event_index(segment.id) else {
                report.push(TimelineIssue::SegmentNotErected { segment: segment.id });
                continue;
            };

            if let Some(construction_event) = construction_event {
                if erection_event < construction_event {
                    report.push(TimelineIssue::SegmentErectedBeforeConstructed {
                        segment: segment.id,
                        construction_event,
                        erection_event,
                    });
                }
            }

            for &support in &segment.supports {
                let support_event = match support {
                    SupportRef::Pier(pier) => self.pier_erection_event_index(pier),
                    SupportRef::TemporarySupport(ts) => self.temporary_support_events(ts).0,
                };
                if let Some(support_event) = support_event {
                    if erection_event < support_event {
                        report.push(TimelineIssue::SegmentErectedBeforeSupport {
                            segment: segment.id,
                            support,
                            support_event,
                            erection_event,
                        });
                    }
                }
            }
        }
    }

    fn validate_closures(&self, girder: &Girder, report: &mut ValidationReport) {
        for closure in &girder.closures {
            let cast_event = self.events().iter().position(|e| {
                let cast = e.cast_closure_joint();
                cast.is_enabled()
                    && match closure.support {
                        SupportRef::Pier(pier) => cast.has_pier(pier),
                        SupportRef::TemporarySupport(ts) => cast.has_temporary_support(ts),
                    }
            });
            let Some(cast_event) = cast_event else {
                report.push(TimelineIssue::ClosureJointNotCast { closure: closure.id });
                continue;
            };

            for segment in [closure.left_segment, closure.right_segment] {
                if let Some(erection_event) = self.segment_erection_event_index(segment) {
                    if cast_event < erection_event {
                        report.push(TimelineIssue::ClosureJointCastBeforeErection {
                            closure: closure.id,
                            cast_event,
                            segment,
                            erection_event,
                        });
                    }
                }
            }
        }
    }

    /// Check that a tendon is stressed after every segment it crosses is
    /// erected and every closure joint it crosses is cast.
    fn validate_duct(
        &self,
        bridge: &BridgeDescription,
        girder: &Girder,
        duct: DuctIndex,
        report: &mut ValidationReport,
    ) {
        let tendon = TendonKey::new(girder.id, duct);
        let Some(stress_event) = self.stress_tendon_event_index(girder.id, duct) else {
            report.push(TimelineIssue::TendonNotStressed { tendon });
            return;
        };

        let crossings = match bridge.duct_crossings(girder, duct) {
            Ok(crossings) => crossings,
            Err(err) => {
                report.push(TimelineIssue::DuctGeometry {
                    tendon,
                    reason: err.to_string(),
                });
                return;
            }
        };

        for segment in crossings.segments {
            if let Some(erection_event) = self.segment_erection_event_index(segment) {
                if stress_event <= erection_event {
                    report.push(TimelineIssue::TendonBeforeSegmentErected {
                        tendon,
                        stress_event,
                        segment,
                        erection_event,
                    });
                }
            }
        }

        for closure in crossings.closures {
            if let Some(cast_event) = self.cast_closure_joint_event_index(bridge, closure) {
                if stress_event <= cast_event {
                    report.push(TimelineIssue::TendonBeforeClosureCast {
                        tendon,
                        stress_event,
                        closure,
                        cast_event,
                    });
                }
            }
        }
    }

    // ========================================================================
    // Removal guard
    // ========================================================================

    /// Report the required activities event `index` still carries.
    ///
    /// Removing such an event leaves the timeline incomplete. The remove
    /// calls do not consult this; it is for callers that want to warn first.
    /// An index past the end reports nothing.
    pub fn can_remove_event(&self, bridge: &BridgeDescription, index: usize) -> Result<(), TimelineErrors> {
        let Some(event) = self.event_by_index(index) else {
            return Ok(());
        };
        let mut errors = TimelineErrors::NONE;

        if event.construct_segments().is_enabled() && !event.construct_segments().segments().is_empty() {
            errors |= TimelineErrors::CONSTRUCT_SEGMENTS_ACTIVITY_REQUIRED;
        }
        if event.erect_piers().is_enabled() && !event.erect_piers().is_empty() {
            errors |= TimelineErrors::ERECT_PIERS_ACTIVITY_REQUIRED;
        }
        if event.erect_segments().is_enabled() && !event.erect_segments().segments().is_empty() {
            errors |= TimelineErrors::ERECT_SEGMENTS_ACTIVITY_REQUIRED;
        }
        if event.remove_temporary_supports().is_enabled()
            && !event.remove_temporary_supports().temporary_supports().is_empty()
        {
            errors |= TimelineErrors::REMOVE_TEMPORARY_SUPPORTS_ACTIVITY_REQUIRED;
        }
        let cast = event.cast_closure_joint();
        if cast.is_enabled() && !(cast.piers().is_empty() && cast.temporary_supports().is_empty()) {
            errors |= TimelineErrors::CAST_CLOSURE_JOINT_ACTIVITY_REQUIRED;
        }
        if event.stress_tendon().is_enabled() && !event.stress_tendon().tendons().is_empty() {
            errors |= TimelineErrors::STRESS_TENDONS_ACTIVITY_REQUIRED;
        }

        let required = [
            (SingleOccurrence::CastDeck, bridge.has_deck(), TimelineErrors::CAST_DECK_ACTIVITY_REQUIRED),
            (
                SingleOccurrence::CastLongitudinalJoint,
                bridge.has_longitudinal_joints,
                TimelineErrors::CAST_LONGITUDINAL_JOINT_ACTIVITY_REQUIRED,
            ),
            (SingleOccurrence::Overlay, bridge.has_overlay(), TimelineErrors::OVERLAY_ACTIVITY_REQUIRED),
            (
                SingleOccurrence::IntermediateDiaphragm,
                bridge.has_intermediate_diaphragms,
                TimelineErrors::INTERMEDIATE_DIAPHRAGM_LOADING_REQUIRED,
            ),
            (SingleOccurrence::RailingSystem, true, TimelineErrors::RAILING_SYSTEM_ACTIVITY_REQUIRED),
            (SingleOccurrence::LiveLoad, true, TimelineErrors::LIVELOAD_ACTIVITY_REQUIRED),
        ];
        for (kind, needed, flag) in required {
            if needed && event.has_occurrence(kind) {
                errors |= flag;
            }
        }

        if event.apply_load().is_user_load_applied() {
            errors |= TimelineErrors::USER_LOAD_ACTIVITY_REQUIRED;
        }
        if event.geometry_control().is_primary() {
            errors |= TimelineErrors::GEOMETRY_CONTROL_ACTIVITY_REQUIRED;
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{Duct, DuctGeometry};
    use crate::event::TimelineEvent;
    use crate::ids::GirderId;
    use crate::loads::{PointLoad, SpanKey, UserLoadCase};
    use crate::project::Project;

    #[test]
    fn test_empty_timeline_with_deck() {
        let bridge = BridgeDescription::sample_two_span();
        let report = TimelineManager::new().validate(&bridge, &LoadManager::new());

        assert!(report.errors.contains(TimelineErrors::CAST_DECK_ACTIVITY_REQUIRED));
        assert!(report.errors.contains(TimelineErrors::LIVELOAD_ACTIVITY_REQUIRED));
        assert!(report.errors.contains(TimelineErrors::ERECT_PIERS_ACTIVITY_REQUIRED));
        assert!(report.errors.contains(TimelineErrors::STRESS_TENDONS_ACTIVITY_REQUIRED));
        assert!(!report.errors.contains(TimelineErrors::OVERLAY_ACTIVITY_REQUIRED));
        assert_eq!(report.issues_for(TimelineErrors::ERECT_PIERS_ACTIVITY_REQUIRED).count(), 5);
    }

    #[test]
    fn test_no_deck_no_deck_flag() {
        let mut bridge = BridgeDescription::sample_two_span();
        bridge.deck_type = crate::bridge::DeckType::NoDeck;
        let report = TimelineManager::new().validate(&bridge, &LoadManager::new());
        assert!(!report.errors.contains(TimelineErrors::CAST_DECK_ACTIVITY_REQUIRED));
    }

    #[test]
    fn test_sample_project_is_valid() {
        let project = Project::sample().unwrap();
        let report = project.validate();
        assert!(report.is_valid(), "{:?}", report.messages());
        assert!(report.messages().is_empty());
    }

    #[test]
    fn test_tendon_stressed_before_closure_cast() {
        let mut project = Project::sample().unwrap();
        let closure_event = project
            .timeline
            .cast_closure_joint_event_index(&project.bridge, ClosureId(0))
            .unwrap();
        project
            .timeline
            .set_stress_tendon_event_by_index(GirderId(0), 1, Some(closure_event))
            .unwrap();

        let report = project.validate();
        assert!(report.errors.contains(TimelineErrors::STRESS_TENDON_ERROR));
        assert!(report.issues.contains(&TimelineIssue::TendonBeforeClosureCast {
            tendon: TendonKey::new(GirderId(0), 1),
            stress_event: closure_event,
            closure: ClosureId(0),
            cast_event: closure_event,
        }));
        // duct 1 stops at P1 and never crosses CJ1
        assert!(!report.issues.iter().any(|issue| matches!(
            issue,
            TimelineIssue::TendonBeforeClosureCast { tendon, closure: ClosureId(1), .. } if tendon.duct == 1
        )));
    }

    #[test]
    fn test_railing_before_deck() {
        let mut project = Project::sample().unwrap();
        let deck = project.timeline.cast_deck_event_index().unwrap();
        project.timeline.set_railing_system_load_event_by_index(Some(deck)).unwrap();

        let report = project.validate();
        assert!(report.errors.contains(TimelineErrors::RAILING_SYSTEM_ERROR));
        assert_eq!(report.issues_for(TimelineErrors::RAILING_SYSTEM_ERROR).count(), 1);
    }

    #[test]
    fn test_load_rating_before_live_load() {
        let mut project = Project::sample().unwrap();
        project.timeline.set_load_rating_event_by_index(Some(0)).unwrap();
        let report = project.validate();
        assert!(report.errors.contains(TimelineErrors::LOAD_RATING_ERROR));
    }

    #[test]
    fn test_duplicate_geometry_control() {
        let mut project = Project::sample().unwrap();
        let last = project.timeline.event_count() - 1;
        let primary = project.timeline.geometry_control_primary_event_indices()[0];
        project
            .timeline
            .event_slot(last)
            .unwrap()
            .geometry_control_mut()
            .set_kind(crate::activities::GeometryControlKind::PrimaryEvent);

        let report = project.validate();
        assert!(report.errors.contains(TimelineErrors::GEOMETRY_CONTROL_DUPLICATE));
        assert!(report.issues.contains(&TimelineIssue::GeometryControlDuplicate {
            events: vec![primary, last],
        }));
    }

    #[test]
    fn test_geometry_control_before_deck() {
        let mut project = Project::sample().unwrap();
        project.timeline.set_geometry_control_primary_event_by_index(Some(0)).unwrap();
        let report = project.validate();
        assert!(report.errors.contains(TimelineErrors::GEOMETRY_CONTROL_ERROR));
    }

    #[test]
    fn test_temporary_support_removed_under_segment() {
        let mut project = Project::sample().unwrap();
        let erection = project.timeline.segment_erection_event_index(SegmentId(0)).unwrap();
        project
            .timeline
            .set_temporary_support_events(SupportId(0), Some(0), Some(erection))
            .unwrap();

        let report = project.validate();
        assert!(report.errors.contains(TimelineErrors::TEMPORARY_SUPPORT_REMOVAL_ERROR));
        assert!(report.issues.contains(&TimelineIssue::TemporarySupportStillSupporting {
            support: SupportId(0),
            removal_event: erection,
            segment: SegmentId(0),
            erection_event: erection,
        }));
    }

    #[test]
    fn test_strongback_outside_window() {
        let mut project = Project::sample().unwrap();
        let removal = project.timeline.temporary_support_events(SupportId(1)).1;
        project
            .timeline
            .set_temporary_support_events(SupportId(1), Some(0), removal)
            .unwrap();

        let report = project.validate();
        assert!(report.errors.contains(TimelineErrors::STRONGBACK_ERECTION_ERROR));
        assert!(!report.errors.contains(TimelineErrors::SEGMENT_ERECTION_ERROR));
    }

    #[test]
    fn test_segment_erected_before_pier() {
        let mut project = Project::sample().unwrap();
        let last = project.timeline.event_count() - 1;
        project.timeline.set_pier_erection_event_by_index(PierId(2), Some(last)).unwrap();

        let report = project.validate();
        assert!(report.errors.contains(TimelineErrors::SEGMENT_ERECTION_ERROR));
        assert!(report
            .issues
            .iter()
            .any(|issue| matches!(issue, TimelineIssue::SegmentErectedBeforeSupport { segment: SegmentId(2), .. })));
    }

    #[test]
    fn test_closure_cast_before_erection() {
        let mut project = Project::sample().unwrap();
        project
            .timeline
            .set_cast_closure_joint_event_by_index(&project.bridge, ClosureId(1), Some(0))
            .unwrap();
        let report = project.validate();
        assert!(report.errors.contains(TimelineErrors::CLOSURE_JOINT_ERROR));
    }

    #[test]
    fn test_user_load_without_event() {
        let mut project = Project::sample().unwrap();
        let event = project.timeline.events()[0].id().unwrap();
        let load = PointLoad::new(SpanKey::ALL, UserLoadCase::DC, 0.5, -10.0);
        let index = project.loads.add_point_load(&mut project.timeline, event, load).unwrap();
        let id = project.loads.point_load(index).unwrap().id;

        // applied in event 0, before any segment is erected
        let report = project.validate();
        assert!(report.errors.contains(TimelineErrors::USER_LOAD_ERROR));

        project.timeline.set_user_load_event_by_index(id, None).unwrap();
        let report = project.validate();
        assert!(report.issues.contains(&TimelineIssue::UserLoadNotApplied { load: id }));
    }

    #[test]
    fn test_intermediate_diaphragm_window() {
        let mut project = Project::sample().unwrap();
        project.bridge.has_intermediate_diaphragms = true;
        let report = project.validate();
        assert!(report.errors.contains(TimelineErrors::INTERMEDIATE_DIAPHRAGM_LOADING_REQUIRED));

        project.timeline.set_intermediate_diaphragm_load_event_by_index(Some(0)).unwrap();
        let report = project.validate();
        assert!(report.errors.contains(TimelineErrors::INTERMEDIATE_DIAPHRAGM_LOADING_ERROR));

        let deck = project.timeline.cast_deck_event_index().unwrap();
        project.timeline.set_intermediate_diaphragm_load_event_by_index(Some(deck)).unwrap();
        assert!(project.validate().is_valid());
    }

    #[test]
    fn test_cyclic_offset_duct() {
        let mut project = Project::sample().unwrap();
        project.bridge.girders[0].ducts.push(Duct {
            geometry: DuctGeometry::Offset { reference_duct: 3 },
        });
        let last = project.timeline.event_count() - 1;
        project
            .timeline
            .set_stress_tendon_event_by_index(GirderId(0), 3, Some(last))
            .unwrap();

        let report = project.validate();
        assert!(report.errors.contains(TimelineErrors::DUCT_GEOMETRY_ERROR));
        assert!(!report.errors.contains(TimelineErrors::STRESS_TENDONS_ACTIVITY_REQUIRED));
    }

    #[test]
    fn test_can_remove_event() {
        let project = Project::sample().unwrap();
        let deck = project.timeline.cast_deck_event_index().unwrap();
        let errors = project.timeline.can_remove_event(&project.bridge, deck).unwrap_err();
        assert!(errors.contains(TimelineErrors::CAST_DECK_ACTIVITY_REQUIRED));

        let mut timeline = TimelineManager::new();
        timeline.add_timeline_event(TimelineEvent::new("Idle", 0.0), true).unwrap();
        assert!(timeline.can_remove_event(&project.bridge, 0).is_ok());
        assert!(timeline.can_remove_event(&project.bridge, 9).is_ok());
    }

    #[test]
    fn test_error_flag_formatting() {
        let errors = TimelineErrors::CAST_DECK_ACTIVITY_REQUIRED | TimelineErrors::LIVELOAD_ACTIVITY_REQUIRED;
        assert_eq!(errors.iter().count(), 2);
        assert_eq!(errors.to_string(), "CAST_DECK_ACTIVITY_REQUIRED | LIVELOAD_ACTIVITY_REQUIRED");
        assert_eq!(
            errors.message(),
            "The timeline does not include an activity for casting the deck.\n\
             The timeline does not include an activity for opening the bridge to traffic."
        );
        assert_eq!(TimelineErrors::NONE.to_string(), "OK");

        let mut errors = errors;
        errors.remove(TimelineErrors::CAST_DECK_ACTIVITY_REQUIRED);
        assert_eq!(errors, TimelineErrors::LIVELOAD_ACTIVITY_REQUIRED);
    }

    #[test]
    fn test_report_messages_include_rows() {
        let bridge = BridgeDescription::sample_two_span();
        let report = TimelineManager::new().validate(&bridge, &LoadManager::new());
        let messages = report.messages();
        assert!(messages.iter().any(|m| m == "  - Pier P0 is not erected"));
        assert!(messages
            .iter()
            .any(|m| m == "The timeline does not include an activity for casting the deck."));

        let json = serde_json::to_string(&report).unwrap();
        let roundtrip: ValidationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report, roundtrip);
    }
}
