//! # Project Data Structures
//!
//! The `Project` struct is the root container for a construction schedule.
//! Projects serialize to `.sgt` files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── meta: ProjectMetadata (id, version, engineer, job info, timestamps)
//! ├── settings: ScheduleSettings (adjust mode, default durations)
//! ├── bridge: BridgeDescription (read-only structural topology)
//! ├── timeline: TimelineManager (construction events)
//! └── loads: LoadManager (user-defined loads)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use timeline_core::project::Project;
//!
//! let project = Project::sample().unwrap();
//! assert!(project.validate().is_valid());
//!
//! let json = serde_json::to_string_pretty(&project).unwrap();
//! assert!(json.contains("Cast deck"));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::activities::defaults;
use crate::bridge::{BridgeDescription, TemporarySupportKind};
use crate::errors::{PlacementError, TimelineError, TimelineResult};
use crate::event::TimelineEvent;
use crate::loads::{DistributedLoad, LoadManager, SpanKey, UserLoadCase};
use crate::timeline::{Reflow, TimelineManager, ValidationReport};

/// Current schema version for .sgt files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root project container.
///
/// This is the top-level struct that gets serialized to `.sgt` files. The
/// timeline and loads refer to bridge elements by id only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Project metadata (version, engineer, job info)
    pub meta: ProjectMetadata,

    /// Scheduling defaults
    #[serde(default)]
    pub settings: ScheduleSettings,

    /// Structure being built
    pub bridge: BridgeDescription,

    /// Construction sequence
    #[serde(default)]
    pub timeline: TimelineManager,

    /// User-defined loads
    #[serde(default)]
    pub loads: LoadManager,
}

impl Project {
    /// Create a project with an empty bridge and timeline.
    ///
    /// # Example
    ///
    /// ```rust
    /// use timeline_core::project::Project;
    ///
    /// let project = Project::new("John Doe", "26-001", "Main Street Overpass");
    /// assert_eq!(project.meta.engineer, "John Doe");
    /// assert_eq!(project.timeline.event_count(), 0);
    /// ```
    pub fn new(engineer: impl Into<String>, job_id: impl Into<String>, bridge_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Project {
            meta: ProjectMetadata {
                id: Uuid::new_v4(),
                version: SCHEMA_VERSION.to_string(),
                engineer: engineer.into(),
                job_id: job_id.into(),
                bridge_name: bridge_name.into(),
                created: now,
                modified: now,
            },
            settings: ScheduleSettings::default(),
            bridge: BridgeDescription::default(),
            timeline: TimelineManager::new(),
            loads: LoadManager::new(),
        }
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    /// Create an event whose activity durations come from the project settings
    pub fn new_event(&self, description: impl Into<String>, day: f64) -> TimelineEvent {
        let s = &self.settings;
        let mut event = TimelineEvent::new(description, day);
        event
            .construct_segments_mut()
            .set_total_curing_duration(s.segment_curing_duration);
        event.construct_segments_mut().set_relaxation_time(s.segment_relaxation_time);
        event
            .cast_closure_joint_mut()
            .set_total_curing_duration(s.closure_curing_duration);
        event.cast_deck_mut().set_total_curing_duration(s.deck_curing_duration);
        event
            .cast_longitudinal_joint_mut()
            .set_total_curing_duration(s.longitudinal_joint_curing_duration);
        event
    }

    /// Add an event using the project's adjust-timeline setting. Returns the
    /// event's index and whatever the insert pushed later.
    pub fn add_event(&mut self, event: TimelineEvent) -> Result<(usize, Reflow), PlacementError> {
        let placed = self.timeline.add_timeline_event(event, self.settings.adjust_timeline)?;
        self.touch();
        Ok(placed)
    }

    /// Audit the timeline against the bridge and loads
    pub fn validate(&self) -> ValidationReport {
        self.timeline.validate(&self.bridge, &self.loads)
    }

    /// Delete loads no event applies; see [`LoadManager::fix_bad_loads`]
    pub fn fix_bad_loads(&mut self) -> Option<String> {
        let report = self.loads.fix_bad_loads(&self.timeline);
        if report.is_some() {
            self.touch();
        }
        report
    }

    /// Repair a freshly deserialized project. Returns a note per repair.
    pub(crate) fn normalize_loaded(&mut self) -> Vec<String> {
        self.loads.sync_load_id_counter();
        self.timeline.normalize_loaded()
    }

    /// Two-span spliced girder bridge with a complete, valid construction
    /// sequence and one utility load.
    pub fn sample() -> TimelineResult<Self> {
        let mut project = Project::new("Sample Engineer", "26-001", "Two-span spliced girder");
        project.bridge = BridgeDescription::sample_two_span();
        project.build_sample_timeline()?;
        Ok(project)
    }

    fn build_sample_timeline(&mut self) -> TimelineResult<()> {
        const STAGES: [(f64, &str); 8] = [
            (0.0, "Construct segments, erect piers and erection towers"),
            (30.0, "Erect segments and strongbacks"),
            (40.0, "Cast closure joints"),
            (50.0, "Stress tendons"),
            (55.0, "Remove temporary supports"),
            (60.0, "Cast deck"),
            (90.0, "Install railing system and utilities"),
            (120.0, "Open to traffic"),
        ];
        for (day, description) in STAGES {
            let event = self.new_event(description, day);
            self.add_event(event)?;
        }

        let bridge = &self.bridge;
        let timeline = &mut self.timeline;

        for pier in &bridge.piers {
            timeline.set_pier_erection_event_by_index(pier.id, Some(0))?;
        }
        for ts in &bridge.temporary_supports {
            let erect = match ts.kind {
                TemporarySupportKind::ErectionTower => 0,
                TemporarySupportKind::StrongBack => 1,
            };
            timeline.set_temporary_support_events(ts.id, Some(erect), Some(4))?;
        }
        for segment in bridge.segments() {
            timeline.set_segment_construction_event_by_index(segment.id, Some(0))?;
            timeline.set_segment_erection_event_by_index(segment.id, Some(1))?;
        }
        for closure in bridge.closures() {
            timeline.set_cast_closure_joint_event_by_index(bridge, closure.id, Some(2))?;
        }
        for girder in &bridge.girders {
            for duct in 0..girder.ducts.len() {
                timeline.set_stress_tendon_event_by_index(girder.id, duct, Some(3))?;
            }
        }

        timeline.set_cast_deck_event_by_index(Some(5), self.settings.adjust_timeline)?;
        timeline.set_railing_system_load_event_by_index(Some(6))?;
        timeline.set_geometry_control_primary_event_by_index(Some(6))?;
        timeline.set_live_load_event_by_index(Some(7))?;
        timeline.set_load_rating_event_by_index(Some(7))?;

        let utilities = timeline
            .event_by_index(6)
            .and_then(|e| e.id())
            .ok_or_else(|| TimelineError::Internal {
                message: "sample timeline is missing its utilities event".to_string(),
            })?;
        let load = DistributedLoad::uniform(SpanKey::ALL, UserLoadCase::DW, -0.05).with_description("Utilities");
        self.loads.add_distributed_load(timeline, utilities, load)?;
        Ok(())
    }
}

impl Default for Project {
    fn default() -> Self {
        Project::new("", "", "")
    }
}

/// Project metadata stored in the file header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Stable project identifier
    pub id: Uuid,

    /// Schema version (for migration compatibility)
    pub version: String,

    /// Name of the responsible engineer
    pub engineer: String,

    /// Job/project number
    pub job_id: String,

    #[serde(default)]
    pub bridge_name: String,

    /// When the project was created
    pub created: DateTime<Utc>,

    /// When the project was last modified
    pub modified: DateTime<Utc>,
}

/// Scheduling defaults applied to new events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    /// Reflow later events instead of rejecting edits that overlap
    pub adjust_timeline: bool,

    /// Days from casting a segment until strand release
    pub segment_curing_duration: f64,

    /// Days of strand relaxation before release
    pub segment_relaxation_time: f64,

    /// Closure joint concrete age at continuity (days)
    pub closure_curing_duration: f64,

    /// Deck concrete age at continuity (days)
    pub deck_curing_duration: f64,

    /// Longitudinal joint concrete age before loading (days)
    pub longitudinal_joint_curing_duration: f64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        ScheduleSettings {
            adjust_timeline: true,
            segment_curing_duration: defaults::SEGMENT_CURING_DURATION,
            segment_relaxation_time: defaults::SEGMENT_RELAXATION_TIME,
            closure_curing_duration: defaults::CLOSURE_CURING_DURATION,
            deck_curing_duration: defaults::DECK_CURING_DURATION,
            longitudinal_joint_curing_duration: defaults::LONGITUDINAL_JOINT_CURING_DURATION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activities::Activity;

    #[test]
    fn test_project_creation() {
        let project = Project::new("John Doe", "26-001", "Overpass");
        assert_eq!(project.meta.engineer, "John Doe");
        assert_eq!(project.meta.job_id, "26-001");
        assert_eq!(project.meta.bridge_name, "Overpass");
        assert_eq!(project.meta.version, SCHEMA_VERSION);
        assert!(project.settings.adjust_timeline);
    }

    #[test]
    fn test_sample_project() {
        let project = Project::sample().unwrap();
        assert_eq!(project.timeline.event_count(), 8);
        assert_eq!(project.loads.user_load_count(), 1);
        assert!(project.timeline.are_all_segments_erected(&project.bridge));
        assert!(project.timeline.are_all_tendons_stressed(&project.bridge));
        assert!(project.timeline.are_all_temporary_supports_removed(&project.bridge));
        assert_eq!(project.timeline.start(7), Some(120.0));
    }

    #[test]
    fn test_new_event_uses_settings() {
        let mut project = Project::new("Engineer", "26-001", "Bridge");
        project.settings.deck_curing_duration = 14.0;

        let mut event = project.new_event("Deck", 10.0);
        assert!(!event.has_any_activity());
        event.cast_deck_mut().enable(true);
        assert_eq!(event.min_elapsed_time(), 14.0);
    }

    #[test]
    fn test_add_event_strict_mode() {
        let mut project = Project::new("Engineer", "26-001", "Bridge");
        project.settings.adjust_timeline = false;

        let mut deck = project.new_event("Deck", 0.0);
        deck.cast_deck_mut().enable(true);
        project.add_event(deck).unwrap();

        let early = project.new_event("Too soon", 3.0);
        assert_eq!(project.add_event(early.clone()), Err(PlacementError::OverlapsPreviousEvent));
        assert_eq!(project.timeline.event_count(), 1);

        project.settings.adjust_timeline = true;
        let (index, reflow) = project.add_event(early).unwrap();
        assert_eq!(index, 1);
        assert_eq!(reflow.max_delay(), 4.0);
        assert_eq!(project.timeline.event_by_index(1).map(|e| e.day()), Some(7.0));
    }

    #[test]
    fn test_fix_bad_loads() {
        let mut project = Project::sample().unwrap();
        assert_eq!(project.fix_bad_loads(), None);

        let utilities = project.timeline.event_by_index(6).and_then(|e| e.id()).unwrap();
        project.timeline.remove_event_by_id(utilities).unwrap();

        let report = project.fix_bad_loads().unwrap();
        assert!(report.contains("Distributed Load: All Spans, All Girders, Utilities"));
        assert_eq!(project.loads.user_load_count(), 0);
    }

    #[test]
    fn test_project_serialization() {
        let project = Project::sample().unwrap();
        let json = serde_json::to_string_pretty(&project).unwrap();

        assert!(json.contains("Sample Engineer"));
        assert!(json.contains("Open to traffic"));

        let mut roundtrip: Project = serde_json::from_str(&json).unwrap();
        assert!(roundtrip.normalize_loaded().is_empty());
        assert_eq!(roundtrip, project);
    }

    #[test]
    fn test_settings_default_fill() {
        let settings: ScheduleSettings = serde_json::from_str(r#"{"deck_curing_duration": 10.0}"#).unwrap();
        assert_eq!(settings.deck_curing_duration, 10.0);
        assert_eq!(settings.closure_curing_duration, defaults::CLOSURE_CURING_DURATION);
        assert!(settings.adjust_timeline);
    }
}
