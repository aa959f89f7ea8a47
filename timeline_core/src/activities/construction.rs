//! Segment construction and erection, pier erection and temporary support removal

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{defaults, enable_flag, Activity};
use crate::ids::{PierId, SegmentId, SupportId};

// ============================================================================
// Construct Segments
// ============================================================================

/// Casting of precast segments in the yard.
///
/// The next event may not start until the segments have cured and the
/// strands have relaxed, whichever takes longer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstructSegments {
    enabled: bool,
    segments: BTreeSet<SegmentId>,
    /// Days from casting to strand release
    total_curing_duration: f64,
    /// Days of strand relaxation before release
    relaxation_time: f64,
}

impl Default for ConstructSegments {
    fn default() -> Self {
        ConstructSegments {
            enabled: false,
            segments: BTreeSet::new(),
            total_curing_duration: defaults::SEGMENT_CURING_DURATION,
            relaxation_time: defaults::SEGMENT_RELAXATION_TIME,
        }
    }
}

impl ConstructSegments {
    pub fn segments(&self) -> &BTreeSet<SegmentId> {
        &self.segments
    }

    pub fn has_segment(&self, id: SegmentId) -> bool {
        self.segments.contains(&id)
    }

    pub fn add_segment(&mut self, id: SegmentId) {
        self.segments.insert(id);
        self.enabled = true;
    }

    pub fn remove_segment(&mut self, id: SegmentId) {
        self.segments.remove(&id);
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    pub fn total_curing_duration(&self) -> f64 {
        self.total_curing_duration
    }

    pub fn set_total_curing_duration(&mut self, days: f64) {
        self.total_curing_duration = days;
    }

    pub fn relaxation_time(&self) -> f64 {
        self.relaxation_time
    }

    pub fn set_relaxation_time(&mut self, days: f64) {
        self.relaxation_time = days;
    }
}

impl Activity for ConstructSegments {
    enable_flag!();

    fn required_duration(&self) -> Option<f64> {
        Some(self.total_curing_duration.max(self.relaxation_time))
    }
}

// ============================================================================
// Erect Segments
// ============================================================================

/// Placement of segments onto their supports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErectSegments {
    enabled: bool,
    segments: BTreeSet<SegmentId>,
}

impl ErectSegments {
    pub fn segments(&self) -> &BTreeSet<SegmentId> {
        &self.segments
    }

    pub fn has_segment(&self, id: SegmentId) -> bool {
        self.segments.contains(&id)
    }

    pub fn add_segment(&mut self, id: SegmentId) {
        self.segments.insert(id);
        self.enabled = true;
    }

    pub fn remove_segment(&mut self, id: SegmentId) {
        self.segments.remove(&id);
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }
}

impl Activity for ErectSegments {
    enable_flag!();
}

// ============================================================================
// Erect Piers
// ============================================================================

/// Construction of permanent piers and erection of temporary supports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErectPiers {
    enabled: bool,
    piers: BTreeSet<PierId>,
    temporary_supports: BTreeSet<SupportId>,
}

impl ErectPiers {
    pub fn piers(&self) -> &BTreeSet<PierId> {
        &self.piers
    }

    pub fn temporary_supports(&self) -> &BTreeSet<SupportId> {
        &self.temporary_supports
    }

    pub fn has_pier(&self, id: PierId) -> bool {
        self.piers.contains(&id)
    }

    pub fn add_pier(&mut self, id: PierId) {
        self.piers.insert(id);
        self.enabled = true;
    }

    pub fn remove_pier(&mut self, id: PierId) {
        self.piers.remove(&id);
    }

    pub fn has_temporary_support(&self, id: SupportId) -> bool {
        self.temporary_supports.contains(&id)
    }

    pub fn add_temporary_support(&mut self, id: SupportId) {
        self.temporary_supports.insert(id);
        self.enabled = true;
    }

    pub fn remove_temporary_support(&mut self, id: SupportId) {
        self.temporary_supports.remove(&id);
    }

    pub fn is_empty(&self) -> bool {
        self.piers.is_empty() && self.temporary_supports.is_empty()
    }
}

impl Activity for ErectPiers {
    enable_flag!();
}

// ============================================================================
// Remove Temporary Supports
// ============================================================================

/// Removal of temporary supports once they are no longer needed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoveTemporarySupports {
    enabled: bool,
    temporary_supports: BTreeSet<SupportId>,
}

impl RemoveTemporarySupports {
    pub fn temporary_supports(&self) -> &BTreeSet<SupportId> {
        &self.temporary_supports
    }

    pub fn has_temporary_support(&self, id: SupportId) -> bool {
        self.temporary_supports.contains(&id)
    }

    pub fn add_temporary_support(&mut self, id: SupportId) {
        self.temporary_supports.insert(id);
        self.enabled = true;
    }

    pub fn remove_temporary_support(&mut self, id: SupportId) {
        self.temporary_supports.remove(&id);
    }
}

impl Activity for RemoveTemporarySupports {
    enable_flag!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct_segments_duration() {
        let mut construct = ConstructSegments::default();
        assert_eq!(construct.required_duration(), Some(1.0));
        assert_eq!(construct.effective_duration(), None);

        construct.add_segment(SegmentId(0));
        construct.set_total_curing_duration(3.0);
        construct.set_relaxation_time(5.0);
        assert_eq!(construct.effective_duration(), Some(5.0));

        construct.set_total_curing_duration(8.0);
        assert_eq!(construct.effective_duration(), Some(8.0));
    }

    #[test]
    fn test_membership_idempotent() {
        let mut erect = ErectSegments::default();
        erect.add_segment(SegmentId(4));
        let once = erect.clone();
        erect.add_segment(SegmentId(4));
        assert_eq!(erect, once);

        erect.remove_segment(SegmentId(99));
        assert_eq!(erect, once);
    }

    #[test]
    fn test_disable_keeps_members() {
        let mut erect = ErectPiers::default();
        erect.add_pier(PierId(0));
        erect.add_temporary_support(SupportId(2));
        erect.enable(false);

        assert!(!erect.is_enabled());
        assert!(erect.has_pier(PierId(0)));
        assert!(erect.has_temporary_support(SupportId(2)));

        erect.enable(true);
        assert!(erect.is_enabled());
    }

    #[test]
    fn test_removing_last_member_keeps_enabled() {
        let mut remove = RemoveTemporarySupports::default();
        remove.add_temporary_support(SupportId(1));
        remove.remove_temporary_support(SupportId(1));
        assert!(remove.is_enabled());
        assert!(remove.temporary_supports().is_empty());
    }

    #[test]
    fn test_unknown_member_queries() {
        let erect = ErectPiers::default();
        assert!(!erect.has_pier(PierId(7)));
        assert!(!erect.has_temporary_support(SupportId(7)));
        assert!(erect.is_empty());
    }
}
