//! Cast-in-place concrete: closure joints, deck and longitudinal joints
//!
//! Each carries a total curing duration that holds up the next event.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{defaults, enable_flag, Activity};
use crate::ids::{PierId, SupportId};

// ============================================================================
// Cast Closure Joint
// ============================================================================

/// Casting of closure joints, identified by the support each one sits over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CastClosureJoint {
    enabled: bool,
    piers: BTreeSet<PierId>,
    temporary_supports: BTreeSet<SupportId>,
    total_curing_duration: f64,
}

impl Default for CastClosureJoint {
    fn default() -> Self {
        CastClosureJoint {
            enabled: false,
            piers: BTreeSet::new(),
            temporary_supports: BTreeSet::new(),
            total_curing_duration: defaults::CLOSURE_CURING_DURATION,
        }
    }
}

impl CastClosureJoint {
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

    pub fn total_curing_duration(&self) -> f64 {
        self.total_curing_duration
    }

    pub fn set_total_curing_duration(&mut self, days: f64) {
        self.total_curing_duration = days;
    }
}

impl Activity for CastClosureJoint {
    enable_flag!();

    fn required_duration(&self) -> Option<f64> {
        Some(self.total_curing_duration)
    }
}

// ============================================================================
// Cast Deck
// ============================================================================

/// Casting of the bridge deck (single occurrence)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CastDeck {
    enabled: bool,
    total_curing_duration: f64,
}

impl Default for CastDeck {
    fn default() -> Self {
        CastDeck {
            enabled: false,
            total_curing_duration: defaults::DECK_CURING_DURATION,
        }
    }
}

impl CastDeck {
    pub fn total_curing_duration(&self) -> f64 {
        self.total_curing_duration
    }

    pub fn set_total_curing_duration(&mut self, days: f64) {
        self.total_curing_duration = days;
    }
}

impl Activity for CastDeck {
    enable_flag!();

    fn required_duration(&self) -> Option<f64> {
        Some(self.total_curing_duration)
    }
}

// ============================================================================
// Cast Longitudinal Joint
// ============================================================================

/// Casting of longitudinal joints between adjacent girders (single occurrence)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CastLongitudinalJoint {
    enabled: bool,
    total_curing_duration: f64,
}

impl Default for CastLongitudinalJoint {
    fn default() -> Self {
        CastLongitudinalJoint {
            enabled: false,
            total_curing_duration: defaults::LONGITUDINAL_JOINT_CURING_DURATION,
        }
    }
}

impl CastLongitudinalJoint {
    pub fn total_curing_duration(&self) -> f64 {
        self.total_curing_duration
    }

    pub fn set_total_curing_duration(&mut self, days: f64) {
        self.total_curing_duration = days;
    }
}

impl Activity for CastLongitudinalJoint {
    enable_flag!();

    fn required_duration(&self) -> Option<f64> {
        Some(self.total_curing_duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_accepts_both_support_kinds() {
        let mut cast = CastClosureJoint::default();
        cast.add_pier(PierId(1));
        cast.add_temporary_support(SupportId(1));

        assert!(cast.has_pier(PierId(1)));
        assert!(cast.has_temporary_support(SupportId(1)));
        assert!(!cast.has_pier(PierId(2)));
    }

    #[test]
    fn test_curing_durations() {
        let mut deck = CastDeck::default();
        assert_eq!(deck.effective_duration(), None);

        deck.enable(true);
        assert_eq!(deck.effective_duration(), Some(7.0));

        deck.set_total_curing_duration(14.0);
        assert_eq!(deck.effective_duration(), Some(14.0));

        let mut joint = CastLongitudinalJoint::default();
        joint.enable(true);
        joint.set_total_curing_duration(3.0);
        assert_eq!(joint.required_duration(), Some(3.0));
    }

    #[test]
    fn test_deck_serialization_defaults() {
        let deck: CastDeck = serde_json::from_str(r#"{"enabled": true}"#).unwrap();
        assert!(deck.is_enabled());
        assert_eq!(deck.total_curing_duration(), 7.0);
    }
}
