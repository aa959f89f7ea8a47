//! # Bridge Topology
//!
//! The read-only structural description the timeline reasons about: piers,
//! temporary supports, spliced girders (segments, closure joints and
//! post-tensioning ducts) and the deck description.
//!
//! Nothing in this module knows about time. The timeline borrows a
//! [`BridgeDescription`] when it needs to enumerate elements (validation, the
//! `are_all_*` predicates) or resolve a closure joint to the support it sits on.
//!
//! ## Spans
//!
//! Span `i` runs from pier `i` to pier `i + 1`, so a bridge with `n` piers has
//! `n - 1` spans. Piers are expected in ascending station order.
//!
//! ## Duct paths
//!
//! A duct's geometry decides which segments and closure joints it physically
//! crosses, which in turn decides what must be assembled before the tendon in
//! it can be stressed:
//!
//! - [`DuctGeometry::Linear`] runs the full length of the girder
//! - [`DuctGeometry::Parabolic`] runs between two piers
//! - [`DuctGeometry::Offset`] follows the path of another duct in the girder

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{ClosureId, DuctIndex, GirderId, PierId, SegmentId, SupportId};

// ============================================================================
// Deck
// ============================================================================

/// Type of deck on the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DeckType {
    /// No cast deck (e.g. adjacent box beams with an overlay)
    NoDeck,
    /// Composite cast-in-place deck
    #[default]
    CastInPlace,
    /// Cast-in-place deck over stay-in-place panels
    StayInPlacePanels,
}

/// How the riding surface wear is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WearingSurface {
    /// Extra deck thickness that is allowed to wear away
    #[default]
    SacrificialDepth,
    /// A separately applied overlay
    Overlay,
}

// ============================================================================
// Supports
// ============================================================================

/// Permanent pier or abutment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pier {
    pub id: PierId,
    /// Station along the alignment (ft)
    pub station: f64,
}

/// Kind of temporary support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TemporarySupportKind {
    /// Shoring tower on its own foundation
    #[default]
    ErectionTower,
    /// Bracket hung off an erected segment that carries the next segment
    StrongBack,
}

/// Temporary support used during erection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporarySupport {
    pub id: SupportId,
    pub station: f64,
    #[serde(default)]
    pub kind: TemporarySupportKind,
}

/// Reference to either kind of support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id")]
pub enum SupportRef {
    Pier(PierId),
    TemporarySupport(SupportId),
}

impl std::fmt::Display for SupportRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupportRef::Pier(id) => write!(f, "pier {}", id),
            SupportRef::TemporarySupport(id) => write!(f, "temporary support {}", id),
        }
    }
}

// ============================================================================
// Girders
// ============================================================================

/// Precast girder segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub start_station: f64,
    pub end_station: f64,
    /// Piers and temporary supports the segment bears on once erected
    pub supports: Vec<SupportRef>,
}

impl Segment {
    /// True when the segment's extent overlaps `[start, end]` over a positive length
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        let lo = self.start_station.max(start.min(end));
        let hi = self.end_station.min(start.max(end));
        hi - lo > 1.0e-6
    }
}

/// Cast-in-place joint connecting two segments over a support
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosureJoint {
    pub id: ClosureId,
    pub support: SupportRef,
    pub left_segment: SegmentId,
    pub right_segment: SegmentId,
}

/// Path geometry of a post-tensioning duct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DuctGeometry {
    /// End to end along the girder
    Linear,
    /// Draped between two piers
    Parabolic { start_pier: PierId, end_pier: PierId },
    /// Parallel to another duct in the same girder
    Offset { reference_duct: DuctIndex },
}

/// Post-tensioning duct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Duct {
    pub geometry: DuctGeometry,
}

/// A spliced girder: a line of segments joined by closure joints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Girder {
    pub id: GirderId,
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub closures: Vec<ClosureJoint>,
    #[serde(default)]
    pub ducts: Vec<Duct>,
}

impl Girder {
    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    /// Closure joint hosted at a support, if any
    pub fn closure_at(&self, support: SupportRef) -> Option<&ClosureJoint> {
        self.closures.iter().find(|c| c.support == support)
    }
}

/// Segments and closure joints a duct physically passes through
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuctCrossings {
    pub segments: Vec<SegmentId>,
    pub closures: Vec<ClosureId>,
}

/// Why a duct path could not be resolved
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuctGeometryError {
    #[error("Duct {0} does not exist in the girder")]
    UnknownDuct(DuctIndex),

    #[error("Pier {0} referenced by a duct does not exist")]
    UnknownPier(PierId),

    #[error("Duct {0} has a circular offset reference")]
    CircularReference(DuctIndex),
}

// ============================================================================
// Bridge
// ============================================================================

/// Read-only structural description of the bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BridgeDescription {
    #[serde(default)]
    pub deck_type: DeckType,
    #[serde(default)]
    pub wearing_surface: WearingSurface,
    #[serde(default)]
    pub has_intermediate_diaphragms: bool,
    #[serde(default)]
    pub has_longitudinal_joints: bool,
    pub piers: Vec<Pier>,
    #[serde(default)]
    pub temporary_supports: Vec<TemporarySupport>,
    pub girders: Vec<Girder>,
}

impl BridgeDescription {
    pub fn has_deck(&self) -> bool {
        self.deck_type != DeckType::NoDeck
    }

    pub fn has_overlay(&self) -> bool {
        self.wearing_surface == WearingSurface::Overlay
    }

    pub fn pier(&self, id: PierId) -> Option<&Pier> {
        self.piers.iter().find(|p| p.id == id)
    }

    pub fn temporary_support(&self, id: SupportId) -> Option<&TemporarySupport> {
        self.temporary_supports.iter().find(|ts| ts.id == id)
    }

    pub fn girder(&self, id: GirderId) -> Option<&Girder> {
        self.girders.iter().find(|g| g.id == id)
    }

    /// Iterate every segment of every girder
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.girders.iter().flat_map(|g| g.segments.iter())
    }

    /// Iterate every closure joint of every girder
    pub fn closures(&self) -> impl Iterator<Item = &ClosureJoint> {
        self.girders.iter().flat_map(|g| g.closures.iter())
    }

    pub fn find_segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments().find(|s| s.id == id)
    }

    pub fn find_closure(&self, id: ClosureId) -> Option<&ClosureJoint> {
        self.closures().find(|c| c.id == id)
    }

    /// Number of spans (one fewer than the number of piers)
    pub fn span_count(&self) -> usize {
        self.piers.len().saturating_sub(1)
    }

    /// Station range `(start, end)` of a span
    pub fn span_range(&self, span: usize) -> Option<(f64, f64)> {
        let start = self.piers.get(span)?.station;
        let end = self.piers.get(span + 1)?.station;
        Some((start, end))
    }

    /// Segments of a girder lying (at least partly) within a span.
    ///
    /// `None` selects every span or every girder.
    pub fn segments_in(&self, span: Option<usize>, girder: Option<usize>) -> Vec<SegmentId> {
        let girders: Vec<&Girder> = match girder {
            Some(idx) => self.girders.get(idx).into_iter().collect(),
            None => self.girders.iter().collect(),
        };

        let range = span.map(|s| self.span_range(s));

        girders
            .into_iter()
            .flat_map(|g| g.segments.iter())
            .filter(|seg| match range {
                None => true,
                Some(None) => false,
                Some(Some((start, end))) => seg.overlaps(start, end),
            })
            .map(|seg| seg.id)
            .collect()
    }

    /// Resolve which segments and closures a duct crosses.
    pub fn duct_crossings(&self, girder: &Girder, duct: DuctIndex) -> Result<DuctCrossings, DuctGeometryError> {
        let mut visited = Vec::new();
        let mut current = duct;

        // Walk offset references down to a duct with its own path
        let geometry = loop {
            if visited.contains(&current) {
                return Err(DuctGeometryError::CircularReference(duct));
            }
            visited.push(current);

            let d = girder.ducts.get(current).ok_or(DuctGeometryError::UnknownDuct(current))?;
            match &d.geometry {
                DuctGeometry::Offset { reference_duct } => current = *reference_duct,
                other => break other,
            }
        };

        match geometry {
            DuctGeometry::Parabolic { start_pier, end_pier } => {
                let start = self
                    .pier(*start_pier)
                    .ok_or(DuctGeometryError::UnknownPier(*start_pier))?
                    .station;
                let end = self
                    .pier(*end_pier)
                    .ok_or(DuctGeometryError::UnknownPier(*end_pier))?
                    .station;

                let segments: Vec<SegmentId> = girder
                    .segments
                    .iter()
                    .filter(|s| s.overlaps(start, end))
                    .map(|s| s.id)
                    .collect();
                let closures = girder
                    .closures
                    .iter()
                    .filter(|c| segments.contains(&c.left_segment) && segments.contains(&c.right_segment))
                    .map(|c| c.id)
                    .collect();

                Ok(DuctCrossings { segments, closures })
            }
            _ => Ok(DuctCrossings {
                segments: girder.segments.iter().map(|s| s.id).collect(),
                closures: girder.closures.iter().map(|c| c.id).collect(),
            }),
        }
    }

    /// Two-span spliced girder used by `timeline_cli new` and the test suites.
    ///
    /// Three piers at stations 0, 100 and 200; an erection tower at 50 and a
    /// strongback at 150; one girder of three segments joined by closure
    /// joints over the temporary supports; one full-length duct, one duct
    /// draped over span 1 and one duct offset from the full-length duct.
    pub fn sample_two_span() -> Self {
        BridgeDescription {
            deck_type: DeckType::CastInPlace,
            wearing_surface: WearingSurface::SacrificialDepth,
            has_intermediate_diaphragms: false,
            has_longitudinal_joints: false,
            piers: vec![
                Pier { id: PierId(0), station: 0.0 },
                Pier { id: PierId(1), station: 100.0 },
                Pier { id: PierId(2), station: 200.0 },
            ],
            temporary_supports: vec![
                TemporarySupport {
                    id: SupportId(0),
                    station: 50.0,
                    kind: TemporarySupportKind::ErectionTower,
                },
                TemporarySupport {
                    id: SupportId(1),
                    station: 150.0,
                    kind: TemporarySupportKind::StrongBack,
                },
            ],
            girders: vec![Girder {
                id: GirderId(0),
                segments: vec![
                    Segment {
                        id: SegmentId(0),
                        start_station: 0.0,
                        end_station: 50.0,
                        supports: vec![SupportRef::Pier(PierId(0)), SupportRef::TemporarySupport(SupportId(0))],
                    },
                    Segment {
                        id: SegmentId(1),
                        start_station: 50.0,
                        end_station: 150.0,
                        supports: vec![SupportRef::TemporarySupport(SupportId(0)), SupportRef::Pier(PierId(1))],
                    },
                    Segment {
                        id: SegmentId(2),
                        start_station: 150.0,
                        end_station: 200.0,
                        supports: vec![SupportRef::TemporarySupport(SupportId(1)), SupportRef::Pier(PierId(2))],
                    },
                ],
                closures: vec![
                    ClosureJoint {
                        id: ClosureId(0),
                        support: SupportRef::TemporarySupport(SupportId(0)),
                        left_segment: SegmentId(0),
                        right_segment: SegmentId(1),
                    },
                    ClosureJoint {
                        id: ClosureId(1),
                        support: SupportRef::TemporarySupport(SupportId(1)),
                        left_segment: SegmentId(1),
                        right_segment: SegmentId(2),
                    },
                ],
                ducts: vec![
                    Duct { geometry: DuctGeometry::Linear },
                    Duct {
                        geometry: DuctGeometry::Parabolic {
                            start_pier: PierId(0),
                            end_pier: PierId(1),
                        },
                    },
                    Duct {
                        geometry: DuctGeometry::Offset { reference_duct: 0 },
                    },
                ],
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_lookup() {
        let bridge = BridgeDescription::sample_two_span();
        assert_eq!(bridge.span_count(), 2);
        assert!(bridge.has_deck());
        assert!(!bridge.has_overlay());
        assert_eq!(bridge.find_segment(SegmentId(1)).unwrap().end_station, 150.0);
        assert_eq!(
            bridge.find_closure(ClosureId(1)).unwrap().support,
            SupportRef::TemporarySupport(SupportId(1))
        );
        assert!(bridge.find_segment(SegmentId(9)).is_none());
    }

    #[test]
    fn test_segments_in_span() {
        let bridge = BridgeDescription::sample_two_span();
        assert_eq!(bridge.segments_in(Some(0), Some(0)), vec![SegmentId(0), SegmentId(1)]);
        assert_eq!(bridge.segments_in(Some(1), None), vec![SegmentId(1), SegmentId(2)]);
        assert_eq!(bridge.segments_in(None, None).len(), 3);
        assert!(bridge.segments_in(Some(5), None).is_empty());
        assert!(bridge.segments_in(None, Some(3)).is_empty());
    }

    #[test]
    fn test_linear_duct_crosses_everything() {
        let bridge = BridgeDescription::sample_two_span();
        let girder = &bridge.girders[0];
        let crossings = bridge.duct_crossings(girder, 0).unwrap();
        assert_eq!(crossings.segments.len(), 3);
        assert_eq!(crossings.closures, vec![ClosureId(0), ClosureId(1)]);
    }

    #[test]
    fn test_parabolic_duct_crossings() {
        let bridge = BridgeDescription::sample_two_span();
        let girder = &bridge.girders[0];
        let crossings = bridge.duct_crossings(girder, 1).unwrap();
        assert_eq!(crossings.segments, vec![SegmentId(0), SegmentId(1)]);
        assert_eq!(crossings.closures, vec![ClosureId(0)]);
    }

    #[test]
    fn test_offset_duct_follows_reference() {
        let bridge = BridgeDescription::sample_two_span();
        let girder = &bridge.girders[0];
        assert_eq!(
            bridge.duct_crossings(girder, 2).unwrap(),
            bridge.duct_crossings(girder, 0).unwrap()
        );
    }

    #[test]
    fn test_bad_duct_geometry() {
        let bridge = BridgeDescription::sample_two_span();
        let mut girder = bridge.girders[0].clone();
        girder.ducts[0].geometry = DuctGeometry::Offset { reference_duct: 2 };
        assert_eq!(
            bridge.duct_crossings(&girder, 2),
            Err(DuctGeometryError::CircularReference(2))
        );
        assert_eq!(bridge.duct_crossings(&girder, 7), Err(DuctGeometryError::UnknownDuct(7)));

        girder.ducts[1].geometry = DuctGeometry::Parabolic {
            start_pier: PierId(0),
            end_pier: PierId(42),
        };
        assert_eq!(
            bridge.duct_crossings(&girder, 1),
            Err(DuctGeometryError::UnknownPier(PierId(42)))
        );
    }

    #[test]
    fn test_bridge_serialization() {
        let bridge = BridgeDescription::sample_two_span();
        let json = serde_json::to_string(&bridge).unwrap();
        let roundtrip: BridgeDescription = serde_json::from_str(&json).unwrap();
        assert_eq!(bridge, roundtrip);
    }
}
