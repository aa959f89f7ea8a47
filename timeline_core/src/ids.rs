//! # Element Identifiers
//!
//! Strongly typed identifiers for every category of element the timeline
//! refers to. Each is a thin `u32` newtype that serializes as a bare number.
//!
//! Identifiers are stable for the life of the element they name and are never
//! reused while that element exists. "No element" is spelled `None` wherever an
//! identifier is optional.
//!
//! ## Example
//!
//! ```rust
//! use timeline_core::ids::{PierId, SegmentId};
//!
//! let pier = PierId(3);
//! let segment = SegmentId(3);
//! assert_eq!(pier.0, segment.0);
//! assert_eq!(pier.to_string(), "P3");
//! ```

use serde::{Deserialize, Serialize};

macro_rules! element_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                $name(value)
            }
        }
    };
}

element_id!(
    /// Permanent pier (including abutments)
    PierId,
    "P"
);

element_id!(
    /// Temporary support (erection tower or strongback)
    SupportId,
    "TS"
);

element_id!(
    /// Precast girder segment
    SegmentId,
    "S"
);

element_id!(
    /// Cast-in-place closure joint between two segments
    ClosureId,
    "CJ"
);

element_id!(
    /// Spliced girder (a line of segments)
    GirderId,
    "G"
);

element_id!(
    /// User-defined load
    LoadId,
    "L"
);

element_id!(
    /// Timeline event
    EventId,
    "E"
);

/// Index of a post-tensioning duct within its girder
pub type DuctIndex = usize;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        assert_eq!(PierId(0).to_string(), "P0");
        assert_eq!(SupportId(2).to_string(), "TS2");
        assert_eq!(ClosureId(7).to_string(), "CJ7");
        assert_eq!(EventId(12).to_string(), "E12");
    }

    #[test]
    fn test_id_serializes_transparently() {
        let json = serde_json::to_string(&SegmentId(42)).unwrap();
        assert_eq!(json, "42");

        let parsed: SegmentId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, SegmentId(42));
    }

    #[test]
    fn test_id_ordering() {
        let mut ids = vec![GirderId(3), GirderId(1), GirderId(2)];
        ids.sort();
        assert_eq!(ids, vec![GirderId(1), GirderId(2), GirderId(3)]);
    }
}
