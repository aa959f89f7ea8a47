//! User-defined load records
//!
//! Point, distributed and moment loads entered by the user. Each targets a
//! span / girder selection ([`SpanKey`]) and belongs to one of the
//! [`UserLoadCase`]s. When a load is applied is not stored here; it is
//! recorded by the `ApplyLoad` activity of the owning timeline event.

use serde::{Deserialize, Serialize};

use crate::ids::LoadId;

// ============================================================================
// Load Case and Placement
// ============================================================================

/// Load case a user load contributes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UserLoadCase {
    /// Dead load of structural components
    #[default]
    DC,
    /// Dead load of wearing surfaces and utilities
    DW,
    /// Vehicular live load with impact
    #[serde(rename = "LLIM")]
    LLIM,
}

impl UserLoadCase {
    pub fn display_name(&self) -> &'static str {
        match self {
            UserLoadCase::DC => "DC",
            UserLoadCase::DW => "DW",
            UserLoadCase::LLIM => "LL+IM",
        }
    }
}

impl std::fmt::Display for UserLoadCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Span and girder a load is applied to. `None` selects all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct SpanKey {
    #[serde(default)]
    pub span: Option<usize>,
    #[serde(default)]
    pub girder: Option<usize>,
}

impl SpanKey {
    /// Every span of every girder
    pub const ALL: SpanKey = SpanKey { span: None, girder: None };

    pub fn new(span: Option<usize>, girder: Option<usize>) -> Self {
        SpanKey { span, girder }
    }

    /// True when the key selects girder `girder`
    pub fn includes_girder(&self, girder: usize) -> bool {
        self.girder.map_or(true, |g| g == girder)
    }

    pub fn span_label(&self) -> String {
        match self.span {
            None => "All Spans".to_string(),
            Some(span) => format!("Span {}", span + 1),
        }
    }

    pub fn girder_label(&self) -> String {
        match self.girder {
            None => "All Girders".to_string(),
            Some(girder) => format!("Girder {}", girder_letter(girder)),
        }
    }
}

/// Girders are labelled A, B, ... Z, AA, AB, ...
fn girder_letter(index: usize) -> String {
    let mut label = String::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        label.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    label
}

// ============================================================================
// Common Behaviour
// ============================================================================

/// Shared view of the three load kinds, used by the load manager
pub trait UserLoad: Clone + PartialEq {
    /// Label used in listings ("Point Load", ...)
    const KIND: &'static str;

    fn id(&self) -> LoadId;
    fn set_id(&mut self, id: LoadId);
    fn span_key(&self) -> SpanKey;
    fn load_case(&self) -> UserLoadCase;
    fn description(&self) -> &str;

    /// One-line summary: kind, span, girder and description
    fn summary(&self) -> String {
        let key = self.span_key();
        format!(
            "{}: {}, {}, {}",
            Self::KIND,
            key.span_label(),
            key.girder_label(),
            self.description()
        )
    }
}

macro_rules! user_load_impl {
    ($ty:ty, $kind:expr) => {
        impl UserLoad for $ty {
            const KIND: &'static str = $kind;

            fn id(&self) -> LoadId {
                self.id
            }

            fn set_id(&mut self, id: LoadId) {
                self.id = id;
            }

            fn span_key(&self) -> SpanKey {
                self.span_key
            }

            fn load_case(&self) -> UserLoadCase {
                self.load_case
            }

            fn description(&self) -> &str {
                &self.description
            }
        }
    };
}

// ============================================================================
// Load Kinds
// ============================================================================

/// Concentrated force
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointLoad {
    /// Assigned by the load manager
    #[serde(default)]
    pub id: LoadId,
    pub span_key: SpanKey,
    pub load_case: UserLoadCase,
    /// Distance from the start of the span, or a fraction of the span length
    pub location: f64,
    #[serde(default)]
    pub fractional: bool,
    /// Force (kip), positive upward
    pub magnitude: f64,
    #[serde(default)]
    pub description: String,
}

impl PointLoad {
    /// Point load at a fractional location along the span
    pub fn new(span_key: SpanKey, load_case: UserLoadCase, location: f64, magnitude: f64) -> Self {
        PointLoad {
            id: LoadId::default(),
            span_key,
            load_case,
            location,
            fractional: true,
            magnitude,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

user_load_impl!(PointLoad, "Point Load");

/// Shape of a distributed load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DistributedLoadKind {
    #[default]
    Uniform,
    Trapezoidal,
}

/// Line load over part or all of a span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributedLoad {
    #[serde(default)]
    pub id: LoadId,
    pub span_key: SpanKey,
    pub load_case: UserLoadCase,
    #[serde(default)]
    pub kind: DistributedLoadKind,
    pub start_location: f64,
    pub end_location: f64,
    #[serde(default)]
    pub fractional: bool,
    /// Intensity at the start (kip/ft)
    pub w_start: f64,
    /// Intensity at the end (kip/ft); equal to `w_start` for uniform loads
    pub w_end: f64,
    #[serde(default)]
    pub description: String,
}

impl DistributedLoad {
    /// Uniform load over the full span
    pub fn uniform(span_key: SpanKey, load_case: UserLoadCase, w: f64) -> Self {
        DistributedLoad {
            id: LoadId::default(),
            span_key,
            load_case,
            kind: DistributedLoadKind::Uniform,
            start_location: 0.0,
            end_location: 1.0,
            fractional: true,
            w_start: w,
            w_end: w,
            description: String::new(),
        }
    }

    /// Linearly varying load between two fractional locations
    pub fn trapezoidal(
        span_key: SpanKey,
        load_case: UserLoadCase,
        start_location: f64,
        end_location: f64,
        w_start: f64,
        w_end: f64,
    ) -> Self {
        DistributedLoad {
            id: LoadId::default(),
            span_key,
            load_case,
            kind: DistributedLoadKind::Trapezoidal,
            start_location,
            end_location,
            fractional: true,
            w_start,
            w_end,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

user_load_impl!(DistributedLoad, "Distributed Load");

/// Concentrated moment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentLoad {
    #[serde(default)]
    pub id: LoadId,
    pub span_key: SpanKey,
    pub load_case: UserLoadCase,
    pub location: f64,
    #[serde(default)]
    pub fractional: bool,
    /// Moment (kip-ft), counterclockwise positive
    pub magnitude: f64,
    #[serde(default)]
    pub description: String,
}

impl MomentLoad {
    pub fn new(span_key: SpanKey, load_case: UserLoadCase, location: f64, magnitude: f64) -> Self {
        MomentLoad {
            id: LoadId::default(),
            span_key,
            load_case,
            location,
            fractional: true,
            magnitude,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

user_load_impl!(MomentLoad, "Moment Load");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_key_labels() {
        assert_eq!(SpanKey::ALL.span_label(), "All Spans");
        assert_eq!(SpanKey::ALL.girder_label(), "All Girders");

        let key = SpanKey::new(Some(1), Some(2));
        assert_eq!(key.span_label(), "Span 2");
        assert_eq!(key.girder_label(), "Girder C");
        assert!(key.includes_girder(2));
        assert!(!key.includes_girder(0));
        assert!(SpanKey::ALL.includes_girder(7));
    }

    #[test]
    fn test_girder_letters() {
        assert_eq!(girder_letter(0), "A");
        assert_eq!(girder_letter(25), "Z");
        assert_eq!(girder_letter(26), "AA");
    }

    #[test]
    fn test_summary() {
        let load = PointLoad::new(SpanKey::new(Some(0), None), UserLoadCase::DW, 0.5, -2.0).with_description("Sign");
        assert_eq!(load.summary(), "Point Load: Span 1, All Girders, Sign");
    }

    #[test]
    fn test_load_case_serialization() {
        let json = serde_json::to_string(&UserLoadCase::LLIM).unwrap();
        assert_eq!(json, "\"LLIM\"");
        assert_eq!(UserLoadCase::LLIM.to_string(), "LL+IM");
    }
}
