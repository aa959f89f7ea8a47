//! # Error Types
//!
//! Structured error types for timeline_core. Two families live here:
//!
//! - [`PlacementError`] - returned synchronously when a single-event edit made
//!   in strict mode (`adjust_timeline == false`) would break the timeline.
//! - [`TimelineError`] - everything else that can fail: missing events or
//!   loads, file I/O, serialization and schema version problems.
//!
//! Consistency violations found by a full validation pass are *not* errors;
//! they are reported through [`crate::timeline::ValidationReport`].
//!
//! ## Example
//!
//! ```rust
//! use timeline_core::errors::{TimelineError, TimelineResult};
//!
//! fn check_day(day: f64) -> TimelineResult<()> {
//!     if day < 0.0 {
//!         return Err(TimelineError::invalid_input(
//!             "day",
//!             day.to_string(),
//!             "Event day cannot be negative",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_day(-1.0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::EventId;

/// Result type alias for timeline_core operations
pub type TimelineResult<T> = Result<T, TimelineError>;

/// Why an event could not be placed on the timeline.
///
/// When one of these is returned the timeline is left exactly as it was.
#[derive(Error, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlacementError {
    /// The event starts before the previous event's minimum elapsed time is over
    #[error("The event starts before the previous event has finished")]
    OverlapsPreviousEvent,

    /// The event's minimum elapsed time runs past the start of the next event
    #[error("The event does not finish before the next event starts")]
    OverrunsNextEvent,

    /// No event with the requested index or id exists
    #[error("The timeline event was not found")]
    EventNotFound,
}

impl PlacementError {
    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            PlacementError::OverlapsPreviousEvent => "OVERLAPS_PREVIOUS_EVENT",
            PlacementError::OverrunsNextEvent => "OVERRUNS_NEXT_EVENT",
            PlacementError::EventNotFound => "EVENT_NOT_FOUND",
        }
    }
}

/// Structured error type for timeline and load operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum TimelineError {
    /// An input value is invalid (out of range, wrong type, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// No event with this id exists on the timeline
    #[error("Timeline event not found: {event_id}")]
    EventNotFound { event_id: EventId },

    /// No event index in range
    #[error("Timeline event index {index} is out of range ({count} events)")]
    EventIndexOutOfRange { index: usize, count: usize },

    /// No user load with this id or index exists
    #[error("User load not found: {reference}")]
    LoadNotFound { reference: String },

    /// A placement check rejected the edit
    #[error("Placement rejected: {0}")]
    Placement(PlacementError),

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<PlacementError> for TimelineError {
    fn from(err: PlacementError) -> Self {
        TimelineError::Placement(err)
    }
}

impl TimelineError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        TimelineError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an EventNotFound error
    pub fn event_not_found(event_id: EventId) -> Self {
        TimelineError::EventNotFound { event_id }
    }

    /// Create a LoadNotFound error for a collection index
    pub fn load_index_not_found(kind: &str, index: usize) -> Self {
        TimelineError::LoadNotFound {
            reference: format!("{} load #{}", kind, index),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        TimelineError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        TimelineError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// True when the same operation may succeed if retried later
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TimelineError::FileLocked { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            TimelineError::InvalidInput { .. } => "INVALID_INPUT",
            TimelineError::EventNotFound { .. } => "EVENT_NOT_FOUND",
            TimelineError::EventIndexOutOfRange { .. } => "EVENT_INDEX_OUT_OF_RANGE",
            TimelineError::LoadNotFound { .. } => "LOAD_NOT_FOUND",
            TimelineError::Placement(err) => err.error_code(),
            TimelineError::FileError { .. } => "FILE_ERROR",
            TimelineError::FileLocked { .. } => "FILE_LOCKED",
            TimelineError::SerializationError { .. } => "SERIALIZATION_ERROR",
            TimelineError::VersionMismatch { .. } => "VERSION_MISMATCH",
            TimelineError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = TimelineError::invalid_input("day", "-5.0", "Event day cannot be negative");
        let json = serde_json::to_string(&error).unwrap();
        let roundtrip: TimelineError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(TimelineError::event_not_found(EventId(4)).error_code(), "EVENT_NOT_FOUND");
        assert_eq!(
            TimelineError::load_index_not_found("point", 1).error_code(),
            "LOAD_NOT_FOUND"
        );
        assert_eq!(
            TimelineError::from(PlacementError::OverrunsNextEvent).error_code(),
            "OVERRUNS_NEXT_EVENT"
        );
    }

    #[test]
    fn test_only_locks_are_recoverable() {
        assert!(TimelineError::file_locked("a.sgt", "ana", "2026-10-18T09:00:00Z").is_recoverable());
        assert!(!TimelineError::file_error("read", "a.sgt", "denied").is_recoverable());
        assert!(!TimelineError::from(PlacementError::OverlapsPreviousEvent).is_recoverable());
    }

    #[test]
    fn test_placement_error_display() {
        let msg = PlacementError::OverlapsPreviousEvent.to_string();
        assert!(msg.contains("previous event"));
    }
}
