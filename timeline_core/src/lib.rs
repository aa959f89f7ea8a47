//! # timeline_core - Construction Timeline Engine
//!
//! `timeline_core` models the construction sequence of a spliced precast
//! girder bridge: a day-ordered list of events, each switching on a set of
//! activities (erect piers, erect segments, cast closure joints, stress
//! tendons, cast the deck, apply loads and so on). It schedules those
//! events, keeps each bridge element owned by at most one event, and audits
//! the whole sequence against the bridge.
//!
//! ## Design Philosophy
//!
//! - **Ids, not pointers**: events and loads refer to bridge elements by id;
//!   the bridge is passed in by reference where it is needed
//! - **JSON-First**: all model types implement Serialize/Deserialize
//! - **Rich Errors**: placement failures, validation flags and I/O errors
//!   are structured types, not strings
//!
//! ## Quick Start
//!
//! ```rust
//! use timeline_core::project::Project;
//! use timeline_core::timeline::TimelineErrors;
//!
//! let mut project = Project::sample().unwrap();
//! assert!(project.validate().is_valid());
//!
//! // open the bridge to traffic before the deck is cast
//! project.timeline.set_live_load_event_by_index(None).unwrap();
//! let report = project.validate();
//! assert!(report.errors.contains(TimelineErrors::LIVELOAD_ACTIVITY_REQUIRED));
//! ```
//!
//! ## Modules
//!
//! - [`project`] - Project container, metadata, and scheduling settings
//! - [`bridge`] - Read-only bridge topology (piers, supports, segments, ducts)
//! - [`event`] - Timeline events and their activity slots
//! - [`activities`] - The ten construction activities
//! - [`timeline`] - Ordering, ownership queries and validation
//! - [`loads`] - User-defined point, distributed and moment loads
//! - [`errors`] - Structured error types
//! - [`file_io`] - File operations with atomic saves and locking

pub mod activities;
pub mod bridge;
pub mod errors;
pub mod event;
#[cfg(not(target_arch = "wasm32"))]
pub mod file_io;
pub mod ids;
pub mod loads;
pub mod project;
pub mod timeline;

pub use errors::{PlacementError, TimelineError, TimelineResult};
#[cfg(not(target_arch = "wasm32"))]
pub use file_io::{load_project, save_project, FileLock};
pub use project::{Project, ProjectMetadata, ScheduleSettings};
pub use timeline::{TimelineErrors, TimelineManager, ValidationReport};
