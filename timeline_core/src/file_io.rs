//! # File I/O Module
//!
//! Reads and writes schedule files:
//! - **Atomic saves**: write to `.tmp`, fsync, rename over the target
//! - **File locking**: keep two planners from editing one schedule
//! - **Version checks**: refuse files written by a newer schema
//! - **Repair on load**: legacy timelines are normalized after parsing
//!
//! ## File Format
//!
//! Schedules are saved as `.sgt` files containing JSON. Lock files use the
//! `.sgt.lock` extension and record who holds the lock.
//!
//! ## Example
//!
//! ```rust,no_run
//! use timeline_core::file_io::{save_project, load_project, FileLock};
//! use timeline_core::project::Project;
//! use std::path::Path;
//!
//! let project = Project::sample().unwrap();
//! let path = Path::new("overpass.sgt");
//!
//! let lock = FileLock::acquire(path, "planner@company.com").unwrap();
//! save_project(&project, path).unwrap();
//! drop(lock);
//!
//! let reloaded = load_project(path).unwrap();
//! assert_eq!(reloaded.timeline.event_count(), project.timeline.event_count());
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{TimelineError, TimelineResult};
use crate::project::{Project, SCHEMA_VERSION};

/// Extension used for schedule files
pub const FILE_EXTENSION: &str = "sgt";

/// Lock file metadata stored in .sgt.lock files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (email or username)
    pub user_id: String,
    /// Machine name where lock was acquired
    pub machine: String,
    /// Process ID that holds the lock
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME").ok().or_else(|| std::env::var("HOST").ok())
    }
}

/// Exclusive lock on a schedule file, released on drop.
///
/// Holds an OS-level lock (fs2) on the `.lock` file and writes [`LockInfo`]
/// into it so other users can see who has the schedule open.
pub struct FileLock {
    project_path: PathBuf,
    lock_path: PathBuf,
    /// Keeps the OS lock alive
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire an exclusive lock on a schedule file.
    ///
    /// Returns [`TimelineError::FileLocked`] when a live process holds it.
    /// Stale locks (dead process, or older than a day) are taken over.
    ///
    /// ```rust,no_run
    /// use timeline_core::file_io::FileLock;
    /// use std::path::Path;
    ///
    /// let lock = FileLock::acquire(Path::new("overpass.sgt"), "planner@company.com")?;
    /// drop(lock);
    /// # Ok::<(), timeline_core::errors::TimelineError>(())
    /// ```
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> TimelineResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        if lock_path.exists() {
            if let Ok(existing) = read_lock_info(&lock_path) {
                if !is_lock_stale(&existing) {
                    return Err(TimelineError::file_locked(
                        path.display().to_string(),
                        format!("{} ({})", existing.user_id, existing.machine),
                        existing.locked_at.to_rfc3339(),
                    ));
                }
                warn!(
                    path = %path.display(),
                    holder = %existing.user_id,
                    "Taking over stale lock"
                );
            }
        }

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| TimelineError::file_error("create lock", lock_path.display().to_string(), e.to_string()))?;

        lock_file.try_lock_exclusive().map_err(|_| {
            TimelineError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;

        let lock_json = serde_json::to_string_pretty(&info).map_err(|e| TimelineError::SerializationError {
            reason: e.to_string(),
        })?;
        lock_file
            .write_all(lock_json.as_bytes())
            .map_err(|e| TimelineError::file_error("write lock", lock_path.display().to_string(), e.to_string()))?;
        lock_file
            .sync_all()
            .map_err(|e| TimelineError::file_error("sync lock", lock_path.display().to_string(), e.to_string()))?;

        debug!(path = %path.display(), user = %info.user_id, "Acquired file lock");
        Ok(FileLock {
            project_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Who holds the lock on `path`, if anyone
    pub fn check(path: &Path) -> Option<LockInfo> {
        let lock_path = lock_path_for(path);
        if !lock_path.exists() {
            return None;
        }
        read_lock_info(&lock_path).ok().filter(|info| !is_lock_stale(info))
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

fn lock_path_for(project_path: &Path) -> PathBuf {
    let mut lock_path = project_path.to_path_buf();
    let extension = lock_path
        .extension()
        .map(|e| format!("{}.lock", e.to_string_lossy()))
        .unwrap_or_else(|| "lock".to_string());
    lock_path.set_extension(extension);
    lock_path
}

fn read_lock_info(lock_path: &Path) -> TimelineResult<LockInfo> {
    let contents = read_to_string(lock_path, "read lock")?;
    serde_json::from_str(&contents).map_err(|e| TimelineError::SerializationError { reason: e.to_string() })
}

/// A lock is stale when its process is gone (same machine only) or it is
/// more than 24 hours old.
fn is_lock_stale(info: &LockInfo) -> bool {
    if hostname().as_deref() == Some(info.machine.as_str()) {
        #[cfg(windows)]
        {
            use std::process::Command;
            let output = Command::new("tasklist")
                .args(["/FI", &format!("PID eq {}", info.pid), "/NH"])
                .output();
            if let Ok(output) = output {
                let stdout = String::from_utf8_lossy(&output.stdout);
                if stdout.contains("No tasks") || !stdout.contains(&info.pid.to_string()) {
                    return true;
                }
            }
        }
        #[cfg(unix)]
        {
            if fs::metadata(format!("/proc/{}", info.pid)).is_err() {
                return true;
            }
        }
    }

    (Utc::now() - info.locked_at).num_hours() > 24
}

fn read_to_string(path: &Path, operation: &str) -> TimelineResult<String> {
    let mut file =
        File::open(path).map_err(|e| TimelineError::file_error(operation, path.display().to_string(), e.to_string()))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| TimelineError::file_error(operation, path.display().to_string(), e.to_string()))?;
    Ok(contents)
}

// ============================================================================
// Save / Load
// ============================================================================

/// Save a project with atomic write semantics.
///
/// The JSON goes to `<path>.tmp`, is synced to disk and then renamed over
/// `path`, so an interrupted save never leaves a truncated schedule behind.
pub fn save_project(project: &Project, path: &Path) -> TimelineResult<()> {
    let json = serde_json::to_string_pretty(project).map_err(|e| TimelineError::SerializationError {
        reason: e.to_string(),
    })?;

    let tmp_path = path.with_extension(format!("{}.tmp", FILE_EXTENSION));

    let mut tmp_file = File::create(&tmp_path)
        .map_err(|e| TimelineError::file_error("create temp file", tmp_path.display().to_string(), e.to_string()))?;
    tmp_file
        .write_all(json.as_bytes())
        .map_err(|e| TimelineError::file_error("write temp file", tmp_path.display().to_string(), e.to_string()))?;
    tmp_file
        .sync_all()
        .map_err(|e| TimelineError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string()))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        TimelineError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    info!(path = %path.display(), events = project.timeline.event_count(), "Saved schedule");
    Ok(())
}

/// Load a project from a `.sgt` file.
///
/// Fails with [`TimelineError::VersionMismatch`] for files from an
/// incompatible schema and [`TimelineError::SerializationError`] for bad
/// JSON. Legacy timelines are repaired; each repair is logged.
///
/// ```rust,no_run
/// use timeline_core::file_io::load_project;
/// use std::path::Path;
///
/// let project = load_project(Path::new("overpass.sgt"))?;
/// println!("Loaded schedule {}", project.meta.job_id);
/// # Ok::<(), timeline_core::errors::TimelineError>(())
/// ```
pub fn load_project(path: &Path) -> TimelineResult<Project> {
    let contents = read_to_string(path, "open")?;
    parse_project(&contents).map_err(|e| match e {
        TimelineError::SerializationError { reason } => TimelineError::SerializationError {
            reason: format!("Invalid JSON in {}: {}", path.display(), reason),
        },
        other => other,
    })
}

/// Parse and repair a project from JSON text
pub fn parse_project(json: &str) -> TimelineResult<Project> {
    let mut project: Project =
        serde_json::from_str(json).map_err(|e| TimelineError::SerializationError { reason: e.to_string() })?;

    validate_version(&project.meta.version)?;

    for note in project.normalize_loaded() {
        warn!(job_id = %project.meta.job_id, "{}", note);
    }
    Ok(project)
}

/// Load a project along with the current lock holder, if any.
///
/// A locked schedule still loads; callers should open it read-only.
pub fn load_project_with_lock_check(path: &Path) -> TimelineResult<(Project, Option<LockInfo>)> {
    let project = load_project(path)?;
    let lock_info = FileLock::check(path);
    Ok((project, lock_info))
}

/// Major versions must match; in 0.x a newer minor is also rejected.
fn validate_version(file_version: &str) -> TimelineResult<()> {
    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.parse().ok()).collect() };
    let file_parts = parse(file_version);
    let current_parts = parse(SCHEMA_VERSION);

    let mismatch = || TimelineError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let (Some(&file_major), Some(&current_major)) = (file_parts.first(), current_parts.first()) else {
        return Err(mismatch());
    };
    if file_major != current_major {
        return Err(mismatch());
    }
    if current_major == 0 {
        if let (Some(&file_minor), Some(&current_minor)) = (file_parts.get(1), current_parts.get(1)) {
            if file_minor > current_minor {
                return Err(mismatch());
            }
        }
    }
    Ok(())
}
