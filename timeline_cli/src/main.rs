//! # Splice CLI Application
//!
//! Command-line front end for `.sgt` schedule files: create a sample
//! schedule, list its events, validate it against its bridge, re-sort it and
//! repair orphaned loads.
//!
//! Logging goes to stderr and is controlled with `RUST_LOG` (default `info`).

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use timeline_core::file_io::{load_project, save_project, FileLock};
use timeline_core::project::Project;
use timeline_core::{TimelineError, TimelineResult};

#[derive(Debug, Parser)]
#[command(name = "timeline_cli", about = "Inspect, validate and repair bridge construction timelines")]
struct Cli {
    /// User recorded in the lock file while a schedule is being rewritten
    #[arg(long, global = true, env = "USER", default_value = "unknown")]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a sample two-span spliced girder schedule
    New {
        path: PathBuf,
    },

    /// Print the event table
    Show {
        path: PathBuf,
    },

    /// Audit the timeline; exits with status 1 when it is not valid
    Validate {
        path: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-sort the events, reflow overlaps and save
    Sort {
        path: PathBuf,
    },

    /// Delete loads no event applies and save
    FixLoads {
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!(code = e.error_code(), "{}", e);
            if let Some(hint) = retry_hint(&e) {
                warn!("{}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn retry_hint(e: &TimelineError) -> Option<&'static str> {
    e.is_recoverable()
        .then_some("Another user has the schedule open; try again once they close it")
}

fn run(cli: &Cli) -> TimelineResult<ExitCode> {
    match &cli.command {
        Command::New { path } => {
            let project = Project::sample()?;
            with_lock(path, &cli.user, || save_project(&project, path))?;
            println!("Wrote sample schedule to {}", path.display());
        }

        Command::Show { path } => {
            let project = load_project(path)?;
            print_events(&project);
        }

        Command::Validate { path, json } => {
            let project = load_project(path)?;
            let report = project.validate();
            if *json {
                let text = serde_json::to_string_pretty(&report)
                    .map_err(|e| TimelineError::SerializationError { reason: e.to_string() })?;
                println!("{}", text);
            } else if report.is_valid() {
                println!("Timeline is valid");
            } else {
                for line in report.messages() {
                    println!("{}", line);
                }
            }
            if !report.is_valid() {
                return Ok(ExitCode::from(1));
            }
        }

        Command::Sort { path } => {
            let mut project = load_project(path)?;
            let reflow = project.timeline.sort();
            if reflow.is_empty() {
                println!("Timeline already in order");
                return Ok(ExitCode::SUCCESS);
            }
            for shift in &reflow.shifted {
                println!(
                    "Moved \"{}\" from day {} to day {}",
                    shift.description, shift.from_day, shift.to_day
                );
            }
            for (event, kind) in &reflow.cleared {
                let owner = event.map(|id| id.to_string()).unwrap_or_else(|| "?".to_string());
                println!("Cleared {} from event {}", kind.label(), owner);
            }
            project.touch();
            with_lock(path, &cli.user, || save_project(&project, path))?;
            info!(max_delay = reflow.max_delay(), "Sorted timeline");
        }

        Command::FixLoads { path } => {
            let mut project = load_project(path)?;
            match project.fix_bad_loads() {
                Some(report) => {
                    println!("{}", report);
                    with_lock(path, &cli.user, || save_project(&project, path))?;
                }
                None => println!("All loads are applied by an event"),
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Hold the schedule's lock for the duration of `f`
fn with_lock<T>(path: &Path, user: &str, f: impl FnOnce() -> TimelineResult<T>) -> TimelineResult<T> {
    let _lock = FileLock::acquire(path, user)?;
    f()
}

fn print_events(project: &Project) {
    let timeline = &project.timeline;
    println!(
        "{} ({}) - {} events",
        project.meta.bridge_name,
        project.meta.job_id,
        timeline.event_count()
    );
    println!("{:>4}  {:>8}  {:>8}  {:<40}  Activities", "#", "Day", "Days", "Description");
    for (index, event) in timeline.events().iter().enumerate() {
        let duration = timeline.duration(index).unwrap_or(0.0);
        println!(
            "{:>4}  {:>8.1}  {:>8.1}  {:<40}  {}",
            index + 1,
            event.day(),
            duration,
            event.description(),
            event.activity_labels().join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_hint_only_for_locked_files() {
        let locked = TimelineError::file_locked("bridge.sgt", "ana", "2026-10-18T09:00:00Z");
        assert!(retry_hint(&locked).is_some());

        let missing = TimelineError::file_error("read", "bridge.sgt", "not found");
        assert_eq!(retry_hint(&missing), None);
    }

    #[test]
    fn test_cli_parses_validate() {
        let cli = Cli::try_parse_from(["timeline_cli", "--user", "ana", "validate", "b.sgt", "--json"]).unwrap();
        assert_eq!(cli.user, "ana");
        assert!(matches!(cli.command, Command::Validate { json: true, .. }));
    }
}
