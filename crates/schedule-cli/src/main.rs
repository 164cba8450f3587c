//! `schedule` CLI — place tasks, list free time, and audit calendars from JSON.
//!
//! ## Usage
//!
//! ```sh
//! # Place every open task (stdin → stdout)
//! cat week.json | schedule plan --now 2026-03-16T08:00:00Z
//!
//! # Custom working hours, output to a file
//! schedule --config hours.json plan -i week.json -o placements.json
//!
//! # Free slots of one day, at least 45 minutes long
//! schedule slots --date 2026-03-16 --min 45 -i week.json
//!
//! # Check persisted placements against freshly synced events
//! schedule audit -i week.json
//!
//! # Has the day rolled over since the last run?
//! schedule stale --last-run 2026-03-15T18:00:00Z
//! ```
//!
//! Input documents look like
//! `{"tasks": [...], "events": [...], "recurring": [...]}`; every key is optional.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use schedule_engine::{
    audit_scheduled, expand_to_busy, find_daily_slots, needs_rescheduling, schedule_batch,
    BusyInterval, ExternalEvent, Recurrence, SchedulerConfig, Task,
};
use serde::Deserialize;
use std::io::{self, Read};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "schedule",
    version,
    about = "Place tasks into working hours around calendar events"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Scheduler configuration as JSON (working hours, lookahead)
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule all open tasks and print their placements
    Plan {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Current instant, RFC 3339 (defaults to the system clock)
        #[arg(long)]
        now: Option<String>,
    },
    /// List free slots within the working hours of one day
    Slots {
        /// Day to inspect (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Minimum slot length in minutes (defaults to the configured minimum)
        #[arg(long)]
        min: Option<i64>,
    },
    /// Report persisted task placements that collide with events or each other
    Audit {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Print whether a run at --last-run is from an earlier day
    Stale {
        /// Time of the last scheduling run, RFC 3339
        #[arg(long)]
        last_run: String,
        /// Current instant, RFC 3339 (defaults to the system clock)
        #[arg(long)]
        now: Option<String>,
    },
}

/// The JSON document every input-reading subcommand accepts.
#[derive(Debug, Default, Deserialize)]
struct CalendarInput {
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    events: Vec<ExternalEvent>,
    #[serde(default)]
    recurring: Vec<Recurrence>,
}

impl CalendarInput {
    fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw).context("Failed to parse input JSON")
    }

    /// Fixed events plus expanded recurrences.
    fn busy(&self) -> Result<Vec<BusyInterval>> {
        let mut busy: Vec<BusyInterval> =
            self.events.iter().cloned().map(BusyInterval::Fixed).collect();
        busy.extend(expand_to_busy(&self.recurring).context("Failed to expand recurring events")?);
        Ok(busy)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("schedule_engine=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Plan { input, output, now } => {
            let calendar = CalendarInput::parse(&read_input(input.as_deref())?)?;
            let now = parse_now(now.as_deref())?;
            let busy = calendar.busy()?;

            let schedule = schedule_batch(&calendar.tasks, &busy, &config, now)
                .context("Failed to schedule tasks")?;
            for late in schedule.late() {
                eprintln!(
                    "warning: task {} could not meet its deadline, placed at {}",
                    late.task_id,
                    late.slot.start.to_rfc3339()
                );
            }

            let json = serde_json::to_string_pretty(&schedule)?;
            write_output(output.as_deref(), &json)?;
        }
        Commands::Slots { date, input, min } => {
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .with_context(|| format!("Invalid date: {}", date))?;
            let calendar = CalendarInput::parse(&read_input(input.as_deref())?)?;
            let busy = calendar.busy()?;
            let hours = &config.working_hours;

            let slots = if hours.is_working_day(date) {
                let (day_start, _) = hours.day_window_on(date);
                find_daily_slots(hours, day_start, &busy, min.unwrap_or(config.min_slot_minutes))
            } else {
                Vec::new()
            };
            println!("{}", serde_json::to_string_pretty(&slots)?);
        }
        Commands::Audit { input } => {
            let calendar = CalendarInput::parse(&read_input(input.as_deref())?)?;
            let busy = calendar.busy()?;

            let conflicts = audit_scheduled(&calendar.tasks, &busy);
            println!("{}", serde_json::to_string_pretty(&conflicts)?);
            if !conflicts.is_empty() {
                eprintln!("{} conflict(s) found", conflicts.len());
                process::exit(1);
            }
        }
        Commands::Stale { last_run, now } => {
            let last_run = parse_instant(&last_run)?;
            let now = parse_now(now.as_deref())?;
            println!(
                "{}",
                needs_rescheduling(last_run, now, &config.working_hours)
            );
        }
    }

    Ok(())
}

fn load_config(path: Option<&str>) -> Result<SchedulerConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path))?;
            serde_json::from_str(&raw).with_context(|| format!("Invalid config: {}", path))
        }
        None => Ok(SchedulerConfig::default()),
    }
}

/// The only place the system clock is read.
fn parse_now(raw: Option<&str>) -> Result<DateTime<Utc>> {
    match raw {
        Some(raw) => parse_instant(raw),
        None => Ok(Utc::now()),
    }
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid RFC 3339 timestamp: {}", raw))
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
