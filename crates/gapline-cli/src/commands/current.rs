use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use clap::Args;
use gapline_core::{CurrentItemTracker, ReferenceZone};
use serde::Serialize;

use super::{load_config, CmdResult, LoadedSchedule};

#[derive(Args)]
pub struct CurrentArgs {
    /// Schedule document (JSON)
    pub file: PathBuf,
    /// Evaluate at this instant instead of now. RFC 3339, or a civil time
    /// (YYYY-MM-DDTHH:MM[:SS]) in the reference timezone.
    #[arg(long)]
    pub at: Option<String>,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct Output {
    at: String,
    zone: String,
    current: Vec<String>,
}

pub fn run(args: CurrentArgs, config_path: Option<&Path>) -> CmdResult {
    let config = load_config(config_path)?;
    let zone = ReferenceZone::resolve_or_local(&config.tracker.reference_timezone);
    let now = match &args.at {
        Some(raw) => parse_at(raw, zone)?,
        None => Utc::now(),
    };

    let schedule = LoadedSchedule::load(&args.file, 0.0)?;
    let tracker = CurrentItemTracker::new(
        config.tracker.reference_timezone.clone(),
        schedule.window.start,
        &schedule.items,
    );
    let current: Vec<String> = tracker
        .evaluate_in(zone, now)
        .into_iter()
        .filter(|(_, active)| *active)
        .map(|(handle, _)| schedule.label(handle.0))
        .collect();

    if args.json {
        let output = Output {
            at: now.to_rfc3339(),
            zone: zone.name(),
            current,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if current.is_empty() {
        println!("nothing is happening now");
    } else {
        for label in &current {
            println!("{label}");
        }
    }
    Ok(())
}

fn parse_at(raw: &str, zone: ReferenceZone) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let civil = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .map_err(|_| format!("cannot parse --at '{raw}'"))?;
    Ok(zone.to_instant(civil)?)
}
