use std::path::{Path, PathBuf};

use clap::Args;
use gapline_core::extract_gaps;
use serde::Serialize;

use super::{load_config, CmdResult, LoadedSchedule};

#[derive(Args)]
pub struct GapsArgs {
    /// Schedule document (JSON)
    pub file: PathBuf,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct Row {
    start: String,
    end: String,
    minutes: f64,
    compressed_minutes: f64,
}

pub fn run(args: GapsArgs, config_path: Option<&Path>) -> CmdResult {
    let config = load_config(config_path)?;
    let policy = config.compression_policy();
    // Width does not affect gaps.
    let schedule = LoadedSchedule::load(&args.file, 0.0)?;

    let rows: Vec<Row> = extract_gaps(&schedule.items, &schedule.window)
        .iter()
        .map(|gap| Row {
            start: gap.start.to_rfc3339(),
            end: gap.end.to_rfc3339(),
            minutes: gap.duration_minutes(),
            compressed_minutes: policy.compress(gap.duration_minutes()),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("no idle gaps");
    }
    for row in &rows {
        println!(
            "{} -> {}  {:>7.1} min (drawn as {:.1})",
            row.start, row.end, row.minutes, row.compressed_minutes
        );
    }
    Ok(())
}
