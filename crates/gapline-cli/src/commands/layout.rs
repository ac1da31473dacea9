use std::path::{Path, PathBuf};

use clap::Args;
use gapline_core::ViewportProfile;
use serde::Serialize;

use super::{load_config, CmdResult, LoadedSchedule};

#[derive(Args)]
pub struct LayoutArgs {
    /// Schedule document (JSON)
    pub file: PathBuf,
    /// Viewport width in pixels
    #[arg(long, default_value_t = 1920.0)]
    pub width: f64,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct Row<'a> {
    id: String,
    title: &'a str,
    start: String,
    end: String,
    top: f64,
    height: f64,
}

#[derive(Serialize)]
struct Output<'a> {
    profile: ViewportProfile,
    container_height: f64,
    items: Vec<Row<'a>>,
}

pub fn run(args: LayoutArgs, config_path: Option<&Path>) -> CmdResult {
    let config = load_config(config_path)?;
    let schedule = LoadedSchedule::load(&args.file, args.width)?;
    let profile = ViewportProfile::for_width(args.width);
    let layout = config
        .layout_engine()
        .layout(&schedule.items, &schedule.window, profile);

    let rows: Vec<Row> = layout
        .assignments
        .iter()
        .map(|a| Row {
            id: schedule.label(a.item.handle.0),
            title: schedule.title(a.item.handle.0),
            start: a.item.start.to_rfc3339(),
            end: a.item.end.to_rfc3339(),
            top: a.top,
            height: a.height,
        })
        .collect();

    if args.json {
        let output = Output {
            profile: layout.profile,
            container_height: layout.container_height,
            items: rows,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "viewport {}px: {} px/min, block >= {}px, gap {}..{}px",
        args.width, profile.px_per_minute, profile.min_block_height, profile.min_gap, profile.max_gap
    );
    for row in &rows {
        println!(
            "{:>8.1} {:>7.1}  {:<16} {}",
            row.top, row.height, row.id, row.title
        );
    }
    println!("container height: {:.1}px", layout.container_height);
    Ok(())
}
