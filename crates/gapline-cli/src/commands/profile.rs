use clap::Args;
use gapline_core::ViewportProfile;

use super::CmdResult;

#[derive(Args)]
pub struct ProfileArgs {
    /// Viewport width in pixels
    #[arg(long)]
    pub width: f64,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ProfileArgs) -> CmdResult {
    let profile = ViewportProfile::for_width(args.width);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!("px_per_minute:    {}", profile.px_per_minute);
        println!("min_block_height: {}", profile.min_block_height);
        println!("min_gap:          {}", profile.min_gap);
        println!("max_gap:          {}", profile.max_gap);
    }
    Ok(())
}
