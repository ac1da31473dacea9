use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clap::Args;
use gapline_core::{
    Clock, Event, MemorySurface, ReactivityController, ScheduleDocument, SystemClock, Trigger,
};
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::{load_config, CmdResult};

#[derive(Args)]
pub struct WatchArgs {
    /// Schedule document (JSON)
    pub file: PathBuf,
    /// Viewport width in pixels
    #[arg(long, default_value_t = 1920.0)]
    pub width: f64,
    /// Stop after this many tracker intervals (default: run until killed)
    #[arg(long)]
    pub ticks: Option<u32>,
}

pub fn run(args: WatchArgs, config_path: Option<&Path>) -> CmdResult {
    let config = load_config(config_path)?;
    let document = ScheduleDocument::load(&args.file)?;
    let interval = config.tick_interval();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    runtime.block_on(async move {
        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
        let surface = Arc::new(Mutex::new(MemorySurface::new(document, args.width)));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let Some(controller) = ReactivityController::init(surface, &config, clock) else {
            return Ok(());
        };
        let mut controller = controller
            .with_runtime(tokio::runtime::Handle::current())
            .with_event_sink(tx);
        controller.on_trigger(Trigger::Load);

        let deadline = args.ticks.map(|n| Instant::now() + interval * n);
        loop {
            let next = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, rx.recv()).await {
                    Ok(next) => next,
                    Err(_) => break,
                },
                None => rx.recv().await,
            };
            let Some(event) = next else { break };
            println!("{}", serde_json::to_string(&event)?);
        }

        controller.stop();
        while let Ok(event) = rx.try_recv() {
            println!("{}", serde_json::to_string(&event)?);
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
