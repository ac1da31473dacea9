use std::path::Path;

use clap::Subcommand;
use gapline_core::Config;

use super::{config_path, load_config, CmdResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "tracker.reference_timezone", "compression.factor")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction, overridden: Option<&Path>) -> CmdResult {
    match action {
        ConfigAction::Get { key } => {
            let config = load_config(overridden)?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = load_config(overridden)?;
            config.set(&key, &value)?;
            config.save_to(&config_path(overridden)?)?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = load_config(overridden)?;
            for (key, value) in config.entries() {
                println!("{key} = {value}");
            }
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save_to(&config_path(overridden)?)?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
