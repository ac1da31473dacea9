mod config;

pub use config::{CompressionConfig, Config, LayoutConfig, TrackerConfig};

use std::path::PathBuf;

/// Returns `~/.config/gapline[-dev]/` based on GAPLINE_ENV.
///
/// Set GAPLINE_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("GAPLINE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("gapline-dev")
    } else {
        base_dir.join("gapline")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
