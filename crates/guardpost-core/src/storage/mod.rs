pub mod migrations;
pub mod patrol_db;

pub use patrol_db::PatrolDb;

use std::path::PathBuf;

/// Returns `~/.config/guardpost[-dev]/` based on GUARDPOST_ENV.
///
/// Set GUARDPOST_ENV=dev to use the development data directory, or
/// GUARDPOST_CONFIG_DIR to force an explicit directory (used by tests).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Ok(dir) = std::env::var("GUARDPOST_CONFIG_DIR") {
        let dir = PathBuf::from(dir);
        std::fs::create_dir_all(&dir)?;
        return Ok(dir);
    }

    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("GUARDPOST_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("guardpost-dev")
    } else {
        base_dir.join("guardpost")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
