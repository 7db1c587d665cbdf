//! Runtime configuration from the environment
//!
//! - `OIL_LIBRARY_DATABASE_PATH`: SQLite file; defaults to `data/oil_library.db`
//!   next to the project root
//! - `OIL_LIBRARY_THREADS`: size of the rayon pool used for estimation
//! - `OIL_LIBRARY_ESTIMATION_CONFIG`: JSON file overriding [`EstimationConfig`]

use std::path::PathBuf;

use tracing::info;

use crate::estimation::{ConfigError, EstimationConfig};

pub const DATABASE_PATH_VAR: &str = "OIL_LIBRARY_DATABASE_PATH";
pub const THREADS_VAR: &str = "OIL_LIBRARY_THREADS";
pub const ESTIMATION_CONFIG_VAR: &str = "OIL_LIBRARY_ESTIMATION_CONFIG";

/// Get the database path from environment or use default
pub fn database_path() -> PathBuf {
    std::env::var(DATABASE_PATH_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_database_path())
}

fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(parent) = path.parent() {
            if let Some(grandparent) = parent.parent() {
                path = grandparent.to_path_buf();
            }
        }
    }

    path.push("data");
    path.push("oil_library.db");
    path
}

/// Worker thread count for estimation; `None` leaves rayon's default
pub fn worker_threads() -> Option<usize> {
    parse_threads(std::env::var(THREADS_VAR).ok().as_deref())
}

fn parse_threads(value: Option<&str>) -> Option<usize> {
    value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
}

/// Estimation settings, from the configured JSON file or the defaults
pub fn estimation_config() -> Result<EstimationConfig, ConfigError> {
    match std::env::var(ESTIMATION_CONFIG_VAR) {
        Ok(path) => {
            info!("Loading estimation config from {}", path);
            EstimationConfig::from_json_file(path)
        }
        Err(_) => Ok(EstimationConfig::default()),
    }
}
