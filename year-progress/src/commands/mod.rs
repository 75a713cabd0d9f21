//! Commands exposed to the UI layer
//!
//! This module organizes commands into logical submodules:
//! - `settings`: reading and validated updates of display settings
//!
//! General commands (app info, year progress) live here.

pub mod settings;

use crate::app::AppState;
use crate::calendar::YearProgress;
use serde::Serialize;

// Re-export all commands for convenient registration by the UI shell
pub use settings::*;

// ===== General Commands =====

/// Progress through the current local year
pub fn get_year_progress() -> YearProgress {
    YearProgress::today()
}

/// Get application information
pub fn get_app_info(state: &AppState) -> AppInfo {
    AppInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        app_data_dir: state.config.data_dir.to_string_lossy().to_string(),
        shared_prefs_namespace: state.settings.namespace().to_string(),
    }
}

/// Application information structure
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    pub version: String,
    pub app_data_dir: String,
    pub shared_prefs_namespace: String,
}
