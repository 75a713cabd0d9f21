//! Application configuration constants
//!
//! Central location for storage keys, default settings values,
//! and the validation boundaries applied by the settings commands.

use crate::error::{AppError, Result};
use std::path::PathBuf;

// ===== Storage Keys =====

/// Key under which the full settings record is stored in the app-local store
pub const SETTINGS_KEY: &str = "@year_progress_settings";

/// File name of the app-local key/value store inside the data directory
pub const APP_STORE_FILE: &str = "app_store.json";

/// Shared preference namespace opened by the live wallpaper service
pub const SHARED_PREFS_NAMESPACE: &str = "YearProgressPrefs";

/// Registry key under HKEY_CURRENT_USER holding mirrored namespaces (Windows)
pub const REGISTRY_ROOT_KEY: &str = "Software\\YearProgress";

// ===== Default Settings =====

pub const DEFAULT_DOT_SIZE: u32 = 10;
pub const DEFAULT_DOT_SPACING: u32 = 6;
pub const DEFAULT_TOP_PADDING: u32 = 100;
pub const DEFAULT_GRID_COLS: u32 = 15;
pub const DEFAULT_COMPLETED_COLOR: &str = "#FFFFFF";
pub const DEFAULT_TODAY_COLOR: &str = "#FF6B35";
pub const DEFAULT_FUTURE_COLOR: &str = "#2A2A2A";
pub const DEFAULT_SHOW_TODAY_HIGHLIGHT: bool = true;
pub const DEFAULT_START_WEEK_ON_SUNDAY: bool = false;

// ===== Appearance Limits =====

/// Minimum dot size in pixels (smaller dots are unreadable on a wallpaper)
pub const MIN_DOT_SIZE: u32 = 6;
/// Maximum dot size in pixels
pub const MAX_DOT_SIZE: u32 = 16;

/// Minimum gap between dots in pixels
pub const MIN_DOT_SPACING: u32 = 2;
/// Maximum gap between dots in pixels
pub const MAX_DOT_SPACING: u32 = 12;

/// Minimum offset from the top of the rendering surface
pub const MIN_TOP_PADDING: u32 = 0;
/// Maximum offset from the top of the rendering surface
pub const MAX_TOP_PADDING: u32 = 300;
/// Top padding slider moves in steps of this many pixels
pub const TOP_PADDING_STEP: u32 = 10;

/// Minimum grid columns (one week per row)
pub const MIN_GRID_COLS: u32 = 7;
/// Maximum grid columns (one month per row)
pub const MAX_GRID_COLS: u32 = 31;

// ===== Runtime Configuration =====

/// Environment variable overriding the app data directory
pub const DATA_DIR_ENV: &str = "YEAR_PROGRESS_DATA_DIR";

/// Environment variable overriding the shared preferences directory
pub const SHARED_PREFS_DIR_ENV: &str = "YEAR_PROGRESS_SHARED_PREFS_DIR";

/// Filesystem locations resolved at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the app-local store
    pub data_dir: PathBuf,
    /// Directory holding `<namespace>.xml` shared preference files
    pub shared_prefs_dir: PathBuf,
}

impl AppConfig {
    /// Build a config rooted at `data_dir`, with shared preferences
    /// in its `shared_prefs` subdirectory.
    pub fn new(data_dir: PathBuf) -> Self {
        let shared_prefs_dir = data_dir.join("shared_prefs");
        Self {
            data_dir,
            shared_prefs_dir,
        }
    }

    /// Resolve directories from the environment, falling back to the
    /// platform data directory.
    pub fn from_env() -> Result<Self> {
        let data_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .map(|dir| dir.join("year-progress"))
                .ok_or_else(|| {
                    AppError::Generic("Failed to resolve platform data directory".to_string())
                })?,
        };

        let mut config = Self::new(data_dir);
        if let Some(dir) = std::env::var_os(SHARED_PREFS_DIR_ENV) {
            config.shared_prefs_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Path of the app-local store file
    pub fn app_store_path(&self) -> PathBuf {
        self.data_dir.join(APP_STORE_FILE)
    }
}
