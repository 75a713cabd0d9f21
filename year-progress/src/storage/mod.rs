//! Storage module
//!
//! The two places settings are persisted:
//! - `app_store`: the app-local key/value store, source of truth across restarts
//! - `shared_prefs`: the namespaced preference store read by the wallpaper process

pub mod app_store;
pub mod shared_prefs;

pub use app_store::{JsonFileStore, KeyValueStore, MemoryKeyValueStore};
pub use shared_prefs::{MemorySharedPreferences, SharedPreferences, XmlSharedPreferences};

use crate::error::Result;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Replace `path` with `data` so readers never observe a half-written file
pub(crate) async fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    // Write to temp file first, then rename over the target
    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&temp_path, path).await?;

    Ok(())
}
