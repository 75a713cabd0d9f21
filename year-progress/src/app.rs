//! Application state and initialization
//!
//! This module builds the single settings store for the session and hands
//! it to the UI through `AppState`. Nothing here is global; consumers get
//! the state passed in.

use crate::config::{AppConfig, SHARED_PREFS_NAMESPACE};
use crate::error::Result;
use crate::services::SettingsStore;
use crate::storage::{JsonFileStore, KeyValueStore, SharedPreferences};
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub settings: Arc<SettingsStore>,
}

impl AppState {
    pub fn new(config: AppConfig, settings: Arc<SettingsStore>) -> Self {
        Self { config, settings }
    }
}

/// Shared preference backend the platform's wallpaper reads
fn platform_shared_preferences(config: &AppConfig) -> Arc<dyn SharedPreferences> {
    #[cfg(target_os = "windows")]
    {
        let _ = config;
        Arc::new(crate::platform::RegistrySharedPreferences::new(
            SHARED_PREFS_NAMESPACE,
        ))
    }
    #[cfg(not(target_os = "windows"))]
    {
        Arc::new(crate::storage::XmlSharedPreferences::new(
            &config.shared_prefs_dir,
            SHARED_PREFS_NAMESPACE,
        ))
    }
}

/// Application setup - called once on startup
pub async fn setup(config: AppConfig) -> Result<AppState> {
    let app_store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(config.app_store_path()));
    let shared_prefs = platform_shared_preferences(&config);
    setup_with(config, app_store, shared_prefs).await
}

/// Setup with explicit storage backends
pub async fn setup_with(
    config: AppConfig,
    app_store: Arc<dyn KeyValueStore>,
    shared_prefs: Arc<dyn SharedPreferences>,
) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("App data directory: {:?}", config.data_dir);

    // Create necessary directories
    tokio::fs::create_dir_all(&config.data_dir).await?;
    tokio::fs::create_dir_all(&config.shared_prefs_dir).await?;

    let settings = Arc::new(SettingsStore::new(app_store, shared_prefs));
    settings.load().await;

    tracing::info!(
        "Application initialized, mirroring settings to namespace {}",
        settings.namespace()
    );

    Ok(AppState::new(config, settings))
}
