//! Settings service
//!
//! Owns the live settings record for the app session and keeps both
//! persistence targets in step with it:
//! - the app store, which is read back on the next launch
//! - the shared preference namespace, which the live wallpaper reads
//!
//! The in-memory record changes synchronously; writes happen afterwards on
//! the background writer and never block or fail the caller. A crash before
//! a write lands loses that change; the next mutation or launch rewrites
//! the full record.

use crate::config::SETTINGS_KEY;
use crate::services::persistence::PersistenceQueue;
use crate::services::sync_bridge::SyncBridge;
use crate::settings::{DotSettings, SettingsPatch};
use crate::storage::{KeyValueStore, SharedPreferences};
use std::sync::Arc;
use tokio::sync::watch;

/// Settings store for one app session.
///
/// Lifecycle: `new` -> `load` -> any number of `update` / `reset`.
/// Until `load` completes, `is_loading` is true and `current` holds
/// defaults that UI should not render from.
pub struct SettingsStore {
    app_store: Arc<dyn KeyValueStore>,
    bridge: SyncBridge,
    queue: PersistenceQueue,
    settings: watch::Sender<DotSettings>,
    loading: watch::Sender<bool>,
}

impl SettingsStore {
    /// Create the store and start its writer on the current tokio runtime
    pub fn new(
        app_store: Arc<dyn KeyValueStore>,
        shared_prefs: Arc<dyn SharedPreferences>,
    ) -> Self {
        let bridge = SyncBridge::new(shared_prefs);
        let queue = PersistenceQueue::spawn(app_store.clone(), bridge.clone());
        let (settings, _) = watch::channel(DotSettings::default());
        let (loading, _) = watch::channel(true);

        Self {
            app_store,
            bridge,
            queue,
            settings,
            loading,
        }
    }

    /// Load settings from the app store, falling back to defaults.
    ///
    /// Never fails: unreadable or corrupt data is logged and replaced by
    /// defaults. Afterwards the wallpaper namespace is re-mirrored so it
    /// matches what was loaded, even if it was missing or stale.
    pub async fn load(&self) -> DotSettings {
        // Anything still queued must land before we read it back
        self.queue.flush().await;

        let loaded = self.read_stored().await;
        self.settings.send_replace(loaded.clone());
        self.loading.send_replace(false);
        self.queue.mirror(loaded.clone());

        tracing::info!("Settings loaded");
        loaded
    }

    async fn read_stored(&self) -> DotSettings {
        let content = match self.app_store.get_item(SETTINGS_KEY).await {
            Ok(Some(content)) => content,
            Ok(None) => {
                tracing::info!("No stored settings found, using defaults");
                return DotSettings::default();
            }
            Err(e) => {
                tracing::error!("Failed to read stored settings, using defaults: {}", e);
                return DotSettings::default();
            }
        };

        match DotSettings::from_stored_json(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to parse stored settings, using defaults: {}", e);
                DotSettings::default()
            }
        }
    }

    /// Merge `patch` into the current record and persist the result.
    ///
    /// The new record is visible to readers as soon as this returns.
    pub fn update(&self, patch: SettingsPatch) -> DotSettings {
        if *self.loading.borrow() {
            tracing::warn!("Settings updated before load completed");
        }

        self.settings.send_modify(|current| *current = current.merged(&patch));
        let updated = self.current();
        self.queue.save(updated.clone());

        tracing::debug!("Settings updated: {:?}", patch);
        updated
    }

    /// Restore defaults: clears both stores, then mirrors the defaults.
    ///
    /// Keys left in the shared namespace by older versions are dropped too.
    pub fn reset(&self) -> DotSettings {
        let defaults = DotSettings::default();
        self.settings.send_replace(defaults.clone());
        self.queue.clear();
        self.queue.mirror(defaults.clone());

        tracing::info!("Settings reset to defaults");
        defaults
    }

    pub fn current(&self) -> DotSettings {
        self.settings.borrow().clone()
    }

    /// Receiver notified on every settings change
    pub fn subscribe(&self) -> watch::Receiver<DotSettings> {
        self.settings.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub async fn wait_until_loaded(&self) {
        let mut loading = self.loading.subscribe();
        // The sender lives in self, so the channel cannot close while we wait
        let _ = loading.wait_for(|loading| !*loading).await;
    }

    /// Wait for every write queued so far to finish (or fail)
    pub async fn flush(&self) {
        self.queue.flush().await;
    }

    /// Shared namespace the wallpaper reads
    pub fn namespace(&self) -> &str {
        self.bridge.namespace()
    }

    /// Settings as the wallpaper currently sees them
    pub async fn mirrored(&self) -> crate::error::Result<DotSettings> {
        self.bridge.read_back().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::HexColor;
    use crate::storage::{MemoryKeyValueStore, MemorySharedPreferences};

    struct Harness {
        store: SettingsStore,
        app_store: Arc<MemoryKeyValueStore>,
        prefs: Arc<MemorySharedPreferences>,
    }

    fn create_test_store() -> Harness {
        let app_store = Arc::new(MemoryKeyValueStore::new());
        let prefs = Arc::new(MemorySharedPreferences::new("TestPrefs"));
        let store = SettingsStore::new(app_store.clone(), prefs.clone());
        Harness {
            store,
            app_store,
            prefs,
        }
    }

    async fn stored_settings(app_store: &MemoryKeyValueStore) -> Option<DotSettings> {
        app_store
            .get_item(SETTINGS_KEY)
            .await
            .unwrap()
            .map(|json| serde_json::from_str(&json).unwrap())
    }

    #[tokio::test]
    async fn test_fresh_install_loads_defaults_and_mirrors() {
        let h = create_test_store();
        assert!(h.store.is_loading());

        let loaded = h.store.load().await;
        assert_eq!(loaded, DotSettings::default());
        assert!(!h.store.is_loading());

        h.store.flush().await;
        let mirrored = h.prefs.get_all().await.unwrap();
        assert_eq!(mirrored.len(), 9);
        assert_eq!(mirrored["dotSize"], "10");
        assert_eq!(mirrored["showTodayHighlight"], "true");
        assert_eq!(h.store.mirrored().await.unwrap(), DotSettings::default());
    }

    #[tokio::test]
    async fn test_update_dot_size_scenario() {
        let h = create_test_store();
        h.store.load().await;
        let before = h.store.current();
        assert_eq!(before.dot_size, 10);

        let updated = h.store.update(SettingsPatch {
            dot_size: Some(20),
            ..Default::default()
        });

        // Visible immediately, before any write completes
        assert_eq!(h.store.current().dot_size, 20);
        assert_eq!(
            updated,
            DotSettings {
                dot_size: 20,
                ..before
            }
        );

        h.store.flush().await;
        assert_eq!(stored_settings(&h.app_store).await.unwrap().dot_size, 20);
        assert_eq!(
            h.prefs.get_string("dotSize").await.unwrap().as_deref(),
            Some("20")
        );
    }

    #[tokio::test]
    async fn test_sequential_updates_merge() {
        let h = create_test_store();
        h.store.load().await;

        h.store.update(SettingsPatch {
            grid_cols: Some(7),
            ..Default::default()
        });
        h.store.update(SettingsPatch {
            today_color: Some(HexColor::parse("#1E90FF").unwrap()),
            show_today_highlight: Some(false),
            ..Default::default()
        });

        let current = h.store.current();
        assert_eq!(current.grid_cols, 7);
        assert_eq!(current.today_color.as_str(), "#1E90FF");
        assert!(!current.show_today_highlight);
        assert_eq!(current.dot_size, DotSettings::default().dot_size);

        h.store.flush().await;
        assert_eq!(stored_settings(&h.app_store).await.unwrap(), current);
        assert_eq!(h.store.mirrored().await.unwrap(), current);
    }

    #[tokio::test]
    async fn test_load_restores_stored_record() {
        let h = create_test_store();
        let stored = DotSettings {
            dot_spacing: 12,
            future_color: HexColor::parse("#4A4A4A").unwrap(),
            ..DotSettings::default()
        };
        h.app_store
            .set_item(SETTINGS_KEY, &serde_json::to_string(&stored).unwrap())
            .await
            .unwrap();

        assert_eq!(h.store.load().await, stored);
        assert_eq!(h.store.current(), stored);
    }

    #[tokio::test]
    async fn test_load_fills_fields_missing_from_old_record() {
        let h = create_test_store();
        h.app_store
            .set_item(
                SETTINGS_KEY,
                r##"{"dotSize":8,"dotSpacing":2,"completedColor":"#E8E8E8"}"##,
            )
            .await
            .unwrap();

        let loaded = h.store.load().await;
        let defaults = DotSettings::default();

        assert_eq!(loaded.dot_size, 8);
        assert_eq!(loaded.dot_spacing, 2);
        assert_eq!(loaded.completed_color.as_str(), "#E8E8E8");
        assert_eq!(loaded.grid_cols, defaults.grid_cols);
        assert_eq!(loaded.top_padding, defaults.top_padding);
        assert_eq!(loaded.today_color, defaults.today_color);

        // The wallpaper gets the filled-in values too
        h.store.flush().await;
        assert_eq!(
            h.prefs.get_string("gridCols").await.unwrap().as_deref(),
            Some("15")
        );
    }

    #[tokio::test]
    async fn test_load_skips_malformed_fields_only() {
        let h = create_test_store();
        h.app_store
            .set_item(
                SETTINGS_KEY,
                r##"{"dotSize":14,"gridCols":31,"completedColor":"#2ED573","dotSpacing":4.5}"##,
            )
            .await
            .unwrap();

        let loaded = h.store.load().await;

        assert_eq!(loaded.dot_size, 14);
        assert_eq!(loaded.grid_cols, 31);
        assert_eq!(loaded.completed_color.as_str(), "#2ED573");
        assert_eq!(loaded.dot_spacing, DotSettings::default().dot_spacing);
    }

    #[tokio::test]
    async fn test_load_corrupt_record_falls_back_to_defaults() {
        let h = create_test_store();
        h.app_store
            .set_item(SETTINGS_KEY, "{\"dotSize\": ")
            .await
            .unwrap();

        assert_eq!(h.store.load().await, DotSettings::default());
        assert!(!h.store.is_loading());
    }

    #[tokio::test]
    async fn test_load_read_failure_falls_back_to_defaults() {
        let h = create_test_store();
        h.app_store.set_fail_reads(true);

        assert_eq!(h.store.load().await, DotSettings::default());
        assert!(!h.store.is_loading());
    }

    #[tokio::test]
    async fn test_reset_then_reload_yields_defaults() {
        let h = create_test_store();
        h.store.load().await;
        h.store.update(SettingsPatch {
            dot_size: Some(16),
            start_week_on_sunday: Some(true),
            ..Default::default()
        });

        let reset = h.store.reset();
        assert_eq!(reset, DotSettings::default());
        assert_eq!(h.store.current(), DotSettings::default());

        h.store.flush().await;
        assert_eq!(h.app_store.get_item(SETTINGS_KEY).await.unwrap(), None);
        assert_eq!(h.store.mirrored().await.unwrap(), DotSettings::default());

        // Simulated restart against the same backends
        let restarted = SettingsStore::new(h.app_store.clone(), h.prefs.clone());
        assert_eq!(restarted.load().await, DotSettings::default());
    }

    #[tokio::test]
    async fn test_reset_drops_stale_shared_keys() {
        let h = create_test_store();
        h.store.load().await;
        h.prefs
            .put_strings(&[("legacyTheme", "dark".to_string())])
            .await
            .unwrap();

        h.store.reset();
        h.store.flush().await;

        let mirrored = h.prefs.get_all().await.unwrap();
        assert_eq!(mirrored.len(), 9);
        assert!(!mirrored.contains_key("legacyTheme"));
        assert_eq!(mirrored["dotSize"], "10");
    }

    #[tokio::test]
    async fn test_write_failures_keep_in_memory_value() {
        let h = create_test_store();
        h.store.load().await;
        h.app_store.set_fail_writes(true);
        h.prefs.set_fail_writes(true);

        let updated = h.store.update(SettingsPatch {
            top_padding: Some(200),
            ..Default::default()
        });
        h.store.flush().await;

        assert_eq!(updated.top_padding, 200);
        assert_eq!(h.store.current().top_padding, 200);
        assert_eq!(stored_settings(&h.app_store).await, None);

        // Next mutation after recovery writes the whole record
        h.app_store.set_fail_writes(false);
        h.prefs.set_fail_writes(false);
        h.store.update(SettingsPatch {
            grid_cols: Some(20),
            ..Default::default()
        });
        h.store.flush().await;

        let stored = stored_settings(&h.app_store).await.unwrap();
        assert_eq!(stored.top_padding, 200);
        assert_eq!(stored.grid_cols, 20);
        assert_eq!(
            h.prefs.get_string("topPadding").await.unwrap().as_deref(),
            Some("200")
        );
    }

    #[tokio::test]
    async fn test_wait_until_loaded_and_subscribe() {
        let h = create_test_store();
        let mut changes = h.store.subscribe();

        h.store.load().await;
        h.store.wait_until_loaded().await;

        h.store.update(SettingsPatch {
            dot_spacing: Some(9),
            ..Default::default()
        });

        assert!(changes.has_changed().unwrap());
        assert_eq!(changes.borrow_and_update().dot_spacing, 9);
    }
}
