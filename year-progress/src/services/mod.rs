//! Services module
//!
//! Settings lifecycle, the background writer and the wallpaper mirror.

pub mod persistence;
pub mod settings;
pub mod sync_bridge;

pub use persistence::PersistenceQueue;
pub use settings::SettingsStore;
pub use sync_bridge::SyncBridge;
