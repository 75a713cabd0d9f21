//! Settings mirror for the live wallpaper
//!
//! Flattens the settings record into one string value per field and writes
//! them into the shared preference namespace the wallpaper service reads.
//! The mirror is one-way: the wallpaper never writes back, and nothing
//! tells it when a mirror has finished.
//!
//! Encoding: numbers as decimal strings (`"20"`), booleans as `"true"` /
//! `"false"`, colors unchanged (`"#FF6B35"`). Readers treat a missing or
//! unparsable key as that field's default.

use crate::error::Result;
use crate::settings::{DotSettings, HexColor};
use crate::storage::SharedPreferences;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

/// Shared preference key names, one per settings field
pub mod keys {
    pub const DOT_SIZE: &str = "dotSize";
    pub const DOT_SPACING: &str = "dotSpacing";
    pub const TOP_PADDING: &str = "topPadding";
    pub const GRID_COLS: &str = "gridCols";
    pub const COMPLETED_COLOR: &str = "completedColor";
    pub const TODAY_COLOR: &str = "todayColor";
    pub const FUTURE_COLOR: &str = "futureColor";
    pub const SHOW_TODAY_HIGHLIGHT: &str = "showTodayHighlight";
    pub const START_WEEK_ON_SUNDAY: &str = "startWeekOnSunday";

    pub const ALL: [&str; 9] = [
        DOT_SIZE,
        DOT_SPACING,
        TOP_PADDING,
        GRID_COLS,
        COMPLETED_COLOR,
        TODAY_COLOR,
        FUTURE_COLOR,
        SHOW_TODAY_HIGHLIGHT,
        START_WEEK_ON_SUNDAY,
    ];
}

#[derive(Clone)]
pub struct SyncBridge {
    prefs: Arc<dyn SharedPreferences>,
}

impl SyncBridge {
    pub fn new(prefs: Arc<dyn SharedPreferences>) -> Self {
        Self { prefs }
    }

    pub fn namespace(&self) -> &str {
        self.prefs.namespace()
    }

    /// One `(key, value)` entry per settings field
    pub fn encode(settings: &DotSettings) -> Vec<(&'static str, String)> {
        vec![
            (keys::DOT_SIZE, settings.dot_size.to_string()),
            (keys::DOT_SPACING, settings.dot_spacing.to_string()),
            (keys::TOP_PADDING, settings.top_padding.to_string()),
            (keys::GRID_COLS, settings.grid_cols.to_string()),
            (keys::COMPLETED_COLOR, settings.completed_color.to_string()),
            (keys::TODAY_COLOR, settings.today_color.to_string()),
            (keys::FUTURE_COLOR, settings.future_color.to_string()),
            (
                keys::SHOW_TODAY_HIGHLIGHT,
                settings.show_today_highlight.to_string(),
            ),
            (
                keys::START_WEEK_ON_SUNDAY,
                settings.start_week_on_sunday.to_string(),
            ),
        ]
    }

    /// Rebuild settings the way the wallpaper reads them
    pub fn decode(entries: &BTreeMap<String, String>) -> DotSettings {
        let defaults = DotSettings::default();
        DotSettings {
            dot_size: field(entries, keys::DOT_SIZE).unwrap_or(defaults.dot_size),
            dot_spacing: field(entries, keys::DOT_SPACING).unwrap_or(defaults.dot_spacing),
            top_padding: field(entries, keys::TOP_PADDING).unwrap_or(defaults.top_padding),
            grid_cols: field(entries, keys::GRID_COLS).unwrap_or(defaults.grid_cols),
            completed_color: field::<HexColor>(entries, keys::COMPLETED_COLOR)
                .unwrap_or(defaults.completed_color),
            today_color: field::<HexColor>(entries, keys::TODAY_COLOR)
                .unwrap_or(defaults.today_color),
            future_color: field::<HexColor>(entries, keys::FUTURE_COLOR)
                .unwrap_or(defaults.future_color),
            show_today_highlight: field(entries, keys::SHOW_TODAY_HIGHLIGHT)
                .unwrap_or(defaults.show_today_highlight),
            start_week_on_sunday: field(entries, keys::START_WEEK_ON_SUNDAY)
                .unwrap_or(defaults.start_week_on_sunday),
        }
    }

    /// Write every field into the shared namespace
    pub async fn mirror(&self, settings: &DotSettings) -> Result<()> {
        let entries = Self::encode(settings);
        self.prefs.put_strings(&entries).await?;
        tracing::debug!(
            "Mirrored {} settings to shared namespace {}",
            entries.len(),
            self.namespace()
        );
        Ok(())
    }

    /// Drop every key, including ones no current field writes
    pub async fn clear(&self) -> Result<()> {
        self.prefs.clear().await?;
        tracing::debug!("Cleared shared namespace {}", self.namespace());
        Ok(())
    }

    /// Settings as currently visible to the wallpaper
    pub async fn read_back(&self) -> Result<DotSettings> {
        let entries = self.prefs.get_all().await?;
        Ok(Self::decode(&entries))
    }
}

fn field<T: FromStr>(entries: &BTreeMap<String, String>, key: &str) -> Option<T> {
    let raw = entries.get(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring unparsable shared preference {}={:?}", key, raw);
            None
        }
    }
}
