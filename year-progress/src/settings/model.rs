//! Settings record and partial updates

use super::color::HexColor;
use crate::config;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Display settings shared by the in-app dot grid and the live wallpaper.
///
/// Every field is always present. Missing fields in stored data fall back
/// to their defaults when deserialized, so records written by older app
/// versions still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DotSettings {
    pub dot_size: u32,
    pub dot_spacing: u32,
    pub top_padding: u32,
    pub grid_cols: u32,
    pub completed_color: HexColor,
    pub today_color: HexColor,
    pub future_color: HexColor,
    /// Pulse animation on the current day's dot
    pub show_today_highlight: bool,
    /// Reserved, not used by the grid layout yet
    pub start_week_on_sunday: bool,
}

impl Default for DotSettings {
    fn default() -> Self {
        Self {
            dot_size: config::DEFAULT_DOT_SIZE,
            dot_spacing: config::DEFAULT_DOT_SPACING,
            top_padding: config::DEFAULT_TOP_PADDING,
            grid_cols: config::DEFAULT_GRID_COLS,
            completed_color: HexColor::from_static(config::DEFAULT_COMPLETED_COLOR),
            today_color: HexColor::from_static(config::DEFAULT_TODAY_COLOR),
            future_color: HexColor::from_static(config::DEFAULT_FUTURE_COLOR),
            show_today_highlight: config::DEFAULT_SHOW_TODAY_HIGHLIGHT,
            start_week_on_sunday: config::DEFAULT_START_WEEK_ON_SUNDAY,
        }
    }
}

impl DotSettings {
    /// Overlay a stored JSON record onto the defaults one field at a time.
    ///
    /// A field whose value does not fit (wrong type, `null`, bad color) is
    /// logged and keeps its default; the other stored fields still apply.
    /// Only a document that is not a JSON object is an error.
    pub fn from_stored_json(content: &str) -> Result<Self> {
        let stored: Map<String, Value> = serde_json::from_str(content)?;
        let mut merged = match serde_json::to_value(Self::default())? {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        for (key, value) in stored {
            let previous = merged.insert(key.clone(), value);
            if let Err(e) = serde_json::from_value::<Self>(Value::Object(merged.clone())) {
                tracing::warn!("Ignoring stored setting {}: {}", key, e);
                match previous {
                    Some(previous) => merged.insert(key, previous),
                    None => merged.remove(&key),
                };
            }
        }

        Ok(serde_json::from_value(Value::Object(merged))?)
    }

    /// New record with the patch's fields replacing this record's
    pub fn merged(&self, patch: &SettingsPatch) -> Self {
        let patch = patch.clone();
        Self {
            dot_size: patch.dot_size.unwrap_or(self.dot_size),
            dot_spacing: patch.dot_spacing.unwrap_or(self.dot_spacing),
            top_padding: patch.top_padding.unwrap_or(self.top_padding),
            grid_cols: patch.grid_cols.unwrap_or(self.grid_cols),
            completed_color: patch
                .completed_color
                .unwrap_or_else(|| self.completed_color.clone()),
            today_color: patch
                .today_color
                .unwrap_or_else(|| self.today_color.clone()),
            future_color: patch
                .future_color
                .unwrap_or_else(|| self.future_color.clone()),
            show_today_highlight: patch
                .show_today_highlight
                .unwrap_or(self.show_today_highlight),
            start_week_on_sunday: patch
                .start_week_on_sunday
                .unwrap_or(self.start_week_on_sunday),
        }
    }
}

/// Partial settings change; `None` fields keep their previous value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dot_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dot_spacing: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_padding: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_cols: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_color: Option<HexColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub today_color: Option<HexColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub future_color: Option<HexColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_today_highlight: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_week_on_sunday: Option<bool>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
