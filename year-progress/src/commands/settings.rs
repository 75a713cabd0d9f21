//! Settings-related commands
//!
//! The validation boundary between UI input and the settings store.
//! Slider values are clamped to their ranges here and colors are checked
//! here; the store trusts what it is given.

use crate::app::AppState;
use crate::config;
use crate::error::Result;
use crate::settings::{DotSettings, HexColor, SettingsPatch};
use serde::{Deserialize, Serialize};

/// Which of the three dot colors a color command targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorField {
    Completed,
    Today,
    Future,
}

fn clamp_setting(name: &str, value: u32, min: u32, max: u32) -> u32 {
    let clamped = value.clamp(min, max);
    if clamped != value {
        tracing::debug!("{} {} clamped to {}", name, value, clamped);
    }
    clamped
}

// ===== Reading =====

/// Get the current settings record
pub fn get_settings(state: &AppState) -> DotSettings {
    state.settings.current()
}

/// Whether the startup load is still running; UI shows nothing derived
/// from settings until this is false
pub fn is_settings_loading(state: &AppState) -> bool {
    state.settings.is_loading()
}

// ===== Appearance =====

pub fn set_dot_size(state: &AppState, value: u32) -> DotSettings {
    let dot_size = clamp_setting("dotSize", value, config::MIN_DOT_SIZE, config::MAX_DOT_SIZE);
    state.settings.update(SettingsPatch {
        dot_size: Some(dot_size),
        ..Default::default()
    })
}

pub fn set_dot_spacing(state: &AppState, value: u32) -> DotSettings {
    let dot_spacing = clamp_setting(
        "dotSpacing",
        value,
        config::MIN_DOT_SPACING,
        config::MAX_DOT_SPACING,
    );
    state.settings.update(SettingsPatch {
        dot_spacing: Some(dot_spacing),
        ..Default::default()
    })
}

/// Set the top padding, snapped to the slider step
pub fn set_top_padding(state: &AppState, value: u32) -> DotSettings {
    let step = config::TOP_PADDING_STEP;
    let snapped = value.saturating_add(step / 2) / step * step;
    let top_padding = clamp_setting(
        "topPadding",
        snapped,
        config::MIN_TOP_PADDING,
        config::MAX_TOP_PADDING,
    );
    state.settings.update(SettingsPatch {
        top_padding: Some(top_padding),
        ..Default::default()
    })
}

pub fn set_grid_cols(state: &AppState, value: u32) -> DotSettings {
    let grid_cols = clamp_setting("gridCols", value, config::MIN_GRID_COLS, config::MAX_GRID_COLS);
    state.settings.update(SettingsPatch {
        grid_cols: Some(grid_cols),
        ..Default::default()
    })
}

// ===== Colors =====

/// Set one of the dot colors from user input.
///
/// Input that is not `#RRGGBB` is rejected and the previous color stays.
pub fn set_color(state: &AppState, field: ColorField, value: &str) -> Result<DotSettings> {
    let color = HexColor::parse(value.trim()).map_err(|e| {
        tracing::debug!("Rejected {:?} color input {:?}", field, value);
        e
    })?;

    let patch = match field {
        ColorField::Completed => SettingsPatch {
            completed_color: Some(color),
            ..Default::default()
        },
        ColorField::Today => SettingsPatch {
            today_color: Some(color),
            ..Default::default()
        },
        ColorField::Future => SettingsPatch {
            future_color: Some(color),
            ..Default::default()
        },
    };

    Ok(state.settings.update(patch))
}

// ===== Behavior =====

pub fn set_show_today_highlight(state: &AppState, enabled: bool) -> DotSettings {
    state.settings.update(SettingsPatch {
        show_today_highlight: Some(enabled),
        ..Default::default()
    })
}

pub fn set_start_week_on_sunday(state: &AppState, enabled: bool) -> DotSettings {
    state.settings.update(SettingsPatch {
        start_week_on_sunday: Some(enabled),
        ..Default::default()
    })
}

/// Reset every setting to its default
pub fn reset_to_defaults(state: &AppState) -> DotSettings {
    state.settings.reset()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::SettingsStore;
    use crate::storage::{MemoryKeyValueStore, MemorySharedPreferences};
    use std::path::PathBuf;
    use std::sync::Arc;

    async fn create_test_state() -> AppState {
        let settings = SettingsStore::new(
            Arc::new(MemoryKeyValueStore::new()),
            Arc::new(MemorySharedPreferences::new("TestPrefs")),
        );
        settings.load().await;
        AppState::new(
            config::AppConfig::new(PathBuf::from("/tmp/year-progress-test")),
            Arc::new(settings),
        )
    }

    #[tokio::test]
    async fn test_slider_values_clamped() {
        let state = create_test_state().await;

        assert_eq!(set_dot_size(&state, 40).dot_size, config::MAX_DOT_SIZE);
        assert_eq!(set_dot_size(&state, 1).dot_size, config::MIN_DOT_SIZE);
        assert_eq!(set_dot_size(&state, 12).dot_size, 12);
        assert_eq!(set_dot_spacing(&state, 0).dot_spacing, config::MIN_DOT_SPACING);
        assert_eq!(set_grid_cols(&state, 100).grid_cols, config::MAX_GRID_COLS);
        assert_eq!(set_grid_cols(&state, 3).grid_cols, config::MIN_GRID_COLS);
    }

    #[tokio::test]
    async fn test_top_padding_snaps_to_step() {
        let state = create_test_state().await;

        assert_eq!(set_top_padding(&state, 44).top_padding, 40);
        assert_eq!(set_top_padding(&state, 45).top_padding, 50);
        assert_eq!(set_top_padding(&state, 999).top_padding, config::MAX_TOP_PADDING);
        assert_eq!(set_top_padding(&state, u32::MAX).top_padding, config::MAX_TOP_PADDING);
        assert_eq!(set_top_padding(&state, 0).top_padding, 0);
    }

    #[tokio::test]
    async fn test_invalid_color_rejected_and_previous_kept() {
        let state = create_test_state().await;
        let before = get_settings(&state);

        let result = set_color(&state, ColorField::Completed, "red");

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(get_settings(&state).completed_color, before.completed_color);
        assert_eq!(get_settings(&state), before);
    }

    #[tokio::test]
    async fn test_valid_colors_applied_to_their_field() {
        let state = create_test_state().await;

        set_color(&state, ColorField::Today, "#A55EEA").unwrap();
        set_color(&state, ColorField::Future, " #4b7bec ").unwrap();

        let settings = get_settings(&state);
        assert_eq!(settings.today_color.as_str(), "#A55EEA");
        assert_eq!(settings.future_color.as_str(), "#4b7bec");
        assert_eq!(settings.completed_color, DotSettings::default().completed_color);
    }

    #[tokio::test]
    async fn test_toggles_and_reset() {
        let state = create_test_state().await;
        assert!(!is_settings_loading(&state));

        set_show_today_highlight(&state, false);
        let settings = set_start_week_on_sunday(&state, true);
        assert!(!settings.show_today_highlight);
        assert!(settings.start_week_on_sunday);

        assert_eq!(reset_to_defaults(&state), DotSettings::default());
        assert_eq!(get_settings(&state), DotSettings::default());
    }
}
