//! Completion state of each day-dot

use super::color::HexColor;
use super::model::DotSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DotState {
    Completed,
    Today,
    Future,
}

impl DotState {
    /// State of 1-based `day` when today is day `today`
    pub fn classify(day: u32, today: u32) -> Self {
        match day.cmp(&today) {
            std::cmp::Ordering::Less => DotState::Completed,
            std::cmp::Ordering::Equal => DotState::Today,
            std::cmp::Ordering::Greater => DotState::Future,
        }
    }
}

/// States for days `1..=total_days`, in order
pub fn dot_states(total_days: u32, today: u32) -> impl Iterator<Item = DotState> {
    (1..=total_days).map(move |day| DotState::classify(day, today))
}

impl DotSettings {
    /// Color for a dot. Today falls back to the completed color when the
    /// highlight is switched off.
    pub fn dot_color(&self, state: DotState) -> &HexColor {
        match state {
            DotState::Completed => &self.completed_color,
            DotState::Today if self.show_today_highlight => &self.today_color,
            DotState::Today => &self.completed_color,
            DotState::Future => &self.future_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(DotState::classify(1, 10), DotState::Completed);
        assert_eq!(DotState::classify(10, 10), DotState::Today);
        assert_eq!(DotState::classify(11, 10), DotState::Future);
    }

    #[test]
    fn test_dot_states_cover_year() {
        let states: Vec<_> = dot_states(366, 60).collect();
        assert_eq!(states.len(), 366);
        assert_eq!(states.iter().filter(|s| **s == DotState::Completed).count(), 59);
        assert_eq!(states[59], DotState::Today);
        assert_eq!(states.iter().filter(|s| **s == DotState::Future).count(), 306);
    }

    #[test]
    fn test_today_color_respects_highlight_toggle() {
        let mut settings = DotSettings::default();
        assert_eq!(settings.dot_color(DotState::Today), &settings.today_color);

        settings.show_today_highlight = false;
        assert_eq!(settings.dot_color(DotState::Today), &settings.completed_color);
        assert_eq!(settings.dot_color(DotState::Future), &settings.future_color);
    }
}
