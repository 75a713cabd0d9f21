//! Settings model
//!
//! The settings record, partial updates, validated colors and the
//! day-dot coloring rules derived from them.

pub mod color;
pub mod dots;
pub mod model;

pub use color::HexColor;
pub use dots::{dot_states, DotState};
pub use model::{DotSettings, SettingsPatch};
