//! Platform-specific functionality
//!
//! Shared preference backends that need direct OS API access.

#[cfg(target_os = "windows")]
pub mod registry;

#[cfg(target_os = "windows")]
pub use registry::*;
