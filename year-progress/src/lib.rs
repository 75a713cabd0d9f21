//! Year Progress library
//!
//! Settings persistence for the year progress dots app: the settings
//! record, its app-local store, and the mirror into the shared preference
//! namespace read by the live wallpaper.

pub mod app;
pub mod calendar;
pub mod commands;
pub mod config;
pub mod error;
#[cfg(target_os = "windows")]
pub mod platform;
pub mod services;
pub mod settings;
pub mod storage;
