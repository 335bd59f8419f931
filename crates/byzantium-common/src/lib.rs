//! Shared types for the Byzantium node daemons.
//!
//! This crate contains:
//! - **Settings**: the TOML-backed settings store and the typed snapshot
//!   built from it once at process start
//! - **Models**: interface roles, spectrum bands and wireless operating modes

pub mod models;
pub mod settings;

pub use models::{InterfaceRole, OperatingMode, Spectrum};
pub use settings::{Settings, SettingsError, SettingsStore};
