//! Parameter settings - per-device presentation records for surface controls
//!
//! Settings are organised by device (plugin) name. Each device carries a color
//! palette and a set of per-parameter records; the empty device name is the
//! global default device. [`SettingsEngine`] merges the embedded defaults with
//! the user's file and answers lookups through a fixed fallback chain.

mod color;
mod device;
mod document;
mod engine;
mod label;
mod overrides;
mod param;

use std::path::PathBuf;
use thiserror::Error;

pub use color::{Color, ColorRole, ColorValue, PaletteColor, Rgba};
pub use device::{positional_key, DeviceEntry};
pub use document::{DeviceDocument, SettingsDocument, DEFAULT_SETTINGS};
pub use engine::{plugin_name_from_focus, ParamSource, ResolvedParam, SettingsEngine};
pub use label::{strip_label, STRIP_LABEL_THRESHOLD};
pub use overrides::{OverrideKey, SettingOverrides};
pub use param::{ParamSetting, PotMode};

/// Errors raised while loading, saving or editing settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write settings file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings from {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("unknown device: '{0}'")]
    UnknownDevice(String),

    #[error("device already exists: '{0}'")]
    DuplicateDevice(String),

    #[error("no user settings file configured")]
    NoUserFile,
}

pub type SettingsResult<T> = Result<T, SettingsError>;
