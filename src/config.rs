//! Configuration management for MCU Bridge
//!
//! Loads the YAML application config. Every section has defaults, so an empty
//! file is a valid config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::mcu::ProtocolLayout;
use crate::mixer::{DEFAULT_DATA_DEBOUNCE_MS, DEFAULT_VALUE_DEBOUNCE_MS};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub midi: MidiConfig,
    pub protocol: ProtocolLayout,
    pub notify: NotifyConfig,
    pub settings: SettingsConfig,
}

/// MIDI port configuration; names are matched by substring
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MidiConfig {
    /// Surface input port; empty disables input
    pub input_port: String,
    /// Surface output port; empty leaves the output closed
    pub output_port: String,
}

/// Debounce windows of the change coalescer
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub data_changed_ms: u64,
    pub value_changed_ms: u64,
    /// Period of the tick task that fires expired timers
    pub tick_ms: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            data_changed_ms: DEFAULT_DATA_DEBOUNCE_MS,
            value_changed_ms: DEFAULT_VALUE_DEBOUNCE_MS,
            tick_ms: 5,
        }
    }
}

impl NotifyConfig {
    pub fn data_window(&self) -> Duration {
        Duration::from_millis(self.data_changed_ms)
    }

    pub fn value_window(&self) -> Duration {
        Duration::from_millis(self.value_changed_ms)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Parameter settings file location
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// User settings file; defaults to the application data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::parse(&contents)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Parse and validate YAML text
    pub fn parse(contents: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as an empty map
        let config: AppConfig = if contents.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(contents).context("Failed to parse YAML config")?
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        let p = &self.protocol;

        if p.channel_count == 0 || p.channel_count > 14 {
            anyhow::bail!(
                "protocol.channel_count must be between 1 and 14 (got {})",
                p.channel_count
            );
        }
        if usize::from(p.user_button_midi_base) + p.channel_count > 0x80 {
            anyhow::bail!(
                "protocol.user_button_midi_base 0x{:02X} leaves no room for {} user buttons",
                p.user_button_midi_base,
                p.channel_count
            );
        }
        if usize::from(p.user_page_midi_base) + p.max_user_pages > 0x80 {
            anyhow::bail!(
                "protocol.user_page_midi_base 0x{:02X} leaves no room for {} user pages",
                p.user_page_midi_base,
                p.max_user_pages
            );
        }

        if self.notify.tick_ms == 0 {
            anyhow::bail!("notify.tick_ms must be greater than 0");
        }

        Ok(())
    }
}
