//! On-disk settings document
//!
//! The document is a list of device blocks. It is read twice at load time:
//! once from the defaults compiled into the binary, once from the user's file,
//! whose device blocks replace same-named defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

use super::color::PaletteColor;
use super::param::ParamSetting;
use super::{SettingsError, SettingsResult};

/// Default settings compiled into the binary
pub const DEFAULT_SETTINGS: &str = include_str!("../../resources/default-settings.yaml");

/// Current document format version
pub const DOCUMENT_VERSION: u32 = 1;

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

/// Root of a settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub devices: Vec<DeviceDocument>,
}

/// One device block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceDocument {
    /// Device or plugin name; "" is the global default device
    #[serde(default)]
    pub device_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub manufacturer_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_page_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub color_palette: Vec<PaletteColor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub param_settings: Vec<ParamSetting>,
}

impl Default for SettingsDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            devices: Vec::new(),
        }
    }
}

impl SettingsDocument {
    /// Parse a YAML document; `origin` names the source in errors
    pub fn parse(text: &str, origin: &str) -> SettingsResult<Self> {
        // An empty file deserializes as unit, not as an empty map
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| SettingsError::Parse {
            origin: origin.to_string(),
            source,
        })
    }

    /// The defaults compiled into the binary
    pub fn embedded() -> SettingsResult<Self> {
        Self::parse(DEFAULT_SETTINGS, "embedded defaults")
    }

    pub fn to_yaml(&self) -> SettingsResult<String> {
        serde_yaml::to_string(self).map_err(SettingsError::Serialize)
    }

    /// Overlay another document: same-named devices are replaced in place,
    /// new ones are appended in their original order
    pub fn merge(&mut self, other: SettingsDocument) {
        for device in other.devices {
            match self
                .devices
                .iter_mut()
                .find(|d| d.device_name == device.device_name)
            {
                Some(existing) => *existing = device,
                None => self.devices.push(device),
            }
        }
    }

    /// Drop repeated palette names (second and later occurrences)
    ///
    /// Returns the number of entries removed.
    pub fn remove_duplicate_colors(&mut self) -> usize {
        let mut removed = 0;
        for device in &mut self.devices {
            if device.color_palette.len() < 2 {
                continue;
            }

            let device_name = &device.device_name;
            let mut seen = HashSet::new();
            device.color_palette.retain(|color| {
                if seen.insert(color.name.clone()) {
                    true
                } else {
                    warn!(
                        "Device '{}': removing duplicate palette color '{}'",
                        device_name, color.name
                    );
                    removed += 1;
                    false
                }
            });
        }
        removed
    }

    pub fn device(&self, name: &str) -> Option<&DeviceDocument> {
        self.devices.iter().find(|d| d.device_name == name)
    }

    /// Get or create a device block
    pub fn device_mut(&mut self, name: &str) -> &mut DeviceDocument {
        let index = match self.devices.iter().position(|d| d.device_name == name) {
            Some(index) => index,
            None => {
                self.devices.push(DeviceDocument {
                    device_name: name.to_string(),
                    ..Default::default()
                });
                self.devices.len() - 1
            }
        };
        &mut self.devices[index]
    }
}

impl DeviceDocument {
    /// Get or create a parameter record
    pub fn param_mut(&mut self, name: &str) -> &mut ParamSetting {
        let index = match self.param_settings.iter().position(|p| p.name == name) {
            Some(index) => index,
            None => {
                self.param_settings.push(ParamSetting::named(name));
                self.param_settings.len() - 1
            }
        };
        &mut self.param_settings[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::color::ColorValue;

    #[test]
    fn test_embedded_defaults_parse() {
        let doc = SettingsDocument::embedded().unwrap();
        assert!(doc.device("").is_some(), "global default device present");
        assert_eq!(doc.version, DOCUMENT_VERSION);
    }

    #[test]
    fn test_merge_replaces_same_named_devices() {
        let mut base = SettingsDocument::parse(
            r#"
devices:
  - device_name: ""
    manufacturer_name: Default
  - device_name: Comp
    manufacturer_name: Old
"#,
            "base",
        )
        .unwrap();

        let user = SettingsDocument::parse(
            r#"
devices:
  - device_name: Comp
    manufacturer_name: New
  - device_name: EQ
"#,
            "user",
        )
        .unwrap();

        base.merge(user);

        let names: Vec<&str> = base.devices.iter().map(|d| d.device_name.as_str()).collect();
        assert_eq!(names, vec!["", "Comp", "EQ"]);
        assert_eq!(base.device("Comp").unwrap().manufacturer_name, "New");
    }

    #[test]
    fn test_duplicate_palette_colors_removed() {
        let mut doc = SettingsDocument::default();
        doc.device_mut("Comp").color_palette = vec![
            PaletteColor::new("red", ColorValue::rgb(255, 0, 0)),
            PaletteColor::new("blue", ColorValue::rgb(0, 0, 255)),
            PaletteColor::new("red", ColorValue::rgb(200, 0, 0)),
        ];

        assert_eq!(doc.remove_duplicate_colors(), 1);

        let palette = &doc.device("Comp").unwrap().color_palette;
        assert_eq!(palette.len(), 2);
        assert_eq!(palette[0].value, ColorValue::rgb(255, 0, 0));
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let err = SettingsDocument::parse("devices: [ {", "broken.yaml").unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_empty_document_has_no_devices() {
        for text in ["", "  \n\n"] {
            let doc = SettingsDocument::parse(text, "empty.yaml").unwrap();
            assert!(doc.devices.is_empty());
        }
    }
}
