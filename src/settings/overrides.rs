//! Flat key-value overrides written by the configuration UI
//!
//! Keys have the shape `[cs]{device}|{parameter}|{field}`; values are the
//! field's text form. Overrides are folded into the settings document on the
//! next explicit reload.

use dashmap::DashMap;
use tracing::{debug, warn};

use super::color::Color;
use super::document::SettingsDocument;
use super::param::{ParamSetting, PotMode};

const KEY_PREFIX: &str = "[cs]";

/// Decoded override key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OverrideKey {
    pub device: String,
    pub parameter: String,
    pub field: String,
}

impl OverrideKey {
    pub fn new(device: &str, parameter: &str, field: &str) -> Self {
        Self {
            device: device.to_string(),
            parameter: parameter.to_string(),
            field: field.to_string(),
        }
    }

    pub fn encode(&self) -> String {
        format!(
            "{}{}|{}|{}",
            KEY_PREFIX, self.device, self.parameter, self.field
        )
    }

    /// Device is everything up to the first `|`, field everything after the
    /// last, so parameter names may contain the separator
    pub fn parse(key: &str) -> Option<Self> {
        let rest = key.strip_prefix(KEY_PREFIX)?;
        let (device, rest) = rest.split_once('|')?;
        let (parameter, field) = rest.rsplit_once('|')?;
        Some(Self::new(device, parameter, field))
    }
}

/// Concurrent store of pending field overrides
#[derive(Debug, Default)]
pub struct SettingOverrides {
    values: DashMap<String, String>,
}

impl SettingOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, device: &str, parameter: &str, field: &str, value: impl Into<String>) {
        let key = OverrideKey::new(device, parameter, field).encode();
        self.values.insert(key, value.into());
    }

    /// Store a raw key as written by the UI
    pub fn set_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, device: &str, parameter: &str, field: &str) -> Option<String> {
        let key = OverrideKey::new(device, parameter, field).encode();
        self.values.get(&key).map(|v| v.value().clone())
    }

    pub fn remove(&self, device: &str, parameter: &str, field: &str) -> Option<String> {
        let key = OverrideKey::new(device, parameter, field).encode();
        self.values.remove(&key).map(|(_, v)| v)
    }

    pub fn clear(&self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fold every override into `doc`, creating device and parameter blocks
    /// as needed. Returns the number of overrides applied.
    pub fn apply_to(&self, doc: &mut SettingsDocument) -> usize {
        let mut entries: Vec<(String, String)> = self
            .values
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        entries.sort();

        let mut applied = 0;
        for (raw_key, value) in entries {
            let Some(key) = OverrideKey::parse(&raw_key) else {
                warn!("Ignoring malformed settings override key '{}'", raw_key);
                continue;
            };

            let setting = doc.device_mut(&key.device).param_mut(&key.parameter);
            match apply_field(setting, &key.field, &value) {
                Ok(()) => {
                    debug!("Applied override {} = '{}'", raw_key, value);
                    applied += 1;
                }
                Err(reason) => warn!("Ignoring override {}: {}", raw_key, reason),
            }
        }
        applied
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(format!("'{}' is not a boolean", other)),
    }
}

fn parse_number(value: &str) -> Result<Option<u32>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<u32>()
        .map(Some)
        .map_err(|_| format!("'{}' is not a number", value))
}

fn parse_text(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_color(value: &str) -> Result<Option<Color>, String> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    Color::parse(value)
        .map(Some)
        .ok_or_else(|| format!("'{}' is not a color", value))
}

/// Set one field from its text form; an empty value clears optional fields
fn apply_field(setting: &mut ParamSetting, field: &str, value: &str) -> Result<(), String> {
    match field {
        "mode" => {
            setting.mode = if value.trim().is_empty() {
                None
            } else {
                Some(
                    value
                        .parse::<PotMode>()
                        .map_err(|_| format!("'{}' is not a pot mode", value))?,
                )
            }
        }
        "hide_value_bar" => setting.hide_value_bar = parse_bool(value)?,
        "show_user_button_circle" => setting.show_user_button_circle = parse_bool(value)?,
        "paint_label_bg" => setting.paint_label_bg = parse_bool(value)?,
        "on_color" => setting.on_color = parse_color(value)?,
        "off_color" => setting.off_color = parse_color(value)?,
        "text_on_color" => setting.text_on_color = parse_color(value)?,
        "text_off_color" => setting.text_off_color = parse_color(value)?,
        "bar_on_color" => setting.bar_on_color = parse_color(value)?,
        "label" => setting.label = parse_text(value),
        "label_on" => setting.label_on = parse_text(value),
        "linked_parameter" => setting.linked_parameter = parse_text(value),
        "link_reversed" => setting.link_reversed = parse_bool(value)?,
        "linked_states" => setting.linked_states = parse_text(value),
        "dial_steps" => setting.dial_steps = parse_number(value)?,
        "max_value_precision" => setting.max_value_precision = parse_number(value)?,
        "user_menu_items" => {
            setting.user_menu_items = parse_text(value)
                .map(|items| items.split(';').map(|s| s.trim().to_string()).collect())
        }
        other => return Err(format!("unknown field '{}'", other)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::color::ColorValue;

    #[test]
    fn test_key_round_trip() {
        let key = OverrideKey::new("Pro-Q 3", "Band 1 | Gain", "on_color");
        let encoded = key.encode();
        assert_eq!(encoded, "[cs]Pro-Q 3|Band 1 | Gain|on_color");
        assert_eq!(OverrideKey::parse(&encoded), Some(key));
    }

    #[test]
    fn test_malformed_keys() {
        assert_eq!(OverrideKey::parse("Comp|Gain|label"), None);
        assert_eq!(OverrideKey::parse("[cs]Comp|label"), None);
    }

    #[test]
    fn test_apply_creates_blocks() {
        let overrides = SettingOverrides::new();
        overrides.set("Comp", "Ratio", "mode", "symmetric");
        overrides.set("Comp", "Ratio", "on_color", "#102030");
        overrides.set("Comp", "Ratio", "user_menu_items", "1:1; 2:1;4:1");
        overrides.set("Comp", "Ratio", "dial_steps", "nope");
        overrides.set_raw("garbage", "x");

        let mut doc = SettingsDocument::default();
        assert_eq!(overrides.apply_to(&mut doc), 3);

        let ratio = doc
            .device("Comp")
            .and_then(|d| d.param_settings.iter().find(|p| p.name == "Ratio"))
            .unwrap();
        assert_eq!(ratio.mode, Some(PotMode::Symmetric));
        assert_eq!(
            ratio.on_color,
            Some(Color::Direct(ColorValue::rgb(0x10, 0x20, 0x30)))
        );
        assert_eq!(
            ratio.user_menu_items,
            Some(vec!["1:1".to_string(), "2:1".to_string(), "4:1".to_string()])
        );
        assert_eq!(ratio.dial_steps, None);
    }

    #[test]
    fn test_empty_value_clears_field() {
        let mut setting = ParamSetting::named("Gain");
        setting.label = Some("Gn".into());
        apply_field(&mut setting, "label", "").unwrap();
        assert_eq!(setting.label, None);
        assert!(apply_field(&mut setting, "colour", "red").is_err());
    }
}
