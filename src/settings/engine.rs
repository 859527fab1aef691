//! SettingsEngine - device and parameter lookup with fallbacks and caching
//!
//! # Lookup order
//!
//! Device: exact name, then the longest non-empty device name that prefixes
//! the requested one, then an empty entry.
//!
//! Parameter, within the resolved device:
//! 1. positional key (`"{page}:{button}"`, `U` suffix for user buttons)
//! 2. exact parameter name
//! 3. exact parameter name in the global default device
//! 4. the device's wildcard record (keyed by "")
//! 5. the built-in engine defaults
//!
//! Each attribute of the result then falls back on its own:
//! record → global default device record → engine defaults → literal.

use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::color::{ColorRole, ColorValue, Rgba};
use super::device::{positional_key, DeviceEntry};
use super::document::SettingsDocument;
use super::label::strip_label;
use super::overrides::SettingOverrides;
use super::param::{ParamSetting, PotMode};
use super::{SettingsError, SettingsResult};

/// Where a resolved record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamSource {
    Positional,
    Device,
    GlobalDevice,
    DeviceWildcard,
    EngineDefault,
}

/// Result of a parameter lookup with per-attribute fallback getters
#[derive(Debug, Clone)]
pub struct ResolvedParam {
    parameter: String,
    setting: Arc<ParamSetting>,
    source: ParamSource,
    global: Option<Arc<ParamSetting>>,
    defaults: Arc<ParamSetting>,
}

impl ResolvedParam {
    /// The record the lookup chain settled on
    pub fn setting(&self) -> &ParamSetting {
        &self.setting
    }

    pub fn source(&self) -> ParamSource {
        self.source
    }

    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    /// Fallback layers in precedence order
    fn layers(&self) -> impl Iterator<Item = &ParamSetting> {
        std::iter::once(self.setting.as_ref())
            .chain(self.global.as_deref())
            .chain(std::iter::once(self.defaults.as_ref()))
    }

    /// First layer that has a value for the attribute
    fn first<T>(&self, pick: impl Fn(&ParamSetting) -> Option<T>) -> Option<T> {
        self.layers().find_map(pick)
    }

    pub fn color(&self, role: ColorRole) -> Rgba {
        self.first(|s| s.color(role).and_then(|c| c.effective(role)))
            .unwrap_or_else(|| match role {
                ColorRole::On | ColorRole::Off => ColorValue::rgb(0, 0, 0).with_role(role),
                _ => ColorValue::rgb(255, 255, 255).with_role(role),
            })
    }

    pub fn on_color(&self) -> Rgba {
        self.color(ColorRole::On)
    }

    pub fn off_color(&self) -> Rgba {
        self.color(ColorRole::Off)
    }

    pub fn text_on_color(&self) -> Rgba {
        self.color(ColorRole::TextOn)
    }

    pub fn text_off_color(&self) -> Rgba {
        self.color(ColorRole::TextOff)
    }

    pub fn bar_on_color(&self) -> Rgba {
        self.color(ColorRole::BarOn)
    }

    pub fn mode(&self) -> PotMode {
        self.first(|s| s.mode).unwrap_or(PotMode::Positive)
    }

    /// Label, or the parameter name when no layer sets one
    pub fn label(&self) -> String {
        self.first(|s| s.label.clone())
            .unwrap_or_else(|| self.parameter.clone())
    }

    /// Label shown while the control is on, falling back to [`label`](Self::label)
    pub fn label_on(&self) -> String {
        self.first(|s| s.label_on.clone())
            .unwrap_or_else(|| self.label())
    }

    /// Label shortened for the display
    pub fn display_label(&self, is_on: bool) -> String {
        if is_on {
            strip_label(&self.label_on())
        } else {
            strip_label(&self.label())
        }
    }

    pub fn dial_steps(&self) -> u32 {
        self.first(|s| s.dial_steps).unwrap_or(100)
    }

    pub fn max_value_precision(&self) -> u32 {
        self.first(|s| s.max_value_precision).unwrap_or(2)
    }

    pub fn user_menu_items(&self) -> Vec<String> {
        self.first(|s| s.user_menu_items.clone()).unwrap_or_default()
    }

    pub fn hide_value_bar(&self) -> bool {
        self.setting.hide_value_bar
    }

    pub fn show_user_button_circle(&self) -> bool {
        self.setting.show_user_button_circle
    }

    pub fn paint_label_bg(&self) -> bool {
        self.setting.paint_label_bg
    }

    pub fn linked_parameter(&self) -> Option<&str> {
        self.setting.linked_parameter.as_deref()
    }

    pub fn link_reversed(&self) -> bool {
        self.setting.link_reversed
    }

    pub fn linked_states(&self) -> Option<&str> {
        self.setting.linked_states.as_deref()
    }
}

/// Plugin name carried by a focus-device announcement
///
/// Hosts send `"{track} - {plugin}"`; the part after the first separator is
/// the device key. Text without a separator is used whole.
pub fn plugin_name_from_focus(text: &str) -> &str {
    text.split_once(" - ").map(|(_, plugin)| plugin).unwrap_or(text)
}

struct EngineState {
    /// Devices in document order
    devices: Vec<Arc<DeviceEntry>>,
    global: Arc<DeviceEntry>,
}

impl EngineState {
    fn build(mut doc: SettingsDocument) -> Self {
        doc.remove_duplicate_colors();

        let global = doc
            .devices
            .iter()
            .find(|d| d.device_name.is_empty())
            .cloned()
            .map(|d| DeviceEntry::from_document(d, None))
            .unwrap_or_else(|| DeviceEntry::empty(""));
        let global = Arc::new(global);

        let devices = doc
            .devices
            .into_iter()
            .map(|d| {
                if d.device_name.is_empty() {
                    Arc::clone(&global)
                } else {
                    Arc::new(DeviceEntry::from_document(d, Some(&global)))
                }
            })
            .collect();

        Self { devices, global }
    }

    fn to_document(&self) -> SettingsDocument {
        SettingsDocument {
            devices: self.devices.iter().map(|d| d.to_document()).collect(),
            ..Default::default()
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.devices.iter().position(|d| d.name == name)
    }
}

struct ParamCacheEntry {
    device: Arc<DeviceEntry>,
    parameter: String,
    positional: String,
    setting: Arc<ParamSetting>,
    source: ParamSource,
}

/// Settings store answering per-device, per-parameter lookups
pub struct SettingsEngine {
    state: RwLock<EngineState>,
    user_path: Option<PathBuf>,
    overrides: SettingOverrides,
    defaults: Arc<ParamSetting>,
    device_cache: Mutex<Option<(String, Arc<DeviceEntry>)>>,
    param_cache: Mutex<Option<ParamCacheEntry>>,
}

impl SettingsEngine {
    /// Build an engine from an in-memory document, without a backing file
    pub fn from_document(doc: SettingsDocument) -> Self {
        Self::with_state(EngineState::build(doc), None)
    }

    /// Load embedded defaults, then the user's file at `user_path`
    ///
    /// A missing user file is synthesized from the merged defaults; an
    /// unreadable or corrupt one is an error.
    pub fn load(user_path: impl Into<PathBuf>) -> SettingsResult<Self> {
        let user_path = user_path.into();
        let engine = Self::with_state(
            EngineState::build(SettingsDocument::default()),
            Some(user_path.clone()),
        );
        engine.reload()?;
        info!(
            "Settings loaded from {} ({} devices)",
            user_path.display(),
            engine.device_names().len()
        );
        Ok(engine)
    }

    fn with_state(state: EngineState, user_path: Option<PathBuf>) -> Self {
        Self {
            state: RwLock::new(state),
            user_path,
            overrides: SettingOverrides::new(),
            defaults: Arc::new(ParamSetting::engine_default()),
            device_cache: Mutex::new(None),
            param_cache: Mutex::new(None),
        }
    }

    /// Re-read defaults and the user file, then fold in pending overrides
    pub fn reload(&self) -> SettingsResult<()> {
        let Some(path) = self.user_path.as_deref() else {
            return Err(SettingsError::NoUserFile);
        };

        let mut doc = SettingsDocument::embedded()?;
        match std::fs::read_to_string(path) {
            Ok(text) => doc.merge(SettingsDocument::parse(&text, &path.display().to_string())?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No settings file at {}, writing defaults", path.display());
                write_document(path, &doc)?;
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }

        let applied = self.overrides.apply_to(&mut doc);
        if applied > 0 {
            debug!("Applied {} settings overrides", applied);
        }

        let mut state = self.state.write();
        *state = EngineState::build(doc);
        self.invalidate_caches();
        drop(state);
        Ok(())
    }

    /// Write the current settings to the user file
    pub fn save(&self) -> SettingsResult<()> {
        let path = self.user_path.as_deref().ok_or(SettingsError::NoUserFile)?;
        self.save_to(path)
    }

    pub fn save_to(&self, path: &Path) -> SettingsResult<()> {
        write_document(path, &self.document())?;
        debug!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Current settings in their on-disk shape
    pub fn document(&self) -> SettingsDocument {
        self.state.read().to_document()
    }

    pub fn user_path(&self) -> Option<&Path> {
        self.user_path.as_deref()
    }

    /// Pending field overrides, applied on the next [`reload`](Self::reload)
    pub fn overrides(&self) -> &SettingOverrides {
        &self.overrides
    }

    pub fn device_names(&self) -> Vec<String> {
        self.state
            .read()
            .devices
            .iter()
            .map(|d| d.name.clone())
            .collect()
    }

    /// The device entry keyed by the empty string
    pub fn global_device(&self) -> Arc<DeviceEntry> {
        Arc::clone(&self.state.read().global)
    }

    /// Find the entry for a device name; never fails
    pub fn resolve_device(&self, name: &str) -> Arc<DeviceEntry> {
        let state = self.state.read();
        self.device_in(&state, name)
    }

    /// Resolve the presentation record for a control; never fails
    pub fn resolve(
        &self,
        device_name: &str,
        parameter_name: &str,
        is_user: bool,
        button_index: usize,
        current_user_page: u8,
    ) -> ResolvedParam {
        // One read guard for the whole lookup: writers clear the caches
        // while holding the write lock, so nothing computed from an older
        // state can be stored after that.
        let state = self.state.read();
        let device = self.device_in(&state, device_name);
        let positional = positional_key(current_user_page, button_index, is_user);
        let (setting, source) = self.param_in(&state, &device, parameter_name, &positional);
        let global = state.global.param(parameter_name).cloned();

        ResolvedParam {
            parameter: parameter_name.to_string(),
            setting,
            source,
            global,
            defaults: Arc::clone(&self.defaults),
        }
    }

    fn device_in(&self, state: &EngineState, name: &str) -> Arc<DeviceEntry> {
        let mut cache = self.device_cache.lock();
        if let Some((cached_name, device)) = cache.as_ref() {
            if cached_name == name {
                return Arc::clone(device);
            }
        }

        let device = state
            .devices
            .iter()
            .find(|d| d.name == name)
            .or_else(|| {
                state
                    .devices
                    .iter()
                    .filter(|d| !d.name.is_empty() && name.starts_with(d.name.as_str()))
                    .max_by_key(|d| d.name.len())
            })
            .cloned()
            .unwrap_or_else(|| Arc::new(DeviceEntry::empty(name)));

        *cache = Some((name.to_string(), Arc::clone(&device)));
        device
    }

    fn param_in(
        &self,
        state: &EngineState,
        device: &Arc<DeviceEntry>,
        parameter: &str,
        positional: &str,
    ) -> (Arc<ParamSetting>, ParamSource) {
        let mut cache = self.param_cache.lock();
        if let Some(hit) = cache.as_ref() {
            if Arc::ptr_eq(&hit.device, device)
                && hit.parameter == parameter
                && hit.positional == positional
            {
                return (Arc::clone(&hit.setting), hit.source);
            }
        }

        let layers = [
            (ParamSource::Positional, device.param(positional)),
            (ParamSource::Device, device.param(parameter)),
            (ParamSource::GlobalDevice, state.global.param(parameter)),
            (ParamSource::DeviceWildcard, device.param("")),
        ];
        let found = layers
            .into_iter()
            .find_map(|(source, setting)| setting.map(|s| (Arc::clone(s), source)));
        let (setting, source) =
            found.unwrap_or_else(|| (Arc::clone(&self.defaults), ParamSource::EngineDefault));

        *cache = Some(ParamCacheEntry {
            device: Arc::clone(device),
            parameter: parameter.to_string(),
            positional: positional.to_string(),
            setting: Arc::clone(&setting),
            source,
        });
        (setting, source)
    }

    pub fn manufacturer_name(&self, device_name: &str) -> String {
        self.resolve_device(device_name).manufacturer_name.clone()
    }

    pub fn user_page_names(&self, device_name: &str) -> Vec<String> {
        self.resolve_device(device_name).user_page_names.clone()
    }

    /// Add an empty device
    pub fn add_device(&self, name: &str, manufacturer: &str) -> SettingsResult<()> {
        let mut state = self.state.write();
        if state.position(name).is_some() {
            return Err(SettingsError::DuplicateDevice(name.to_string()));
        }
        let mut entry = DeviceEntry::empty(name);
        entry.manufacturer_name = manufacturer.to_string();
        state.devices.push(Arc::new(entry));
        self.invalidate_caches();
        drop(state);
        Ok(())
    }

    /// Copy an existing device under a new name
    pub fn duplicate_device(&self, source: &str, new_name: &str) -> SettingsResult<()> {
        let mut state = self.state.write();
        if state.position(new_name).is_some() {
            return Err(SettingsError::DuplicateDevice(new_name.to_string()));
        }
        let index = state
            .position(source)
            .ok_or_else(|| SettingsError::UnknownDevice(source.to_string()))?;

        let mut copy = DeviceEntry::clone(&state.devices[index]);
        copy.name = new_name.to_string();
        state.devices.push(Arc::new(copy));
        self.invalidate_caches();
        drop(state);
        Ok(())
    }

    /// Remove a device; the global default device stays
    pub fn remove_device(&self, name: &str) -> SettingsResult<()> {
        if name.is_empty() {
            return Err(SettingsError::UnknownDevice(name.to_string()));
        }
        let mut state = self.state.write();
        let index = state
            .position(name)
            .ok_or_else(|| SettingsError::UnknownDevice(name.to_string()))?;
        state.devices.remove(index);
        self.invalidate_caches();
        drop(state);
        Ok(())
    }

    /// Insert or replace a parameter record on an existing device
    pub fn set_param_setting(&self, device: &str, setting: ParamSetting) -> SettingsResult<()> {
        self.edit_device(device, |entry| entry.insert_param(setting))
    }

    /// Remove a parameter record; returns whether it existed
    pub fn remove_param_setting(&self, device: &str, parameter: &str) -> SettingsResult<bool> {
        self.edit_device(device, |entry| entry.remove_param(parameter).is_some())
    }

    fn edit_device<R>(&self, name: &str, f: impl FnOnce(&mut DeviceEntry) -> R) -> SettingsResult<R> {
        let mut state = self.state.write();
        let index = state
            .position(name)
            .ok_or_else(|| SettingsError::UnknownDevice(name.to_string()))?;

        let mut entry = DeviceEntry::clone(&state.devices[index]);
        let result = f(&mut entry);
        let entry = Arc::new(entry);
        if entry.is_global() {
            state.global = Arc::clone(&entry);
        }
        state.devices[index] = entry;
        self.invalidate_caches();
        drop(state);
        Ok(result)
    }

    fn invalidate_caches(&self) {
        *self.device_cache.lock() = None;
        *self.param_cache.lock() = None;
    }
}

fn write_document(path: &Path, doc: &SettingsDocument) -> SettingsResult<()> {
    let yaml = doc.to_yaml()?;
    let write_err = |source| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, yaml).map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::color::{Color, PaletteColor};
    use crate::settings::document::DeviceDocument;
    use tempfile::TempDir;

    const RED: ColorValue = ColorValue::rgb(255, 0, 0);

    fn setting(name: &str) -> ParamSetting {
        ParamSetting::named(name)
    }

    fn test_document() -> SettingsDocument {
        let mut global_gain = setting("Gain");
        global_gain.on_color = Some(Color::Direct(RED));
        global_gain.label = Some("Global Gain".into());

        let mut comp_gain = setting("Gain");
        comp_gain.off_color = Some(Color::NamedRef("amber".into()));
        comp_gain.dial_steps = Some(24);

        let mut wildcard = setting("");
        wildcard.mode = Some(PotMode::Symmetric);

        let mut positional = setting("1:3U");
        positional.label = Some("Page Button".into());

        SettingsDocument {
            devices: vec![
                DeviceDocument {
                    device_name: "".into(),
                    param_settings: vec![global_gain],
                    ..Default::default()
                },
                DeviceDocument {
                    device_name: "Comp".into(),
                    manufacturer_name: "Acme".into(),
                    user_page_names: vec!["Main".into(), "Sidechain".into()],
                    color_palette: vec![PaletteColor::new("amber", ColorValue::rgb(255, 191, 0))],
                    param_settings: vec![comp_gain, wildcard, positional],
                },
                DeviceDocument {
                    device_name: "Comp Pro".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_attribute_falls_back_to_global_device() {
        let engine = SettingsEngine::from_document(test_document());
        let resolved = engine.resolve("Comp", "Gain", false, 0, 0);

        assert_eq!(resolved.source(), ParamSource::Device);
        assert_eq!(resolved.on_color(), RED.with_role(ColorRole::On));
        assert_eq!(resolved.off_color(), Rgba::opaque(255, 191, 0));
        assert_eq!(resolved.text_on_color(), Rgba::WHITE);
        assert_eq!(resolved.label(), "Global Gain");
        assert_eq!(resolved.dial_steps(), 24);
        assert_eq!(resolved.mode(), PotMode::Positive);
    }

    #[test]
    fn test_device_prefix_match_prefers_longest() {
        let engine = SettingsEngine::from_document(test_document());

        assert_eq!(engine.resolve_device("Comp").name, "Comp");
        assert_eq!(engine.resolve_device("Comp Pro (Stereo)").name, "Comp Pro");
        assert_eq!(engine.resolve_device("Comp (Mono)").name, "Comp");

        let unknown = engine.resolve_device("Reverb");
        assert_eq!(unknown.param_count(), 0);
        assert_eq!(unknown.name, "Reverb");
    }

    #[test]
    fn test_lookup_chain_order() {
        let engine = SettingsEngine::from_document(test_document());

        let positional = engine.resolve("Comp", "Gain", true, 3, 1);
        assert_eq!(positional.source(), ParamSource::Positional);
        assert_eq!(positional.label(), "Page Button");

        // Same button, not a user button
        let by_name = engine.resolve("Comp", "Gain", false, 3, 1);
        assert_eq!(by_name.source(), ParamSource::Device);

        let wildcard = engine.resolve("Comp", "Attack", false, 0, 0);
        assert_eq!(wildcard.source(), ParamSource::DeviceWildcard);
        assert_eq!(wildcard.mode(), PotMode::Symmetric);
        assert_eq!(wildcard.label(), "Attack");

        let global = engine.resolve("Reverb", "Gain", false, 0, 0);
        assert_eq!(global.source(), ParamSource::GlobalDevice);

        let fallback = engine.resolve("Reverb", "Size", false, 0, 0);
        assert_eq!(fallback.source(), ParamSource::EngineDefault);
        assert_eq!(fallback.on_color(), ColorValue::rgb(0, 0, 0).with_role(ColorRole::On));
        assert_eq!(fallback.dial_steps(), 100);
    }

    #[test]
    fn test_cache_invalidated_by_edits() {
        let engine = SettingsEngine::from_document(test_document());
        assert_eq!(engine.resolve("Comp", "Ratio", false, 0, 0).source(), ParamSource::DeviceWildcard);

        let mut ratio = setting("Ratio");
        ratio.label = Some("Rt".into());
        engine.set_param_setting("Comp", ratio).unwrap();

        let resolved = engine.resolve("Comp", "Ratio", false, 0, 0);
        assert_eq!(resolved.source(), ParamSource::Device);
        assert_eq!(resolved.label(), "Rt");

        assert!(engine.remove_param_setting("Comp", "Ratio").unwrap());
        assert_eq!(engine.resolve("Comp", "Ratio", false, 0, 0).source(), ParamSource::DeviceWildcard);
    }

    #[test]
    fn test_concurrent_lookups_never_cache_replaced_state() {
        let engine = SettingsEngine::from_document(test_document());

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..500 {
                        engine.resolve("Comp", "Ratio", false, 0, 0);
                        engine.resolve_device("Comp X");
                    }
                });
            }
            s.spawn(|| {
                for i in 0..200 {
                    let mut ratio = setting("Ratio");
                    ratio.label = Some(format!("Rt {}", i));
                    engine.set_param_setting("Comp", ratio).unwrap();
                    engine.add_device("Comp X", "Other").unwrap();
                    engine.remove_param_setting("Comp", "Ratio").unwrap();
                    engine.remove_device("Comp X").unwrap();
                }
                let mut ratio = setting("Ratio");
                ratio.label = Some("Final".into());
                engine.set_param_setting("Comp", ratio).unwrap();
            });
        });

        let resolved = engine.resolve("Comp", "Ratio", false, 0, 0);
        assert_eq!(resolved.source(), ParamSource::Device);
        assert_eq!(resolved.label(), "Final");

        let device = engine.resolve_device("Comp X");
        assert_eq!(device.name, "Comp");
        assert_eq!(device.manufacturer_name, "Acme");
    }

    #[test]
    fn test_global_device_edits_apply_to_fallback() {
        let engine = SettingsEngine::from_document(test_document());
        let mut size = setting("Size");
        size.dial_steps = Some(8);
        engine.set_param_setting("", size).unwrap();

        let resolved = engine.resolve("Reverb", "Size", false, 0, 0);
        assert_eq!(resolved.source(), ParamSource::GlobalDevice);
        assert_eq!(resolved.dial_steps(), 8);
    }

    #[test]
    fn test_device_management() {
        let engine = SettingsEngine::from_document(test_document());

        engine.add_device("EQ", "Acme").unwrap();
        assert!(matches!(
            engine.add_device("EQ", "Other"),
            Err(SettingsError::DuplicateDevice(_))
        ));

        engine.duplicate_device("Comp", "Comp Copy").unwrap();
        assert_eq!(engine.manufacturer_name("Comp Copy"), "Acme");
        assert_eq!(engine.user_page_names("Comp Copy"), vec!["Main", "Sidechain"]);

        engine.remove_device("Comp Copy").unwrap();
        assert!(matches!(
            engine.remove_device("Comp Copy"),
            Err(SettingsError::UnknownDevice(_))
        ));
        assert!(engine.remove_device("").is_err());
    }

    #[test]
    fn test_display_label_is_stripped() {
        let mut doc = test_document();
        let mut long = setting("PR");
        long.label = Some("Peak Reduction".into());
        doc.devices[1].param_settings.push(long);

        let engine = SettingsEngine::from_document(doc);
        let resolved = engine.resolve("Comp", "PR", false, 0, 0);
        assert_eq!(resolved.display_label(false), "Pk Rdctn");
        assert_eq!(resolved.display_label(true), "Pk Rdctn");
    }

    #[test]
    fn test_focus_text_to_plugin_name() {
        assert_eq!(plugin_name_from_focus("Vocals - Pro-Q 3"), "Pro-Q 3");
        assert_eq!(plugin_name_from_focus("A - B - C"), "B - C");
        assert_eq!(plugin_name_from_focus("Pro-Q 3"), "Pro-Q 3");
    }

    #[test]
    fn test_missing_user_file_is_synthesized() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("settings.yaml");

        let engine = SettingsEngine::load(&path).unwrap();
        assert!(path.exists());

        let reloaded = SettingsEngine::load(&path).unwrap();
        assert_eq!(reloaded.document(), engine.document());
    }

    #[test]
    fn test_named_color_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.yaml");
        std::fs::write(&path, test_document().to_yaml().unwrap()).unwrap();

        let engine = SettingsEngine::load(&path).unwrap();
        let before = engine.resolve("Comp", "Gain", false, 0, 0).off_color();
        engine.save().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("off_color: amber"));

        let reloaded = SettingsEngine::load(&path).unwrap();
        let resolved = reloaded.resolve("Comp", "Gain", false, 0, 0);
        assert_eq!(resolved.off_color(), before);
        assert_eq!(
            resolved.setting().off_color.as_ref().and_then(Color::palette_name),
            Some("amber")
        );
    }

    #[test]
    fn test_corrupt_user_file_is_fatal() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.yaml");
        std::fs::write(&path, "devices: {{{{").unwrap();

        assert!(matches!(
            SettingsEngine::load(&path),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn test_empty_user_file_keeps_embedded_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.yaml");
        std::fs::write(&path, "").unwrap();

        let engine = SettingsEngine::load(&path).unwrap();
        let embedded = SettingsDocument::embedded().unwrap();
        assert_eq!(engine.device_names().len(), embedded.devices.len());
    }

    #[test]
    fn test_overrides_applied_on_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.yaml");
        std::fs::write(&path, test_document().to_yaml().unwrap()).unwrap();

        let engine = SettingsEngine::load(&path).unwrap();
        engine.overrides().set("Comp", "Gain", "on_color", "amber");
        engine.overrides().set("Comp", "Gain", "label", "Input");

        // Not visible until reload
        assert_eq!(engine.resolve("Comp", "Gain", false, 0, 0).label(), "Global Gain");

        engine.reload().unwrap();
        let resolved = engine.resolve("Comp", "Gain", false, 0, 0);
        assert_eq!(resolved.label(), "Input");
        assert_eq!(resolved.on_color(), ColorValue::rgb(255, 191, 0).with_role(ColorRole::On));
    }

    #[test]
    fn test_engine_without_file_cannot_save() {
        let engine = SettingsEngine::from_document(test_document());
        assert!(matches!(engine.save(), Err(SettingsError::NoUserFile)));
        assert!(matches!(engine.reload(), Err(SettingsError::NoUserFile)));
    }
}
