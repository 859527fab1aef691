//! Device entry: palette plus parameter records for one device/plugin

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use super::color::PaletteColor;
use super::document::DeviceDocument;
use super::param::ParamSetting;

/// Key for a record pinned to a button position on a user page
///
/// `"{page}:{button}"`, with a `U` suffix for user buttons.
pub fn positional_key(user_page: u8, button_index: usize, is_user: bool) -> String {
    if is_user {
        format!("{}:{}U", user_page, button_index)
    } else {
        format!("{}:{}", user_page, button_index)
    }
}

/// Loaded settings for one device, with colors dereferenced and links applied
#[derive(Debug, Clone, Default)]
pub struct DeviceEntry {
    pub name: String,
    pub manufacturer_name: String,
    pub user_page_names: Vec<String>,
    pub color_palette: Vec<PaletteColor>,
    params: BTreeMap<String, Arc<ParamSetting>>,
}

impl DeviceEntry {
    /// Entry with no records
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Build from a document block
    ///
    /// Named colors are resolved against this device's palette first. Then
    /// every record declaring a linked parameter copies its unset colors and
    /// mode from the referenced record as it stands at that point (this
    /// device first, then `global`).
    pub fn from_document(doc: DeviceDocument, global: Option<&DeviceEntry>) -> Self {
        let mut entry = Self {
            name: doc.device_name,
            manufacturer_name: doc.manufacturer_name,
            user_page_names: doc.user_page_names,
            color_palette: doc.color_palette,
            params: BTreeMap::new(),
        };

        let mut order = Vec::with_capacity(doc.param_settings.len());
        for mut setting in doc.param_settings {
            entry.dereference(&mut setting);
            order.push(setting.name.clone());
            entry.params.insert(setting.name.clone(), Arc::new(setting));
        }

        for name in order {
            let Some(setting) = entry.params.get(&name) else {
                continue;
            };
            let Some(link) = setting.linked_parameter.clone() else {
                continue;
            };
            if link == name {
                continue;
            }

            let base = entry
                .params
                .get(&link)
                .cloned()
                .or_else(|| global.and_then(|g| g.param(&link).cloned()));

            match base {
                Some(base) => {
                    if let Some(setting) = entry.params.get_mut(&name) {
                        Arc::make_mut(setting).inherit_from(&base);
                    }
                }
                None => debug!(
                    "Device '{}': '{}' links to unknown parameter '{}'",
                    entry.name, name, link
                ),
            }
        }

        entry
    }

    /// Document block for saving; palette references still present in the
    /// palette are written by name
    pub fn to_document(&self) -> DeviceDocument {
        DeviceDocument {
            device_name: self.name.clone(),
            manufacturer_name: self.manufacturer_name.clone(),
            user_page_names: self.user_page_names.clone(),
            color_palette: self.color_palette.clone(),
            param_settings: self
                .params
                .values()
                .map(|setting| setting.for_save(&self.color_palette))
                .collect(),
        }
    }

    /// The global default device is keyed by the empty string
    pub fn is_global(&self) -> bool {
        self.name.is_empty()
    }

    pub fn param(&self, key: &str) -> Option<&Arc<ParamSetting>> {
        self.params.get(key)
    }

    pub fn params(&self) -> impl Iterator<Item = &Arc<ParamSetting>> {
        self.params.values()
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Insert or replace a record, resolving its palette references
    pub fn insert_param(&mut self, mut setting: ParamSetting) {
        self.dereference(&mut setting);
        self.params.insert(setting.name.clone(), Arc::new(setting));
    }

    pub fn remove_param(&mut self, name: &str) -> Option<Arc<ParamSetting>> {
        self.params.remove(name)
    }

    pub fn palette_color(&self, name: &str) -> Option<&PaletteColor> {
        self.color_palette.iter().find(|c| c.name == name)
    }

    fn dereference(&self, setting: &mut ParamSetting) {
        for name in setting.dereference_colors(&self.color_palette) {
            debug!(
                "Device '{}': color '{}' of '{}' not in palette, ignoring",
                self.name, name, setting.name
            );
        }
    }
}
