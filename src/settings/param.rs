//! Parameter presentation record

use serde::{Deserialize, Serialize};

use super::color::{Color, ColorRole, ColorValue, PaletteColor};

/// How a parameter's value bar is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PotMode {
    /// Bar grows from the left edge
    Positive,
    /// Bar grows out from the center (pan, balance)
    Symmetric,
}

impl std::str::FromStr for PotMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(PotMode::Positive),
            "symmetric" => Ok(PotMode::Symmetric),
            _ => Err(()),
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Presentation settings for one (device, parameter) pair
///
/// Optional fields left unset resolve through the engine's fallback chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamSetting {
    /// Parameter key: a parameter name, a positional key, or "" for the
    /// device wildcard
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<PotMode>,
    #[serde(skip_serializing_if = "is_false")]
    pub hide_value_bar: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub show_user_button_circle: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub paint_label_bg: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub off_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_on_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_off_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_on_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_parameter: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub link_reversed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_states: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dial_steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value_precision: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_menu_items: Option<Vec<String>>,
}

impl ParamSetting {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Built-in last-resort record: black backgrounds, white text, positive
    /// mode, 100 dial steps
    pub fn engine_default() -> Self {
        Self {
            name: String::new(),
            mode: Some(PotMode::Positive),
            on_color: Some(Color::Direct(ColorValue::rgb(0, 0, 0))),
            off_color: Some(Color::Direct(ColorValue::rgb(0, 0, 0))),
            text_on_color: Some(Color::Direct(ColorValue::rgb(255, 255, 255))),
            text_off_color: Some(Color::Direct(ColorValue::rgb(255, 255, 255))),
            bar_on_color: Some(Color::Direct(ColorValue::rgb(255, 255, 255))),
            dial_steps: Some(100),
            max_value_precision: Some(2),
            ..Default::default()
        }
    }

    pub fn color(&self, role: ColorRole) -> Option<&Color> {
        match role {
            ColorRole::On => self.on_color.as_ref(),
            ColorRole::Off => self.off_color.as_ref(),
            ColorRole::TextOn => self.text_on_color.as_ref(),
            ColorRole::TextOff => self.text_off_color.as_ref(),
            ColorRole::BarOn => self.bar_on_color.as_ref(),
        }
    }

    /// Mutable access to every color slot, in declaration order
    pub fn colors_mut(&mut self) -> [&mut Option<Color>; 5] {
        [
            &mut self.on_color,
            &mut self.off_color,
            &mut self.text_on_color,
            &mut self.text_off_color,
            &mut self.bar_on_color,
        ]
    }

    /// Replace bare palette references with resolved ones; names missing from
    /// the palette become unset. Returns the names that could not be found.
    pub fn dereference_colors(&mut self, palette: &[PaletteColor]) -> Vec<String> {
        let mut missing = Vec::new();
        for slot in self.colors_mut() {
            if let Some(color) = slot.take() {
                let name = color.palette_name().map(str::to_string);
                *slot = color.dereference(palette);
                if slot.is_none() {
                    missing.extend(name);
                }
            }
        }
        missing
    }

    /// Copy unset colors and mode from `base`, once, by value
    pub fn inherit_from(&mut self, base: &ParamSetting) {
        if self.mode.is_none() {
            self.mode = base.mode;
        }
        let sources = [
            &base.on_color,
            &base.off_color,
            &base.text_on_color,
            &base.text_off_color,
            &base.bar_on_color,
        ];
        for (slot, source) in self.colors_mut().into_iter().zip(sources) {
            if slot.is_none() {
                *slot = source.clone();
            }
        }
    }

    /// Copy with colors converted to their on-disk shape for `palette`
    pub fn for_save(&self, palette: &[PaletteColor]) -> ParamSetting {
        let mut copy = self.clone();
        for slot in copy.colors_mut() {
            if let Some(color) = slot.take() {
                *slot = Some(color.for_save(palette));
            }
        }
        copy
    }
}
