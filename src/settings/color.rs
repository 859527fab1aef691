//! Color model: inline values, palette references and per-role alpha defaults

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Effective color handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);
    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Which slot of a parameter record a color fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorRole {
    On,
    Off,
    TextOn,
    TextOff,
    BarOn,
}

impl ColorRole {
    /// Alpha used when a color does not set one explicitly
    ///
    /// Background "on" colors are drawn over the value bar, so they default to
    /// partially transparent.
    pub fn default_alpha(self) -> u8 {
        match self {
            ColorRole::On => 80,
            _ => 255,
        }
    }
}

/// Inline color as stored in settings documents; alpha is optional
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorValue {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<u8>,
}

impl ColorValue {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: None }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a: Some(a) }
    }

    /// Fill in the role's default alpha if none was set
    pub fn with_role(&self, role: ColorRole) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a: self.a.unwrap_or_else(|| role.default_alpha()),
        }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA`
    pub fn parse_hex(text: &str) -> Option<Self> {
        let hex = text.strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }
}

/// Named entry of a device palette; always serialized inline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteColor {
    pub name: String,
    #[serde(flatten)]
    pub value: ColorValue,
}

impl PaletteColor {
    pub fn new(name: impl Into<String>, value: ColorValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Color as carried by a parameter record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Color {
    /// Inline RGBA
    Direct(ColorValue),
    /// Bare palette name, not yet looked up
    NamedRef(String),
    /// Palette reference resolved at load: renders as `value`, saves as `name`
    Palette { name: String, value: ColorValue },
}

impl Color {
    /// Effective color for a role; unresolved references have none
    pub fn effective(&self, role: ColorRole) -> Option<Rgba> {
        match self {
            Color::Direct(value) | Color::Palette { value, .. } => Some(value.with_role(role)),
            Color::NamedRef(_) => None,
        }
    }

    /// Resolve a bare reference against a palette by linear scan on name
    ///
    /// Returns `None` when the name is not in the palette. Inline colors and
    /// already-resolved references pass through unchanged.
    pub fn dereference(self, palette: &[PaletteColor]) -> Option<Color> {
        match self {
            Color::NamedRef(name) => palette
                .iter()
                .find(|entry| entry.name == name)
                .map(|entry| Color::Palette {
                    name,
                    value: entry.value,
                }),
            other => Some(other),
        }
    }

    /// Shape to write back to disk for a device owning `palette`
    ///
    /// A resolved reference whose name is still in the palette is written as
    /// the bare name; otherwise its value is written inline.
    pub fn for_save(&self, palette: &[PaletteColor]) -> Color {
        match self {
            Color::Palette { name, value } => {
                if palette.iter().any(|entry| &entry.name == name) {
                    Color::NamedRef(name.clone())
                } else {
                    Color::Direct(*value)
                }
            }
            other => other.clone(),
        }
    }

    /// Parse an editor value: `#RRGGBB[AA]` inline, anything else a palette name
    pub fn parse(text: &str) -> Option<Color> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if text.starts_with('#') {
            return ColorValue::parse_hex(text).map(Color::Direct);
        }
        Some(Color::NamedRef(text.to_string()))
    }

    pub fn palette_name(&self) -> Option<&str> {
        match self {
            Color::NamedRef(name) | Color::Palette { name, .. } => Some(name),
            Color::Direct(_) => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Name(String),
    Inline(ColorValue),
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Color::Direct(value) => ColorRepr::Inline(*value).serialize(serializer),
            Color::NamedRef(name) | Color::Palette { name, .. } => {
                ColorRepr::Name(name.clone()).serialize(serializer)
            }
        }
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match ColorRepr::deserialize(deserializer)? {
            ColorRepr::Name(name) => Color::NamedRef(name),
            ColorRepr::Inline(value) => Color::Direct(value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> Vec<PaletteColor> {
        vec![
            PaletteColor::new("red", ColorValue::rgb(255, 0, 0)),
            PaletteColor::new("glass", ColorValue::rgba(10, 20, 30, 40)),
        ]
    }

    #[test]
    fn test_role_alpha_defaults() {
        let value = ColorValue::rgb(1, 2, 3);
        assert_eq!(value.with_role(ColorRole::On).a, 80);
        assert_eq!(value.with_role(ColorRole::Off).a, 255);
        assert_eq!(value.with_role(ColorRole::TextOn).a, 255);
        assert_eq!(ColorValue::rgba(1, 2, 3, 7).with_role(ColorRole::On).a, 7);
    }

    #[test]
    fn test_dereference_found_and_missing() {
        let resolved = Color::NamedRef("red".into()).dereference(&palette()).unwrap();
        assert_eq!(
            resolved,
            Color::Palette {
                name: "red".into(),
                value: ColorValue::rgb(255, 0, 0)
            }
        );
        assert_eq!(
            resolved.effective(ColorRole::Off),
            Some(Rgba::opaque(255, 0, 0))
        );

        assert!(Color::NamedRef("teal".into()).dereference(&palette()).is_none());
    }

    #[test]
    fn test_unresolved_reference_has_no_effective_value() {
        assert_eq!(Color::NamedRef("red".into()).effective(ColorRole::On), None);
    }

    #[test]
    fn test_for_save_falls_back_to_inline() {
        let color = Color::Palette {
            name: "gone".into(),
            value: ColorValue::rgb(9, 9, 9),
        };
        assert_eq!(color.for_save(&palette()), Color::Direct(ColorValue::rgb(9, 9, 9)));

        let color = Color::Palette {
            name: "red".into(),
            value: ColorValue::rgb(255, 0, 0),
        };
        assert_eq!(color.for_save(&palette()), Color::NamedRef("red".into()));
    }

    #[test]
    fn test_yaml_shapes() {
        let named: Color = serde_yaml::from_str("red").unwrap();
        assert_eq!(named, Color::NamedRef("red".into()));

        let inline: Color = serde_yaml::from_str("{r: 1, g: 2, b: 3}").unwrap();
        assert_eq!(inline, Color::Direct(ColorValue::rgb(1, 2, 3)));

        let text = serde_yaml::to_string(&Color::Palette {
            name: "red".into(),
            value: ColorValue::rgb(255, 0, 0),
        })
        .unwrap();
        assert_eq!(text.trim(), "red");
    }

    #[test]
    fn test_parse_editor_values() {
        assert_eq!(
            Color::parse("#FF000080"),
            Some(Color::Direct(ColorValue::rgba(255, 0, 0, 128)))
        );
        assert_eq!(Color::parse("#12345"), None);
        assert_eq!(Color::parse("red"), Some(Color::NamedRef("red".into())));
        assert_eq!(Color::parse("  "), None);
    }
}
