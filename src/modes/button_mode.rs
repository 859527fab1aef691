//! Fader and button mode selection

use serde::{Deserialize, Serialize};

use crate::mixer::PropertyType;

/// What the channel faders currently control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelFaderMode {
    #[default]
    Volume,
    Pan,
}

/// Button-mode selection with a latched base layer and a momentary override
///
/// Tapping a mode button latches it; holding one overrides the latched mode
/// until it is released.
#[derive(Debug, Clone)]
pub struct ButtonModeLayers {
    base: PropertyType,
    momentary: Option<PropertyType>,
}

impl Default for ButtonModeLayers {
    fn default() -> Self {
        Self {
            base: PropertyType::Select,
            momentary: None,
        }
    }
}

impl ButtonModeLayers {
    pub fn effective(&self) -> PropertyType {
        self.momentary.unwrap_or(self.base)
    }

    pub fn base(&self) -> PropertyType {
        self.base
    }

    /// Latch a new base mode
    pub fn latch(&mut self, mode: PropertyType) -> Option<PropertyType> {
        self.apply(|layers| layers.base = mode)
    }

    /// Activate a momentary override
    pub fn hold(&mut self, mode: PropertyType) -> Option<PropertyType> {
        self.apply(|layers| layers.momentary = Some(mode))
    }

    /// Drop the override, but only if `mode` is the one being held
    pub fn release(&mut self, mode: PropertyType) -> Option<PropertyType> {
        self.apply(|layers| {
            if layers.momentary == Some(mode) {
                layers.momentary = None;
            }
        })
    }

    fn apply(&mut self, f: impl FnOnce(&mut Self)) -> Option<PropertyType> {
        let before = self.effective();
        f(self);
        let after = self.effective();
        (before != after).then_some(after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_momentary_overrides_base() {
        let mut layers = ButtonModeLayers::default();
        assert_eq!(layers.latch(PropertyType::Mute), Some(PropertyType::Mute));
        assert_eq!(layers.hold(PropertyType::Solo), Some(PropertyType::Solo));
        assert_eq!(layers.latch(PropertyType::Arm), None);
        assert_eq!(layers.release(PropertyType::Solo), Some(PropertyType::Arm));
    }

    #[test]
    fn test_release_of_other_mode_is_ignored() {
        let mut layers = ButtonModeLayers::default();
        layers.hold(PropertyType::Monitor);
        assert_eq!(layers.release(PropertyType::Mute), None);
        assert_eq!(layers.effective(), PropertyType::Monitor);
    }
}
