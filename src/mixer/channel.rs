//! Channel strip type definitions

use serde::{Deserialize, Serialize};

/// Boolean toggles carried by every channel strip
///
/// Declaration order matters: when the note ranges of two types overlap, the
/// decoder picks the first type in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Select,
    Mute,
    Solo,
    Arm,
    Monitor,
}

impl PropertyType {
    /// All property types in tie-break order
    pub const ALL: [PropertyType; 5] = [
        PropertyType::Select,
        PropertyType::Mute,
        PropertyType::Solo,
        PropertyType::Arm,
        PropertyType::Monitor,
    ];

    /// First note of this property's button row
    pub fn midi_base(self) -> u8 {
        match self {
            PropertyType::Select => 24,
            PropertyType::Mute => 16,
            PropertyType::Solo => 8,
            PropertyType::Arm => 0,
            PropertyType::Monitor => 120,
        }
    }

    /// Slot in [`Channel::properties`]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Select => "select",
            PropertyType::Mute => "mute",
            PropertyType::Solo => "solo",
            PropertyType::Arm => "arm",
            PropertyType::Monitor => "monitor",
        }
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One mixer strip slot in the registry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channel {
    index: usize,
    /// Fader or pan position, normalized 0..1
    pub value: f64,
    pub label: String,
    pub value_text: String,
    pub description: String,
    pub user_label: String,
    pub user_value: u8,
    /// Indexed by [`PropertyType::index`]
    pub properties: [bool; 5],
    pub is_master: bool,
}

impl Channel {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            value: 0.0,
            label: String::new(),
            value_text: String::new(),
            description: String::new(),
            user_label: String::new(),
            user_value: 0,
            properties: [false; 5],
            is_master: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn property(&self, property: PropertyType) -> bool {
        self.properties[property.index()]
    }

    pub fn set_property(&mut self, property: PropertyType, on: bool) {
        self.properties[property.index()] = on;
    }
}
