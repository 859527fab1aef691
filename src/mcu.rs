//! Mackie Control protocol layer
//!
//! Decodes inbound surface traffic into registry mutations and surface events,
//! encodes outbound user actions, and wraps the midir ports both travel on.

mod decoder;
mod egress;
mod events;
mod ports;


pub use decoder::McuDecoder;
pub use egress::McuEncoder;
pub use events::SurfaceEvent;
pub use ports::{list_input_ports, list_output_ports, MidiInputPort, MidiOutputPort};

use serde::{Deserialize, Serialize};

/// Prefix of every Mackie SysEx payload (after F0)
pub const SYSEX_PREFIX: [u8; 3] = [0x00, 0x00, 0x66];

/// SysEx sub-type: per-channel text
pub const SYSEX_CHANNEL_TEXT: u8 = 0x12;
/// SysEx sub-type: focused device name
pub const SYSEX_FOCUS_DEVICE: u8 = 0x13;
/// SysEx sub-type: function key name
pub const SYSEX_FUNCTION_KEY: u8 = 0x14;

/// Controller number carrying the active user page count
pub const ACTIVE_USER_PAGES_CC: u8 = 0x60;

/// Notes on this channel and above are one-way commands
pub const ONE_WAY_COMMAND_CHANNEL: u8 = 14;

/// Numeric layout of the dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolLayout {
    /// Physical channel strips; the registry adds two selected-channel slots
    pub channel_count: usize,
    pub user_button_midi_base: u8,
    pub user_page_midi_base: u8,
    pub max_user_pages: usize,
}

impl Default for ProtocolLayout {
    fn default() -> Self {
        Self {
            channel_count: 8,
            user_button_midi_base: 0x68,
            user_page_midi_base: 0x70,
            max_user_pages: 6,
        }
    }
}

impl ProtocolLayout {
    /// Highest channel index accepted by pitch bend (selected-channel pan)
    pub fn last_channel_index(&self) -> usize {
        self.channel_count + 1
    }

    /// Channel index for a user-button note
    pub fn user_button_index(&self, note: u8) -> Option<usize> {
        let index = note.checked_sub(self.user_button_midi_base)? as usize;
        (index < self.channel_count).then_some(index)
    }

    /// Zero-based page slot for a user-page note
    pub fn user_page_index(&self, note: u8) -> Option<usize> {
        let index = note.checked_sub(self.user_page_midi_base)? as usize;
        (index < self.max_user_pages).then_some(index)
    }
}
