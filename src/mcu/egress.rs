//! Outbound encoder for user actions
//!
//! Each builder produces the message the decoder would turn back into the same
//! state. Builders return `None` for targets outside the layout.

use super::{ProtocolLayout, SurfaceEvent, ONE_WAY_COMMAND_CHANNEL};
use crate::midi::MidiMessage;
use crate::mixer::PropertyType;
use crate::modes::{AutomationMode, RecPreMode};

const PRESSED: u8 = 127;

#[derive(Debug, Clone, Copy, Default)]
pub struct McuEncoder {
    layout: ProtocolLayout,
}

fn note_on(channel: u8, note: u8, velocity: u8) -> MidiMessage {
    MidiMessage::NoteOn {
        channel,
        note,
        velocity,
    }
}

impl McuEncoder {
    pub fn new(layout: ProtocolLayout) -> Self {
        Self { layout }
    }

    /// Fader or selected-channel pan position, `value` in 0..=1
    pub fn fader(&self, channel: usize, value: f64) -> Option<MidiMessage> {
        if channel > self.layout.last_channel_index() {
            return None;
        }
        let value = (value.clamp(0.0, 1.0) * 16383.0).round() as u16;
        Some(MidiMessage::PitchBend {
            channel: u8::try_from(channel).ok()?,
            value,
        })
    }

    pub fn property(&self, property: PropertyType, channel: usize, on: bool) -> Option<MidiMessage> {
        if channel > self.layout.channel_count {
            return None;
        }
        let note = usize::from(property.midi_base()) + channel;
        let note = u8::try_from(note).ok().filter(|n| *n <= 0x7F)?;
        Some(note_on(0, note, if on { PRESSED } else { 0 }))
    }

    pub fn user_button(&self, channel: usize, value: u8) -> Option<MidiMessage> {
        if channel >= self.layout.channel_count {
            return None;
        }
        let note = u8::try_from(usize::from(self.layout.user_button_midi_base) + channel).ok()?;
        Some(note_on(0, note, value.min(0x7F)))
    }

    /// Press of the automation key for `mode`; `Read` has no key
    pub fn automation(&self, mode: AutomationMode) -> Option<MidiMessage> {
        let note = match mode {
            AutomationMode::Off => 0x4A,
            AutomationMode::Read => return None,
            other => 0x4A + other as u8 - 1,
        };
        Some(note_on(0, note, PRESSED))
    }

    pub fn rec_pre(&self, mode: RecPreMode) -> Option<MidiMessage> {
        mode.note().map(|note| note_on(0, note, PRESSED))
    }

    /// Press of the key for a 1-based user page
    pub fn user_page(&self, page: u8) -> Option<MidiMessage> {
        let index = usize::from(page.checked_sub(1)?);
        if index >= self.layout.max_user_pages {
            return None;
        }
        let note = u8::try_from(usize::from(self.layout.user_page_midi_base) + index).ok()?;
        Some(note_on(0, note, PRESSED))
    }

    /// Message that mirrors a mode change back to the surface's key LEDs
    pub fn feedback(&self, event: &SurfaceEvent) -> Option<MidiMessage> {
        match event {
            SurfaceEvent::AutomationModeChanged { mode } => self.automation(*mode),
            SurfaceEvent::RecPreModeChanged { mode } => self.rec_pre(*mode),
            SurfaceEvent::UserPageChanged { page } => self.user_page(*page),
            _ => None,
        }
    }

    pub fn command(&self, note: u8, pressed: bool) -> MidiMessage {
        note_on(0, note & 0x7F, if pressed { PRESSED } else { 0 })
    }

    pub fn one_way_command(&self, channel: u8, note: u8) -> Option<MidiMessage> {
        (ONE_WAY_COMMAND_CHANNEL..=15)
            .contains(&channel)
            .then(|| note_on(channel, note & 0x7F, PRESSED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fader_rounds_and_clamps() {
        let encoder = McuEncoder::default();
        assert_eq!(
            encoder.fader(0, 1.5),
            Some(MidiMessage::PitchBend { channel: 0, value: 16383 })
        );
        assert_eq!(
            encoder.fader(9, 0.5),
            Some(MidiMessage::PitchBend { channel: 9, value: 8192 })
        );
        assert_eq!(encoder.fader(10, 0.5), None);
    }

    #[test]
    fn test_property_notes() {
        let encoder = McuEncoder::default();
        assert_eq!(
            encoder.property(PropertyType::Mute, 3, true),
            Some(note_on(0, 19, 127))
        );
        assert_eq!(encoder.property(PropertyType::Monitor, 8, false), None);
        assert_eq!(encoder.property(PropertyType::Select, 9, true), None);
    }

    #[test]
    fn test_mode_keys() {
        let encoder = McuEncoder::default();
        assert_eq!(encoder.automation(AutomationMode::Off), Some(note_on(0, 0x4A, 127)));
        assert_eq!(encoder.automation(AutomationMode::Touch), Some(note_on(0, 0x4B, 127)));
        assert_eq!(encoder.automation(AutomationMode::Write), Some(note_on(0, 0x4D, 127)));
        assert_eq!(encoder.automation(AutomationMode::Read), None);

        assert_eq!(encoder.rec_pre(RecPreMode::Autopunch), Some(note_on(0, 0x58, 127)));
        assert_eq!(encoder.rec_pre(RecPreMode::Off), None);

        assert_eq!(encoder.user_page(1), Some(note_on(0, 0x70, 127)));
        assert_eq!(encoder.user_page(0), None);
        assert_eq!(encoder.user_page(7), None);
    }

    #[test]
    fn test_one_way_channel_range() {
        let encoder = McuEncoder::default();
        assert_eq!(encoder.one_way_command(14, 3), Some(note_on(14, 3, 127)));
        assert_eq!(encoder.one_way_command(2, 3), None);
    }
}
