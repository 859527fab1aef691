//! MIDI message types
//!
//! Parses and encodes the channel-voice and system-exclusive subset spoken by
//! Mackie Control surfaces. Everything else on the wire is dropped at parse time.

use std::fmt;

/// MIDI message types understood by the bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note Off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },

    /// Note On: channel (0-15), note (0-127), velocity (0-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },

    /// Control Change: channel (0-15), cc (0-127), value (0-127)
    ControlChange { channel: u8, cc: u8, value: u8 },

    /// Pitch Bend: channel (0-15), value (0-16383, 14-bit)
    PitchBend { channel: u8, value: u16 },

    /// System Exclusive payload, without the F0/F7 framing
    SysEx { data: Vec<u8> },
}

impl MidiMessage {
    /// Parse a MIDI message from raw bytes
    ///
    /// Unlike a general-purpose parser, NoteOn with velocity 0 stays a NoteOn:
    /// the surface protocol treats it as a button release on the same note.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let (&status, rest) = data.split_first()?;

        // Running status would need per-port state; MCU devices don't use it
        if status < 0x80 {
            return None;
        }

        if status == 0xF0 {
            let end = rest.iter().position(|&b| b == 0xF7)?;
            return Some(MidiMessage::SysEx {
                data: rest[..end].to_vec(),
            });
        }

        if status >= 0xF0 || rest.len() < 2 {
            return None;
        }

        let channel = status & 0x0F;
        let d1 = rest[0] & 0x7F;
        let d2 = rest[1] & 0x7F;

        match status & 0xF0 {
            0x80 => Some(MidiMessage::NoteOff {
                channel,
                note: d1,
                velocity: d2,
            }),
            0x90 => Some(MidiMessage::NoteOn {
                channel,
                note: d1,
                velocity: d2,
            }),
            0xB0 => Some(MidiMessage::ControlChange {
                channel,
                cc: d1,
                value: d2,
            }),
            0xE0 => Some(MidiMessage::PitchBend {
                channel,
                value: pb14_from_raw(d1, d2),
            }),
            _ => None,
        }
    }

    /// Encode the message to MIDI bytes
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            MidiMessage::NoteOff { channel, note, velocity } => {
                vec![0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            MidiMessage::NoteOn { channel, note, velocity } => {
                vec![0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            MidiMessage::ControlChange { channel, cc, value } => {
                vec![0xB0 | (channel & 0x0F), cc & 0x7F, value & 0x7F]
            }
            MidiMessage::PitchBend { channel, value } => {
                let lsb = (value & 0x7F) as u8;
                let msb = ((value >> 7) & 0x7F) as u8;
                vec![0xE0 | (channel & 0x0F), lsb, msb]
            }
            MidiMessage::SysEx { ref data } => {
                let mut result = Vec::with_capacity(data.len() + 2);
                result.push(0xF0);
                result.extend_from_slice(data);
                result.push(0xF7);
                result
            }
        }
    }

    /// Get the channel for channel messages (0-15), None for SysEx
    pub fn channel(&self) -> Option<u8> {
        match *self {
            MidiMessage::NoteOff { channel, .. }
            | MidiMessage::NoteOn { channel, .. }
            | MidiMessage::ControlChange { channel, .. }
            | MidiMessage::PitchBend { channel, .. } => Some(channel),
            MidiMessage::SysEx { .. } => None,
        }
    }
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MidiMessage::NoteOff { channel, note, velocity } => {
                write!(f, "NoteOff ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            MidiMessage::NoteOn { channel, note, velocity } => {
                write!(f, "NoteOn ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            MidiMessage::ControlChange { channel, cc, value } => {
                write!(f, "CC ch:{} cc:{} v:{}", channel + 1, cc, value)
            }
            MidiMessage::PitchBend { channel, value } => {
                write!(f, "PitchBend ch:{} v:{}", channel + 1, value)
            }
            MidiMessage::SysEx { ref data } => write!(f, "SysEx {} bytes", data.len()),
        }
    }
}

/// Combine the two 7-bit data bytes of a pitch bend into a 14-bit value
pub fn pb14_from_raw(lsb: u8, msb: u8) -> u16 {
    (((msb & 0x7F) as u16) << 7) | ((lsb & 0x7F) as u16)
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
