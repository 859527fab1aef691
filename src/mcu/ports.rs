//! MIDI transport: midir input/output ports matched by name
//!
//! Port names are matched by case-insensitive substring, so a config can say
//! "x-touch" and still find "X-Touch INT 2" on Windows.

use anyhow::{anyhow, Context, Result};
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::midi::{format_hex, MidiMessage};

const CLIENT_NAME: &str = "MCU-Bridge";

/// List available MIDI input ports
pub fn list_input_ports() -> Result<Vec<String>> {
    let midi_in = MidiInput::new("MCU-Bridge-Scanner")?;
    Ok(midi_in
        .ports()
        .iter()
        .filter_map(|port| midi_in.port_name(port).ok())
        .collect())
}

/// List available MIDI output ports
pub fn list_output_ports() -> Result<Vec<String>> {
    let midi_out = MidiOutput::new("MCU-Bridge-Scanner")?;
    Ok(midi_out
        .ports()
        .iter()
        .filter_map(|port| midi_out.port_name(port).ok())
        .collect())
}

fn matches(name: &str, pattern: &str) -> bool {
    name.to_lowercase().contains(&pattern.to_lowercase())
}

/// Open input port; parsed messages are delivered on midir's listener thread
pub struct MidiInputPort {
    name: String,
    _conn: MidiInputConnection<()>,
}

impl MidiInputPort {
    /// Connect to the first input whose name contains `pattern`
    ///
    /// Messages reach `sink` in arrival order. A full channel drops the
    /// message rather than blocking the MIDI thread.
    pub fn connect(pattern: &str, sink: mpsc::Sender<MidiMessage>) -> Result<Self> {
        let mut midi_in =
            MidiInput::new(&format!("{}-Input", CLIENT_NAME)).context("Failed to create MIDI input")?;
        midi_in.ignore(midir::Ignore::None);

        debug!("Found {} MIDI input ports", midi_in.port_count());
        let (port, name) = midi_in
            .ports()
            .into_iter()
            .find_map(|port| {
                let name = midi_in.port_name(&port).ok()?;
                matches(&name, pattern).then_some((port, name))
            })
            .ok_or_else(|| anyhow!("Input port '{}' not found", pattern))?;

        info!("Connecting to input port: {}", name);

        let conn = midi_in
            .connect(
                &port,
                CLIENT_NAME,
                move |_timestamp, data, _| match MidiMessage::parse(data) {
                    Some(message) => {
                        if sink.try_send(message).is_err() {
                            warn!("MIDI input queue full, dropping {}", format_hex(data));
                        }
                    }
                    None => trace!("Unparsed MIDI: {}", format_hex(data)),
                },
                (),
            )
            .map_err(|e| anyhow!("Failed to connect to input port '{}': {}", name, e))?;

        Ok(Self { name, _conn: conn })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Output port handle; empty until a device opens successfully
///
/// Sending with no open device is a silent no-op. A failed open is not
/// retried until another device name is assigned.
#[derive(Default)]
pub struct MidiOutputPort {
    device: Option<String>,
    conn: Mutex<Option<MidiOutputConnection>>,
}

impl MidiOutputPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a device name and try to open it; returns whether it opened
    pub fn set_device(&mut self, pattern: &str) -> bool {
        self.device = Some(pattern.to_string());
        let opened = match open_output(pattern) {
            Ok(conn) => Some(conn),
            Err(e) => {
                warn!("MIDI output '{}' unavailable: {:#}", pattern, e);
                None
            }
        };
        let is_open = opened.is_some();
        *self.conn.get_mut() = opened;
        is_open
    }

    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.conn.lock().is_some()
    }

    pub fn send(&self, message: &MidiMessage) {
        let mut guard = self.conn.lock();
        let Some(conn) = guard.as_mut() else {
            return;
        };

        let data = message.encode();
        match conn.send(&data) {
            Ok(()) => trace!("Sent: {} | {}", format_hex(&data), message),
            Err(e) => debug!("MIDI send failed ({}): {}", e, format_hex(&data)),
        }
    }
}

fn open_output(pattern: &str) -> Result<MidiOutputConnection> {
    let midi_out =
        MidiOutput::new(&format!("{}-Output", CLIENT_NAME)).context("Failed to create MIDI output")?;

    debug!("Found {} MIDI output ports", midi_out.port_count());
    let (port, name) = midi_out
        .ports()
        .into_iter()
        .find_map(|port| {
            let name = midi_out.port_name(&port).ok()?;
            matches(&name, pattern).then_some((port, name))
        })
        .ok_or_else(|| anyhow!("Output port '{}' not found", pattern))?;

    info!("Connecting to output port: {}", name);
    midi_out
        .connect(&port, CLIENT_NAME)
        .map_err(|e| anyhow!("Failed to connect to output port '{}': {}", name, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_name_matching() {
        assert!(matches("X-Touch INT 2", "x-touch"));
        assert!(matches("loopMIDI Port", "LOOPMIDI"));
        assert!(!matches("X-Touch", "qcon"));
    }

    #[test]
    fn test_empty_output_is_silent() {
        let port = MidiOutputPort::new();
        assert!(!port.is_open());
        assert_eq!(port.device(), None);
        port.send(&MidiMessage::NoteOn {
            channel: 0,
            note: 1,
            velocity: 127,
        });
    }
}
