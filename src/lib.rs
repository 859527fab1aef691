//! MCU Bridge
//!
//! Bridges a Mackie Control style surface and a DAW mixer: decodes surface
//! MIDI into a shared channel registry with debounced change notifications,
//! and resolves per-device parameter presentation settings.

pub mod config;
pub mod context;
pub mod mcu;
pub mod midi;
pub mod mixer;
pub mod modes;
pub mod paths;
pub mod settings;

pub use context::BridgeContext;
pub use mcu::{McuDecoder, McuEncoder, ProtocolLayout, SurfaceEvent};
pub use settings::{SettingsEngine, SettingsError};
