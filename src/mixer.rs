//! Mixer state - canonical per-channel model shared between the decoder and consumers
//!
//! The registry holds the fixed set of channel strips created at startup. The
//! coalescer batches mutations into debounced "data changed" / "value changed"
//! notifications so consumers only observe state once a burst has settled.

mod channel;
mod coalescer;
mod registry;

pub use channel::{Channel, PropertyType};
pub use coalescer::{ChangeCoalescer, ChangeKind, Debounce, DEFAULT_DATA_DEBOUNCE_MS, DEFAULT_VALUE_DEBOUNCE_MS};
pub use registry::ChannelRegistry;
