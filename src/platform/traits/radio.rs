//! Radio transport interface trait
//!
//! The LoRaWAN MAC state machine lives outside this crate. The engine only
//! needs an uplink path for command responses and sensor payloads; downlink
//! packets are handed to [`crate::terminal::defer::DeferredSlot`] from the
//! receive interrupt.

use crate::platform::error::RadioError;

/// Uplink-capable radio transport
pub trait RadioInterface {
    /// Queue a payload for uplink transmission
    fn send(&mut self, data: &[u8]) -> Result<(), RadioError>;
}
