//! EEPROM interface trait
//!
//! Non-volatile configuration storage. The engine addresses configuration by
//! (module, offset); the mapping to absolute device addresses happens in
//! [`crate::core::store`]. Implementations only provide flat byte access.

use crate::platform::error::EepromError;

/// Byte-addressable non-volatile storage
///
/// Unlike Flash, EEPROM is written in place with no erase step, so the
/// interface is a plain read/write pair.
pub trait EepromInterface {
    /// Read `buf.len()` bytes starting at `address`
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<(), EepromError>;

    /// Write `data` starting at `address`
    fn write(&mut self, address: u32, data: &[u8]) -> Result<(), EepromError>;

    /// Total device capacity in bytes
    fn capacity(&self) -> u32;
}
