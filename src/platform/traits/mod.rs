//! Platform abstraction traits
//!
//! This module defines the traits that platform implementations must provide.

pub mod console;
pub mod eeprom;
pub mod radio;

// Re-export trait interfaces
pub use console::ConsoleInterface;
pub use eeprom::EepromInterface;
pub use radio::RadioInterface;
