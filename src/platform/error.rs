//! Platform error types
//!
//! This module defines error types for platform operations.

use core::fmt;

/// Result type for platform operations
pub type Result<T> = core::result::Result<T, PlatformError>;

/// Platform-level errors
///
/// All platform implementations map their HAL-specific errors to these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformError {
    /// EEPROM operation failed
    Eeprom(EepromError),
    /// Console (UART) operation failed
    Console(ConsoleError),
    /// Radio operation failed
    Radio(RadioError),
    /// Platform initialization failed
    InitializationFailed,
    /// Invalid configuration provided
    InvalidConfig,
}

/// EEPROM-specific errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EepromError {
    /// Read operation failed
    ReadFailed,
    /// Write operation failed
    WriteFailed,
    /// Address outside the device
    InvalidAddress,
}

/// Console-specific errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleError {
    /// Write operation failed
    WriteFailed,
    /// Receive overrun (bytes lost before the main loop drained them)
    Overrun,
}

/// Radio-specific errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// Transmit failed or was rejected by the MAC layer
    TxFailed,
    /// Radio is busy (duty-cycle or ongoing transfer)
    Busy,
}

impl From<EepromError> for PlatformError {
    fn from(err: EepromError) -> Self {
        PlatformError::Eeprom(err)
    }
}

impl From<ConsoleError> for PlatformError {
    fn from(err: ConsoleError) -> Self {
        PlatformError::Console(err)
    }
}

impl From<RadioError> for PlatformError {
    fn from(err: RadioError) -> Self {
        PlatformError::Radio(err)
    }
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::Eeprom(e) => write!(f, "EEPROM error: {:?}", e),
            PlatformError::Console(e) => write!(f, "Console error: {:?}", e),
            PlatformError::Radio(e) => write!(f, "Radio error: {:?}", e),
            PlatformError::InitializationFailed => write!(f, "Platform initialization failed"),
            PlatformError::InvalidConfig => write!(f, "Invalid configuration"),
        }
    }
}
