//! Platform abstraction layer
//!
//! This module provides hardware abstraction for the peripherals the command
//! engine touches. All platform-specific code lives behind these traits; the
//! library itself never talks to registers.

pub mod error;
pub mod traits;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types
pub use error::{ConsoleError, EepromError, PlatformError, RadioError, Result};
pub use traits::{ConsoleInterface, EepromInterface, RadioInterface};
