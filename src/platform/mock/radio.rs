//! Mock radio implementation for testing
//!
//! Records uplink payloads for inspection and can simulate transmit failures.

use crate::platform::error::RadioError;
use crate::platform::traits::RadioInterface;
use std::vec::Vec;

/// Mock radio recording every transmitted payload
#[derive(Debug, Default)]
pub struct MockRadio {
    /// Transmitted payloads, in order
    sent: Vec<Vec<u8>>,
    /// Fail the next send with `RadioError::TxFailed`
    fail_next_send: bool,
}

impl MockRadio {
    /// Create a new mock radio
    pub fn new() -> Self {
        Self::default()
    }

    /// Payloads transmitted so far
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// Fail the next send
    pub fn inject_tx_fault(&mut self) {
        self.fail_next_send = true;
    }
}

impl RadioInterface for MockRadio {
    fn send(&mut self, data: &[u8]) -> Result<(), RadioError> {
        if self.fail_next_send {
            self.fail_next_send = false;
            return Err(RadioError::TxFailed);
        }
        self.sent.push(data.to_vec());
        Ok(())
    }
}
