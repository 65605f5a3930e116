//! Mock console implementation for testing
//!
//! Scripted input, captured output. Tests push bytes as if they were typed
//! on the serial line and inspect everything the terminal echoed or printed.

use crate::platform::traits::ConsoleInterface;
use std::collections::VecDeque;
use std::string::String;
use std::vec::Vec;

/// Mock console with scripted input and captured output
#[derive(Debug, Default)]
pub struct MockConsole {
    /// Pending input bytes (as if received over UART)
    input: VecDeque<u8>,
    /// Everything written to the console
    output: Vec<u8>,
}

impl MockConsole {
    /// Create a new mock console with no pending input
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a string as console input
    pub fn push_input(&mut self, s: &str) {
        self.input.extend(s.as_bytes());
    }

    /// Queue raw bytes as console input
    pub fn push_input_bytes(&mut self, bytes: &[u8]) {
        self.input.extend(bytes);
    }

    /// Captured output as a lossy string (for assertions)
    pub fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    /// Captured output bytes
    pub fn output_bytes(&self) -> &[u8] {
        &self.output
    }

    /// Discard captured output
    pub fn clear_output(&mut self) {
        self.output.clear();
    }
}

impl ConsoleInterface for MockConsole {
    fn has_byte(&self) -> bool {
        !self.input.is_empty()
    }

    fn take_byte(&mut self) -> u8 {
        self.input.pop_front().unwrap_or(0)
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.output.extend_from_slice(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_input() {
        let mut console = MockConsole::new();
        console.push_input("ab");

        assert!(console.has_byte());
        assert_eq!(console.take_byte(), b'a');
        assert_eq!(console.take_byte(), b'b');
        assert!(!console.has_byte());
    }

    #[test]
    fn test_captured_output() {
        let mut console = MockConsole::new();
        console.write_line("hello");
        assert_eq!(console.output_str(), "hello\r\n");

        console.clear_output();
        assert!(console.output_bytes().is_empty());
    }
}
