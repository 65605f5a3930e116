//! End-to-end tests over the public API
//!
//! Drives the whole engine the way the firmware main loop does: bytes in
//! through the console trait, packets in through the deferred slot, with
//! both surfaces sharing one registry and one persisted store.

use sensecube::core::modules::{ModuleCfgByte, ModuleId, ModuleRegistry, Severity};
use sensecube::core::store::{EepromStore, PersistentStore};
use sensecube::modules::MODULES;
use sensecube::platform::error::EepromError;
use sensecube::platform::traits::{ConsoleInterface, EepromInterface};
use sensecube::terminal::cmdset::{ROOT_IDX_SET, ROOT_IDX_SHOW};
use sensecube::terminal::remote::{self, PacketHeader, CORE_API_VERSION, OPCODE_SINGLE};
use sensecube::terminal::{DeferredSlot, LocalTerminal};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Plain in-memory EEPROM
struct TestEeprom {
    storage: Vec<u8>,
}

impl TestEeprom {
    fn new() -> Self {
        Self {
            storage: vec![0; 2048],
        }
    }
}

impl EepromInterface for TestEeprom {
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<(), EepromError> {
        let start = address as usize;
        if start + buf.len() > self.storage.len() {
            return Err(EepromError::InvalidAddress);
        }
        buf.copy_from_slice(&self.storage[start..start + buf.len()]);
        Ok(())
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<(), EepromError> {
        let start = address as usize;
        if start + data.len() > self.storage.len() {
            return Err(EepromError::InvalidAddress);
        }
        self.storage[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn capacity(&self) -> u32 {
        self.storage.len() as u32
    }
}

/// Scripted console
#[derive(Default)]
struct TestConsole {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl TestConsole {
    fn type_line(&mut self, line: &str) {
        self.input.extend(line.as_bytes());
        self.input.push_back(b'\r');
    }

    fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl ConsoleInterface for TestConsole {
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

static UPLINK: Mutex<Vec<Vec<u8>>> = Mutex::new(Vec::new());

fn uplink(bytes: &[u8]) {
    UPLINK.lock().unwrap().push(bytes.to_vec());
}

#[test]
fn console_write_is_visible_to_the_remote_surface() {
    let mut registry = ModuleRegistry::new(MODULES);
    let mut store = EepromStore::new(TestEeprom::new(), MODULES);
    let mut console = TestConsole::default();
    let mut terminal = LocalTerminal::new();

    // operator persists a new base period over the serial line
    console.type_line("set core basePeriod 5000");
    terminal.poll(&mut console, &mut registry, &mut store);
    assert!(console.output_str().contains("Write success!"));

    // the gateway reads the same variable over the downlink
    let packet = [
        PacketHeader {
            opcode: OPCODE_SINGLE,
            wide_module_id: false,
            seq: 5,
        }
        .to_byte(),
        CORE_API_VERSION,
        ROOT_IDX_SHOW,
        0, // module id: core
        0, // leaf index: basePeriod
    ];
    let response = remote::process_packet(&packet, &mut registry, &mut store);
    assert_eq!(response.bytes[0], packet[0]);
    assert_eq!(response.bytes[1], 5); // status + u32 payload
    assert_eq!(response.bytes[2], 0); // ok
    assert_eq!(&response.bytes[3..7], &5000u32.to_le_bytes());
}

#[test]
fn remote_write_is_visible_on_the_console() {
    let mut registry = ModuleRegistry::new(MODULES);
    let mut store = EepromStore::new(TestEeprom::new(), MODULES);
    let mut console = TestConsole::default();
    let mut terminal = LocalTerminal::new();

    let mut packet = vec![
        PacketHeader {
            opcode: OPCODE_SINGLE,
            wide_module_id: false,
            seq: 1,
        }
        .to_byte(),
        CORE_API_VERSION,
        ROOT_IDX_SET,
        0,
        1, // leaf index: startDelay
    ];
    packet.extend(2500u32.to_le_bytes());
    let response = remote::process_packet(&packet, &mut registry, &mut store);
    assert_eq!(&response.bytes[1..], &[1, 0]);

    console.type_line("show core startDelay");
    terminal.poll(&mut console, &mut registry, &mut store);
    assert!(console.output_str().contains("2500"));
}

#[test]
fn deferred_packet_flows_from_isr_to_response() {
    let mut registry = ModuleRegistry::new(MODULES);
    let mut store = EepromStore::new(TestEeprom::new(), MODULES);
    let slot = DeferredSlot::new();

    UPLINK.lock().unwrap().clear();

    // "ISR": enable the HDC1080 module remotely
    let mut packet = vec![
        PacketHeader {
            opcode: OPCODE_SINGLE,
            wide_module_id: false,
            seq: 2,
        }
        .to_byte(),
        CORE_API_VERSION,
        3, // root index: enable
    ];
    packet.extend(ModuleId::Hdc1080.as_u16().to_le_bytes());
    packet.push(Severity::Info as u8);
    slot.defer(&packet, uplink);

    // main loop drains the slot and answers exactly once
    assert!(!remote::poll(&slot, &mut registry, &mut store));
    assert!(!remote::poll(&slot, &mut registry, &mut store));

    let responses = UPLINK.lock().unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(&responses[0][1..], &[1, 0]);
    drop(responses);

    // the enable landed in the persisted record, pending until reload
    let mut byte = [0u8];
    store.load(ModuleId::Hdc1080, 0, &mut byte).unwrap();
    let cfg = ModuleCfgByte::from_byte(byte[0]);
    assert!(cfg.enable);
    assert_eq!(cfg.severity, Severity::Info);
    assert!(!registry.is_enabled(ModuleId::Hdc1080));

    // after "reload", the registry picks the new state up from the store
    registry.init_from_store(&mut store).unwrap();
    assert!(registry.is_enabled(ModuleId::Hdc1080));
}
