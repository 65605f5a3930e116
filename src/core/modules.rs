//! Module system
//!
//! Every pluggable part of the node (sensors, communication, diagnostics) is
//! a module: a static descriptor plus a small configuration record. The
//! first byte of every record is the module configuration byte packing the
//! enable bit and the message severity; the rest is module-specific.
//!
//! The registry owns the *live* (RAM) copy of each record. The persisted
//! copy lives in EEPROM behind [`crate::core::store::PersistentStore`], at a
//! per-module base offset computed from the table order.

use heapless::Vec;

/// Maximum number of modules in the registry
pub const MAX_MODULES: usize = 16;

/// Maximum per-module configuration record length in bytes
pub const MAX_CFG_LEN: usize = 96;

/// Global module identifiers
///
/// These identifiers are stable wire values used by the remote terminal;
/// never renumber existing entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ModuleId {
    /// Node core
    Core = 0,
    /// Peripheral drivers (configuration lives in the core record)
    Drivers = 1,
    /// Local serial terminal
    LocalTerminal = 2,
    /// Remote (downlink) terminal
    RemoteTerminal = 3,
    /// LoRa communication module
    Lora = 128,
    /// Verbose diagnostics output
    DebugDisplay = 129,
    /// HDC1080 relative humidity / temperature sensor
    Hdc1080 = 130,
    /// Battery measurement
    BatMeas = 131,
    /// Invalid / unassigned
    Invalid = 0xFFFF,
}

impl ModuleId {
    /// Wire representation
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Parse a wire module id; unknown values map to `Invalid`
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => ModuleId::Core,
            1 => ModuleId::Drivers,
            2 => ModuleId::LocalTerminal,
            3 => ModuleId::RemoteTerminal,
            128 => ModuleId::Lora,
            129 => ModuleId::DebugDisplay,
            130 => ModuleId::Hdc1080,
            131 => ModuleId::BatMeas,
            _ => ModuleId::Invalid,
        }
    }
}

/// Message severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Severity {
    /// No messages
    None = 0,
    /// Errors only
    Error = 1,
    /// Errors and info
    Info = 2,
    /// Everything
    Debug = 3,
}

impl Severity {
    /// Decode from the two severity bits of a configuration byte
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Severity::None,
            1 => Severity::Error,
            2 => Severity::Info,
            _ => Severity::Debug,
        }
    }

    /// Human-readable alias
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::None => "NONE",
            Severity::Error => "ERROR",
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
        }
    }

    /// Single-letter alias used by the module listing
    pub fn letter(self) -> char {
        match self {
            Severity::None => 'N',
            Severity::Error => 'R',
            Severity::Info => 'I',
            Severity::Debug => 'D',
        }
    }
}

/// Module configuration byte: enable (bit 0) + severity (bits 1..=2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleCfgByte {
    /// Module enable
    pub enable: bool,
    /// Module message severity
    pub severity: Severity,
}

impl ModuleCfgByte {
    /// Pack into the stored byte representation
    pub fn to_byte(self) -> u8 {
        (self.enable as u8) | ((self.severity as u8) << 1)
    }

    /// Unpack from the stored byte representation
    pub fn from_byte(byte: u8) -> Self {
        Self {
            enable: byte & 0x01 != 0,
            severity: Severity::from_bits(byte >> 1),
        }
    }
}

/// Module registry error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleError {
    /// No module with the given id
    NotFound,
    /// Offset/length outside the module's configuration record
    OutOfRange,
    /// Persisted store failure while loading a record
    Io,
}

/// Static module descriptor
///
/// The externally owned module table is a `&'static [ModuleDescriptor]`;
/// descriptors are defined once at build time and never mutated.
pub struct ModuleDescriptor {
    /// Module name as typed on the console
    pub name: &'static str,
    /// Human-readable description
    pub descr: &'static str,
    /// Global module identifier
    pub id: ModuleId,
    /// Configuration record length in bytes (>= 1, cfg byte included)
    pub cfg_len: usize,
    /// Factory-default record contents (exactly `cfg_len` bytes)
    pub cfg_defaults: &'static [u8],
}

/// Module registry with live configuration records
///
/// Holds the running (RAM) copy of every module's configuration record,
/// initialized from the descriptor defaults and optionally refreshed from
/// the persisted store at boot.
pub struct ModuleRegistry {
    modules: &'static [ModuleDescriptor],
    ram: Vec<Vec<u8, MAX_CFG_LEN>, MAX_MODULES>,
}

impl ModuleRegistry {
    /// Create a registry over a static module table, records at defaults
    pub fn new(modules: &'static [ModuleDescriptor]) -> Self {
        let mut ram = Vec::new();
        for descr in modules {
            let mut record: Vec<u8, MAX_CFG_LEN> = Vec::new();
            record.extend_from_slice(descr.cfg_defaults).ok();
            // pad if defaults are shorter than the declared record
            while record.len() < descr.cfg_len {
                record.push(0).ok();
            }
            ram.push(record).ok();
        }
        Self { modules, ram }
    }

    /// The static module table
    pub fn descriptors(&self) -> &'static [ModuleDescriptor] {
        self.modules
    }

    /// Number of modules
    pub fn count(&self) -> usize {
        self.modules.len()
    }

    /// Find a module index by id
    pub fn index_of(&self, id: ModuleId) -> Option<usize> {
        self.modules.iter().position(|m| m.id == id)
    }

    /// Find a module by console name (exact match)
    pub fn find_by_name(&self, name: &str) -> Option<&'static ModuleDescriptor> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Read from a module's live configuration record
    pub fn ram_read(&self, id: ModuleId, offset: usize, buf: &mut [u8]) -> Result<(), ModuleError> {
        let index = self.index_of(id).ok_or(ModuleError::NotFound)?;
        let record = &self.ram[index];
        if offset + buf.len() > record.len() {
            return Err(ModuleError::OutOfRange);
        }
        buf.copy_from_slice(&record[offset..offset + buf.len()]);
        Ok(())
    }

    /// Write into a module's live configuration record
    pub fn ram_write(&mut self, id: ModuleId, offset: usize, data: &[u8]) -> Result<(), ModuleError> {
        let index = self.index_of(id).ok_or(ModuleError::NotFound)?;
        let record = &mut self.ram[index];
        if offset + data.len() > record.len() {
            return Err(ModuleError::OutOfRange);
        }
        record[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Running configuration byte of the module at `index`
    pub fn cfg_byte(&self, index: usize) -> ModuleCfgByte {
        ModuleCfgByte::from_byte(self.ram[index][0])
    }

    /// True if the module is enabled in the running configuration
    pub fn is_enabled(&self, id: ModuleId) -> bool {
        self.index_of(id)
            .map(|i| self.cfg_byte(i).enable)
            .unwrap_or(false)
    }

    /// Load every module's persisted record into the live copy
    ///
    /// Missing or failing modules keep their defaults; the first store error
    /// is reported after all modules were attempted.
    pub fn init_from_store(
        &mut self,
        store: &mut dyn crate::core::store::PersistentStore,
    ) -> Result<(), ModuleError> {
        let mut result = Ok(());
        for index in 0..self.modules.len() {
            let descr = &self.modules[index];
            let mut buf = [0u8; MAX_CFG_LEN];
            let len = descr.cfg_len;
            match store.load(descr.id, 0, &mut buf[..len]) {
                Ok(()) => {
                    self.ram[index][..len].copy_from_slice(&buf[..len]);
                }
                Err(_) => {
                    crate::log_warn!("module cfg load failed, keeping defaults");
                    result = Err(ModuleError::Io);
                }
            }
        }
        result
    }
}
