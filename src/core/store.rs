//! Persisted configuration store
//!
//! Configuration is addressed as (module id, offset, length) everywhere in
//! the engine; this module maps that onto a flat EEPROM device. Each module
//! owns a contiguous slice of the configuration area starting at a base
//! offset; bases are the cumulative sum of record lengths in module-table
//! order, so the layout is fully determined by the static table.

use crate::core::modules::{ModuleDescriptor, ModuleId};
use crate::platform::error::EepromError;
use crate::platform::traits::EepromInterface;

/// Persisted-store error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// No module with the given id
    ModuleNotFound,
    /// Offset/length outside the module's configuration record
    OutOfRange,
    /// Underlying device failure
    Io,
}

impl From<EepromError> for StoreError {
    fn from(_: EepromError) -> Self {
        StoreError::Io
    }
}

/// Module-relative persisted configuration access
///
/// The engine's only view of non-volatile storage.
pub trait PersistentStore {
    /// Read `buf.len()` bytes at `offset` within the module's record
    fn load(&mut self, module: ModuleId, offset: u16, buf: &mut [u8]) -> Result<(), StoreError>;

    /// Write `data` at `offset` within the module's record
    fn save(&mut self, module: ModuleId, offset: u16, data: &[u8]) -> Result<(), StoreError>;
}

/// EEPROM base offset of a module's record within the configuration area
pub fn module_base(modules: &[ModuleDescriptor], id: ModuleId) -> Option<u32> {
    let mut base = 0u32;
    for descr in modules {
        if descr.id == id {
            return Some(base);
        }
        base += descr.cfg_len as u32;
    }
    None
}

/// [`PersistentStore`] over an EEPROM device
pub struct EepromStore<E: EepromInterface> {
    eeprom: E,
    modules: &'static [ModuleDescriptor],
}

impl<E: EepromInterface> EepromStore<E> {
    /// Create a store over `eeprom`, laid out per the module table
    pub fn new(eeprom: E, modules: &'static [ModuleDescriptor]) -> Self {
        Self { eeprom, modules }
    }

    /// Access the underlying device (test inspection, fault injection)
    pub fn eeprom_mut(&mut self) -> &mut E {
        &mut self.eeprom
    }

    fn locate(&self, module: ModuleId, offset: u16, len: usize) -> Result<u32, StoreError> {
        let descr = self
            .modules
            .iter()
            .find(|m| m.id == module)
            .ok_or(StoreError::ModuleNotFound)?;
        if offset as usize + len > descr.cfg_len {
            return Err(StoreError::OutOfRange);
        }
        let base = module_base(self.modules, module).ok_or(StoreError::ModuleNotFound)?;
        Ok(base + offset as u32)
    }
}

impl<E: EepromInterface> PersistentStore for EepromStore<E> {
    fn load(&mut self, module: ModuleId, offset: u16, buf: &mut [u8]) -> Result<(), StoreError> {
        let address = self.locate(module, offset, buf.len())?;
        self.eeprom.read(address, buf)?;
        Ok(())
    }

    fn save(&mut self, module: ModuleId, offset: u16, data: &[u8]) -> Result<(), StoreError> {
        let address = self.locate(module, offset, data.len())?;
        self.eeprom.write(address, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockEeprom;

    static DEFAULTS_A: [u8; 3] = [1, 2, 3];
    static DEFAULTS_B: [u8; 2] = [4, 5];

    static TEST_MODULES: &[ModuleDescriptor] = &[
        ModuleDescriptor {
            name: "a",
            descr: "first",
            id: ModuleId::Core,
            cfg_len: 3,
            cfg_defaults: &DEFAULTS_A,
        },
        ModuleDescriptor {
            name: "b",
            descr: "second",
            id: ModuleId::Lora,
            cfg_len: 2,
            cfg_defaults: &DEFAULTS_B,
        },
    ];

    #[test]
    fn test_module_bases_are_cumulative() {
        assert_eq!(module_base(TEST_MODULES, ModuleId::Core), Some(0));
        assert_eq!(module_base(TEST_MODULES, ModuleId::Lora), Some(3));
        assert_eq!(module_base(TEST_MODULES, ModuleId::BatMeas), None);
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut store = EepromStore::new(MockEeprom::new(), TEST_MODULES);

        store.save(ModuleId::Lora, 0, &[0xAB, 0xCD]).unwrap();

        let mut buf = [0u8; 2];
        store.load(ModuleId::Lora, 0, &mut buf).unwrap();
        assert_eq!(buf, [0xAB, 0xCD]);

        // the second module's record starts after the first one's
        assert_eq!(store.eeprom_mut().get_contents(3, 2), vec![0xAB, 0xCD]);
    }

    #[test]
    fn test_out_of_range() {
        let mut store = EepromStore::new(MockEeprom::new(), TEST_MODULES);
        assert_eq!(
            store.save(ModuleId::Core, 2, &[0, 0]),
            Err(StoreError::OutOfRange)
        );
    }

    #[test]
    fn test_unknown_module() {
        let mut store = EepromStore::new(MockEeprom::new(), TEST_MODULES);
        let mut buf = [0u8; 1];
        assert_eq!(
            store.load(ModuleId::Hdc1080, 0, &mut buf),
            Err(StoreError::ModuleNotFound)
        );
    }

    #[test]
    fn test_device_failure_maps_to_io() {
        let mut store = EepromStore::new(MockEeprom::new(), TEST_MODULES);
        store.eeprom_mut().inject_write_fault();
        assert_eq!(store.save(ModuleId::Core, 0, &[0]), Err(StoreError::Io));
    }
}
