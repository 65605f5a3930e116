//! Measurement and communication modules
//!
//! Each module contributes a configuration record layout, factory defaults
//! and a command sub-table. The static [`MODULES`] table is the externally
//! owned module list the registry and the persisted store are built over;
//! its order fixes the EEPROM layout, so append only.

pub mod batmeas;
pub mod hdc1080;
pub mod lora;

use crate::core::config::{CORE_CFG_DEFAULTS, CORE_CFG_LEN};
use crate::core::modules::{ModuleDescriptor, ModuleId};

/// Verbose-diagnostics pseudo-module: configuration byte only
static DEBUG_DISPLAY_DEFAULTS: [u8; 1] = [0x02]; // disabled, severity ERROR

/// The node's module table
pub static MODULES: &[ModuleDescriptor] = &[
    ModuleDescriptor {
        name: "core",
        descr: "Node core",
        id: ModuleId::Core,
        cfg_len: CORE_CFG_LEN,
        cfg_defaults: &CORE_CFG_DEFAULTS,
    },
    ModuleDescriptor {
        name: "DebugDisplay",
        descr: "Verbose diagnostics on the serial console",
        id: ModuleId::DebugDisplay,
        cfg_len: 1,
        cfg_defaults: &DEBUG_DISPLAY_DEFAULTS,
    },
    ModuleDescriptor {
        name: "HDC1080",
        descr: "Relative humidity and temperature sensor",
        id: ModuleId::Hdc1080,
        cfg_len: hdc1080::HDC1080_CFG_LEN,
        cfg_defaults: &hdc1080::HDC1080_CFG_DEFAULTS,
    },
    ModuleDescriptor {
        name: "batMeas",
        descr: "Battery voltage measurement",
        id: ModuleId::BatMeas,
        cfg_len: batmeas::BATMEAS_CFG_LEN,
        cfg_defaults: &batmeas::BATMEAS_CFG_DEFAULTS,
    },
    ModuleDescriptor {
        name: "LoRa",
        descr: "LoRa communication module",
        id: ModuleId::Lora,
        cfg_len: lora::LORA_CFG_LEN,
        cfg_defaults: &lora::LORA_CFG_DEFAULTS,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::modules::MAX_CFG_LEN;

    #[test]
    fn test_defaults_match_declared_lengths() {
        for descr in MODULES {
            assert_eq!(
                descr.cfg_defaults.len(),
                descr.cfg_len,
                "defaults/len mismatch for {}",
                descr.name
            );
            assert!(descr.cfg_len >= 1);
            assert!(descr.cfg_len <= MAX_CFG_LEN);
        }
    }

    #[test]
    fn test_module_ids_are_unique() {
        for (i, a) in MODULES.iter().enumerate() {
            for b in &MODULES[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }
}
