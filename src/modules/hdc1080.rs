//! HDC1080/HDC2080 humidity and temperature sensor module
//!
//! Register access and the measurement math live in the driver layer; the
//! module owns the sensor-type selection.

use crate::core::modules::ModuleId;
use crate::terminal::command::{CommandNode, CommandPayload, ConfigVar};
use crate::terminal::flags::CommandFlags;
use crate::terminal::params::ParamKind;

/// Module configuration byte
pub const HDC1080_CFG_ADR_CFG: u16 = 0;
/// Sensor type selection (byte)
pub const HDC1080_CFG_ADR_TYPE: u16 = 1;

/// HDC1080 configuration record length
pub const HDC1080_CFG_LEN: usize = 2;

/// Factory defaults: disabled, severity ERROR, auto-detect
pub static HDC1080_CFG_DEFAULTS: [u8; HDC1080_CFG_LEN] = [0x02, 0x00];

/// HDC1080 command sub-table
pub const HDC1080_COMMANDS: &[CommandNode] = &[CommandNode {
    label: "type",
    help: "Sensor type (0: auto-detect; 1: HDC1080; 2: HDC2080)",
    flags: CommandFlags {
        local: true,
        remote: true,
        set: true,
        show: true,
        eeprom: true,
        ram: true,
        generic: true,
        ..CommandFlags::none()
    },
    input: ParamKind::Byte,
    output: ParamKind::Byte,
    payload: CommandPayload::Config(ConfigVar {
        module: ModuleId::Hdc1080,
        offset: HDC1080_CFG_ADR_TYPE,
        len: 1,
    }),
    module: ModuleId::Hdc1080,
}];
