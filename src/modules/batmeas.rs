//! Battery measurement module
//!
//! Keeps the selected battery profile in configuration; the actual voltage
//! sampling happens in the driver layer. The profile gives the charged and
//! discharged voltages the payload encoder scales readings against.

use crate::core::modules::ModuleId;
use crate::terminal::command::{CommandContext, CommandError, CommandNode, CommandPayload};
use crate::terminal::flags::CommandFlags;
use crate::terminal::params::{ParamKind, ParamValue};
use core::fmt::Write;

/// Module configuration byte
pub const BATMEAS_CFG_ADR_CFG: u16 = 0;
/// Selected battery index (byte)
pub const BATMEAS_CFG_ADR_BAT: u16 = 1;

/// batMeas configuration record length
pub const BATMEAS_CFG_LEN: usize = 2;

/// Factory defaults: disabled, severity ERROR, CR2032 selected
pub static BATMEAS_CFG_DEFAULTS: [u8; BATMEAS_CFG_LEN] = [0x02, 0x00];

/// Battery profile
pub struct Battery {
    /// Short name
    pub name: &'static str,
    /// Human-readable description
    pub descr: &'static str,
    /// Fully charged voltage [mV]
    pub charged_mv: u16,
    /// Discharged voltage [mV]
    pub discharged_mv: u16,
}

/// Supported battery profiles, indexed by the configuration byte
pub static BATTERIES: &[Battery] = &[
    Battery {
        name: "CR2032",
        descr: "lithium coin cell",
        charged_mv: 3000,
        discharged_mv: 2000,
    },
    Battery {
        name: "LS33600",
        descr: "lithium D cell",
        charged_mv: 3600,
        discharged_mv: 2400,
    },
];

/// `bat`: show or select the battery profile
fn cmd_bat(ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    if ctx.flags.set {
        let ParamValue::Byte(index) = ctx.io else {
            return Err(CommandError::InvalidParams);
        };
        if index as usize >= BATTERIES.len() {
            return Err(CommandError::InvalidParams);
        }

        if ctx.flags.ram {
            ctx.registry
                .ram_write(ModuleId::BatMeas, BATMEAS_CFG_ADR_BAT as usize, &[index])
                .map_err(|_| CommandError::MemoryIoFail)?;
        }
        if ctx.flags.eeprom {
            ctx.store
                .save(ModuleId::BatMeas, BATMEAS_CFG_ADR_BAT, &[index])
                .map_err(|_| CommandError::MemoryIoFail)?;
        }
        ctx.io = ParamValue::None;
        return Ok(());
    }

    // show: fall back to the first profile on an out-of-range record
    let mut index = [0u8];
    if ctx.flags.eeprom {
        ctx.store
            .load(ModuleId::BatMeas, BATMEAS_CFG_ADR_BAT, &mut index)
            .map_err(|_| CommandError::MemoryIoFail)?;
    }
    if ctx.flags.ram {
        ctx.registry
            .ram_read(ModuleId::BatMeas, BATMEAS_CFG_ADR_BAT as usize, &mut index)
            .map_err(|_| CommandError::MemoryIoFail)?;
    }
    let battery = BATTERIES.get(index[0] as usize).unwrap_or(&BATTERIES[0]);

    let mut s = heapless::String::new();
    write!(s, "{} ({})", battery.name, battery.descr).ok();
    ctx.io = ParamValue::Str(s);
    Ok(())
}

/// `list`: print the supported battery profiles
fn cmd_list(ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.println("Available batteries:");
    for (index, battery) in BATTERIES.iter().enumerate() {
        let mut line = heapless::String::<96>::new();
        write!(line, "{})\t{} ({})", index, battery.name, battery.descr).ok();
        ctx.println(&line);
    }
    Ok(())
}

/// batMeas command sub-table
pub const BATMEAS_COMMANDS: &[CommandNode] = &[
    CommandNode {
        label: "bat",
        help: "Selected battery",
        flags: CommandFlags {
            local: true,
            remote: true,
            set: true,
            show: true,
            eeprom: true,
            ram: true,
            ..CommandFlags::none()
        },
        input: ParamKind::Byte,
        output: ParamKind::Str,
        payload: CommandPayload::Callback(cmd_bat),
        module: ModuleId::BatMeas,
    },
    CommandNode {
        label: "list",
        help: "List supported batteries",
        flags: CommandFlags {
            local: true,
            env: true,
            ..CommandFlags::none()
        },
        input: ParamKind::None,
        output: ParamKind::None,
        payload: CommandPayload::Callback(cmd_list),
        module: ModuleId::BatMeas,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::modules::ModuleRegistry;
    use crate::core::store::EepromStore;
    use crate::modules::MODULES;
    use crate::platform::mock::MockEeprom;
    use crate::terminal::command::{execute, CommandOrigin};

    fn bat_node() -> &'static CommandNode {
        BATMEAS_COMMANDS.iter().find(|n| n.label == "bat").unwrap()
    }

    #[test]
    fn test_select_and_show_battery() {
        let mut registry = ModuleRegistry::new(MODULES);
        let mut store = EepromStore::new(MockEeprom::new(), MODULES);

        let set = CommandFlags {
            set: true,
            ram: true,
            local: true,
            ..CommandFlags::none()
        };
        let mut ctx = CommandContext::new(CommandOrigin::Local, set, &mut registry, &mut store, None);
        ctx.io = ParamValue::Byte(1);
        execute(bat_node(), &mut ctx).unwrap();

        let show = CommandFlags {
            show: true,
            ram: true,
            local: true,
            ..CommandFlags::none()
        };
        let mut ctx =
            CommandContext::new(CommandOrigin::Local, show, &mut registry, &mut store, None);
        execute(bat_node(), &mut ctx).unwrap();
        let ParamValue::Str(s) = ctx.io else {
            panic!("expected string output")
        };
        assert!(s.starts_with("LS33600"));
    }

    #[test]
    fn test_select_out_of_range_battery() {
        let mut registry = ModuleRegistry::new(MODULES);
        let mut store = EepromStore::new(MockEeprom::new(), MODULES);

        let set = CommandFlags {
            set: true,
            ram: true,
            local: true,
            ..CommandFlags::none()
        };
        let mut ctx = CommandContext::new(CommandOrigin::Local, set, &mut registry, &mut store, None);
        ctx.io = ParamValue::Byte(BATTERIES.len() as u8);
        assert_eq!(
            execute(bat_node(), &mut ctx),
            Err(CommandError::InvalidParams)
        );
    }
}
