//! Built-in command tree
//!
//! The root table and the set/show sub-tree shared by all four storage
//! roots (`show`/`showr` against EEPROM/RAM reads, `set`/`setr` against
//! EEPROM/RAM writes), plus the core environment callbacks.
//!
//! Table order is part of the remote wire protocol (commands are addressed
//! by position, modules by id); append, never reorder.

use super::command::{
    CommandContext, CommandError, CommandNode, CommandPayload, ConfigVar,
};
use super::flags::CommandFlags;
use super::params::{ParamKind, ParamValue};
use crate::core::config::{
    CORE_CFG_ADR_BASE_PERIOD, CORE_CFG_ADR_DRIVER_SEVERITY, CORE_CFG_ADR_SEVERITY,
    CORE_CFG_ADR_SKIP_SLEEP, CORE_CFG_ADR_START_DELAY,
};
use crate::core::modules::{ModuleCfgByte, ModuleId};
use crate::modules::batmeas::BATMEAS_COMMANDS;
use crate::modules::hdc1080::HDC1080_COMMANDS;
use crate::modules::lora::LORA_COMMANDS;
use crate::platform::traits::ConsoleInterface;
use core::fmt::Write;

/// Device name shown by the console
pub const DEVICE_NAME: &str = "sensecube";

/// Print a command list at one tree depth, filtered by the active context
///
/// For a non-group parent this prints the node description instead.
pub fn print_cmd_list(
    console: &mut dyn ConsoleInterface,
    parent: Option<&CommandNode>,
    list: &[CommandNode],
    context: &CommandFlags,
) {
    if let Some(node) = parent {
        if !node.is_group() {
            let mut line = heapless::String::<160>::new();
            write!(line, "Description: {}", node.help).ok();
            console.write_line(&line);
            return;
        }
        let mut line = heapless::String::<160>::new();
        write!(line, "List of sub-commands for command {}:", node.label).ok();
        console.write_line(&line);
    } else {
        console.write_line("List of commands:");
    }

    for node in list {
        let narrowed = context.narrow(&node.flags);
        if !narrowed.subtree_valid() {
            continue;
        }
        let mut line = heapless::String::<160>::new();
        write!(line, "\t{}\t{}", node.label, node.help).ok();
        console.write_line(&line);
    }
}

/// Context used when listing commands for a human
pub fn help_context() -> CommandFlags {
    CommandFlags {
        group: true,
        local: true,
        env: true,
        eeprom: true,
        ram: true,
        ..CommandFlags::none()
    }
}

fn cmd_about(ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.println("");
    ctx.println("About sensecube");
    ctx.println("---------------");
    ctx.println("Modular sensor-node platform for low-power wireless telemetry.");
    ctx.println("Provided under the MIT License - see LICENSE.txt.");
    Ok(())
}

fn cmd_help(ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    let context = help_context();
    if let Some(console) = ctx.console.as_deref_mut() {
        console.write_line("");
        let mut line = heapless::String::<96>::new();
        write!(line, "{} Command-line Interface HELP", DEVICE_NAME).ok();
        console.write_line(&line);
        console.write_line("-----------------------------------");
        console.write_line("");
        print_cmd_list(console, None, ROOT_COMMANDS, &context);
    }
    Ok(())
}

fn cmd_list(ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.println("");
    ctx.println("Available modules:");

    for index in 0..ctx.registry.count() {
        let descr = &ctx.registry.descriptors()[index];
        if descr.id == ModuleId::Core {
            continue;
        }

        let mut byte = [0u8];
        if ctx.store.load(descr.id, 0, &mut byte).is_err() {
            ctx.println("Error while reading module configuration!");
            continue;
        }
        let persisted = ModuleCfgByte::from_byte(byte[0]);
        let running = ctx.registry.cfg_byte(index);

        let mut line = heapless::String::<160>::new();
        if running.severity != persisted.severity {
            write!(
                line,
                "{} -> {}\t",
                running.severity.letter(),
                persisted.severity.letter()
            )
            .ok();
        } else {
            write!(line, "  {}\t", persisted.severity.letter()).ok();
        }
        if running.enable != persisted.enable {
            write!(line, "{} -> ", if running.enable { 'E' } else { 'D' }).ok();
        }
        write!(
            line,
            "{}\t{}\t{}",
            if persisted.enable { 'E' } else { 'D' },
            descr.name,
            descr.descr
        )
        .ok();
        ctx.println(&line);
    }

    ctx.println("");
    ctx.println("Module state: E = enabled; D = disabled (applied on reload)");
    ctx.println("Module severity: N = NONE, R = ERROR; I = INFO; D = DEBUG");
    Ok(())
}

/// Persist a module's enable flag and severity; takes effect on reload
fn enable_disable(ctx: &mut CommandContext<'_>, enable: bool) -> Result<(), CommandError> {
    let ParamValue::ModuleId { id, severity } = ctx.io else {
        return Err(CommandError::InvalidParams);
    };

    let module = ModuleId::from_u16(id);
    if ctx.registry.index_of(module).is_none() {
        return Err(CommandError::InvalidParams);
    }

    let cfg = ModuleCfgByte { enable, severity };
    ctx.store
        .save(module, 0, &[cfg.to_byte()])
        .map_err(|_| CommandError::MemoryIoFail)?;

    ctx.io = ParamValue::None;
    Ok(())
}

fn cmd_enable(ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    enable_disable(ctx, true)
}

fn cmd_disable(ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    enable_disable(ctx, false)
}

fn cmd_reload(ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    ctx.println("Performing system reset and reloading configuration ...");
    ctx.reset_requested = true;
    Ok(())
}

const fn env_local() -> CommandFlags {
    CommandFlags {
        local: true,
        env: true,
        ..CommandFlags::none()
    }
}

const fn env_both() -> CommandFlags {
    CommandFlags {
        local: true,
        remote: true,
        env: true,
        ..CommandFlags::none()
    }
}

const fn storage_root(set: bool, show: bool, eeprom: bool, ram: bool) -> CommandFlags {
    CommandFlags {
        group: true,
        local: true,
        remote: true,
        env: true,
        generic: true,
        set,
        show,
        eeprom,
        ram,
        ..CommandFlags::none()
    }
}

const fn module_group() -> CommandFlags {
    CommandFlags {
        group: true,
        local: true,
        remote: true,
        env: true,
        generic: true,
        set: true,
        show: true,
        eeprom: true,
        ram: true,
        ..CommandFlags::none()
    }
}

const fn generic_leaf() -> CommandFlags {
    CommandFlags {
        local: true,
        remote: true,
        set: true,
        show: true,
        eeprom: true,
        ram: true,
        generic: true,
        ..CommandFlags::none()
    }
}

/// Core configuration commands
const CORE_COMMANDS: &[CommandNode] = &[
    CommandNode {
        label: "basePeriod",
        help: "Period of the measurement cycle [ms]",
        flags: generic_leaf(),
        input: ParamKind::UInt32,
        output: ParamKind::UInt32,
        payload: CommandPayload::Config(ConfigVar {
            module: ModuleId::Core,
            offset: CORE_CFG_ADR_BASE_PERIOD,
            len: 4,
        }),
        module: ModuleId::Core,
    },
    CommandNode {
        label: "startDelay",
        help: "First periodic action is delayed after power-up [ms]",
        flags: generic_leaf(),
        input: ParamKind::UInt32,
        output: ParamKind::UInt32,
        payload: CommandPayload::Config(ConfigVar {
            module: ModuleId::Core,
            offset: CORE_CFG_ADR_START_DELAY,
            len: 4,
        }),
        module: ModuleId::Core,
    },
    CommandNode {
        label: "severity",
        help: "Core messages severity: 0 = NONE, 1 = ERROR; 2 = INFO; 3 = DEBUG",
        flags: generic_leaf(),
        input: ParamKind::Byte,
        output: ParamKind::Byte,
        payload: CommandPayload::Config(ConfigVar {
            module: ModuleId::Core,
            offset: CORE_CFG_ADR_SEVERITY,
            len: 1,
        }),
        module: ModuleId::Core,
    },
    CommandNode {
        label: "skipSleepPeriod",
        help: "Skip the sleep period and measure back-to-back (debug)",
        flags: generic_leaf(),
        input: ParamKind::Bool,
        output: ParamKind::Bool,
        payload: CommandPayload::Config(ConfigVar {
            module: ModuleId::Core,
            offset: CORE_CFG_ADR_SKIP_SLEEP,
            len: 1,
        }),
        module: ModuleId::Core,
    },
];

/// Driver configuration commands (stored in the core record)
const DRIVER_COMMANDS: &[CommandNode] = &[CommandNode {
    label: "severity",
    help: "Driver(s) messages severity: 0 = NONE, 1 = ERROR; 2 = INFO; 3 = DEBUG",
    flags: generic_leaf(),
    input: ParamKind::Byte,
    output: ParamKind::Byte,
    payload: CommandPayload::Config(ConfigVar {
        module: ModuleId::Core,
        offset: CORE_CFG_ADR_DRIVER_SEVERITY,
        len: 1,
    }),
    module: ModuleId::Core,
}];

/// Set/show command groups, one per configurable module
const SET_SHOW_COMMANDS: &[CommandNode] = &[
    CommandNode {
        label: "core",
        help: "Core parameters",
        flags: module_group(),
        input: ParamKind::None,
        output: ParamKind::None,
        payload: CommandPayload::Group(CORE_COMMANDS),
        module: ModuleId::Core,
    },
    CommandNode {
        label: "driver",
        help: "Driver(s) parameters",
        flags: module_group(),
        input: ParamKind::None,
        output: ParamKind::None,
        payload: CommandPayload::Group(DRIVER_COMMANDS),
        module: ModuleId::Drivers,
    },
    CommandNode {
        label: "batMeas",
        help: "Battery measurement parameters",
        flags: module_group(),
        input: ParamKind::None,
        output: ParamKind::None,
        payload: CommandPayload::Group(BATMEAS_COMMANDS),
        module: ModuleId::BatMeas,
    },
    CommandNode {
        label: "HDC1080",
        help: "HDC1080 parameters",
        flags: module_group(),
        input: ParamKind::None,
        output: ParamKind::None,
        payload: CommandPayload::Group(HDC1080_COMMANDS),
        module: ModuleId::Hdc1080,
    },
    CommandNode {
        label: "LoRa",
        help: "LoRa parameters",
        flags: module_group(),
        input: ParamKind::None,
        output: ParamKind::None,
        payload: CommandPayload::Group(LORA_COMMANDS),
        module: ModuleId::Lora,
    },
];

/// Root terminal commands
pub static ROOT_COMMANDS: &[CommandNode] = &[
    CommandNode {
        label: "about",
        help: "Print ABOUT information: Copyright, License, ...",
        flags: env_local(),
        input: ParamKind::None,
        output: ParamKind::None,
        payload: CommandPayload::Callback(cmd_about),
        module: ModuleId::Core,
    },
    CommandNode {
        label: "help",
        help: "Print HELP",
        flags: env_local(),
        input: ParamKind::None,
        output: ParamKind::None,
        payload: CommandPayload::Callback(cmd_help),
        module: ModuleId::Core,
    },
    CommandNode {
        label: "disable",
        help: "Disable a module",
        flags: env_both(),
        input: ParamKind::ModuleId,
        output: ParamKind::None,
        payload: CommandPayload::Callback(cmd_disable),
        module: ModuleId::Core,
    },
    CommandNode {
        label: "enable",
        help: "Enable a module",
        flags: env_both(),
        input: ParamKind::ModuleId,
        output: ParamKind::None,
        payload: CommandPayload::Callback(cmd_enable),
        module: ModuleId::Core,
    },
    CommandNode {
        label: "list",
        help: "List available modules",
        flags: env_local(),
        input: ParamKind::None,
        output: ParamKind::None,
        payload: CommandPayload::Callback(cmd_list),
        module: ModuleId::Core,
    },
    CommandNode {
        label: "reload",
        help: "Reload the node",
        flags: env_both(),
        input: ParamKind::None,
        output: ParamKind::None,
        payload: CommandPayload::Callback(cmd_reload),
        module: ModuleId::Core,
    },
    CommandNode {
        label: "show",
        help: "Show persisted parameters",
        flags: storage_root(false, true, true, false),
        input: ParamKind::None,
        output: ParamKind::None,
        payload: CommandPayload::Group(SET_SHOW_COMMANDS),
        module: ModuleId::Core,
    },
    CommandNode {
        label: "showr",
        help: "Show running parameters",
        flags: storage_root(false, true, false, true),
        input: ParamKind::None,
        output: ParamKind::None,
        payload: CommandPayload::Group(SET_SHOW_COMMANDS),
        module: ModuleId::Core,
    },
    CommandNode {
        label: "set",
        help: "Set persisted parameters",
        flags: storage_root(true, false, true, false),
        input: ParamKind::None,
        output: ParamKind::None,
        payload: CommandPayload::Group(SET_SHOW_COMMANDS),
        module: ModuleId::Core,
    },
    CommandNode {
        label: "setr",
        help: "Set running parameters",
        flags: storage_root(true, false, false, true),
        input: ParamKind::None,
        output: ParamKind::None,
        payload: CommandPayload::Group(SET_SHOW_COMMANDS),
        module: ModuleId::Core,
    },
];

/// Positional root index of the `show` group (remote protocol)
pub const ROOT_IDX_SHOW: u8 = 6;
/// Positional root index of the `showr` group (remote protocol)
pub const ROOT_IDX_SHOWR: u8 = 7;
/// Positional root index of the `set` group (remote protocol)
pub const ROOT_IDX_SET: u8 = 8;
/// Positional root index of the `setr` group (remote protocol)
pub const ROOT_IDX_SETR: u8 = 9;
