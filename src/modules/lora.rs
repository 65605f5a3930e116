//! LoRa communication module
//!
//! Configuration record layout and command table for the LoRa link. The MAC
//! state machine itself lives outside this crate; this module owns the
//! persisted session/activation material and the connection-mode switches.

use crate::core::modules::ModuleId;
use crate::terminal::command::{
    CommandContext, CommandError, CommandNode, CommandPayload, ConfigVar,
};
use crate::terminal::flags::CommandFlags;
use crate::terminal::params::{ParamKind, ParamValue};

/// Module configuration byte
pub const LORA_CFG_ADR_CFG: u16 = 0;
/// Connection configuration byte (see `CONN_*` bits)
pub const LORA_CFG_ADR_CONN: u16 = 1;
/// Device EUI (8 bytes)
pub const LORA_CFG_ADR_DEV_EUI: u16 = 2;
/// Application EUI (8 bytes)
pub const LORA_CFG_ADR_APP_EUI: u16 = 10;
/// Application key (16 bytes)
pub const LORA_CFG_ADR_APP_KEY: u16 = 18;
/// Network id (3 bytes)
pub const LORA_CFG_ADR_NET_ID: u16 = 34;
/// Device address (4 bytes)
pub const LORA_CFG_ADR_DEV_ADDR: u16 = 37;
/// Network session key (16 bytes)
pub const LORA_CFG_ADR_NWK_S_KEY: u16 = 41;
/// Application session key (16 bytes)
pub const LORA_CFG_ADR_APP_S_KEY: u16 = 57;

/// LoRa configuration record length
pub const LORA_CFG_LEN: usize = 73;

/// Connection byte: OTAA when set, ABP when clear
pub const CONN_OTAA: u8 = 0x01;
/// Connection byte: custom (user-defined) device EUI when set
pub const CONN_CUSTOM_DEV_EUI: u8 = 0x02;

/// Factory defaults: enabled, severity ERROR, OTAA, board device EUI
pub static LORA_CFG_DEFAULTS: [u8; LORA_CFG_LEN] = lora_defaults();

const fn lora_defaults() -> [u8; LORA_CFG_LEN] {
    let mut defaults = [0u8; LORA_CFG_LEN];
    defaults[LORA_CFG_ADR_CFG as usize] = 0x03; // enabled, severity ERROR
    defaults[LORA_CFG_ADR_CONN as usize] = CONN_OTAA;
    defaults
}

/// Read the connection byte from the backend(s) the active flags select
///
/// With both backends flagged the live value wins, mirroring the generic
/// accessor's get order.
fn read_conn(ctx: &mut CommandContext<'_>) -> Result<u8, CommandError> {
    let mut value = [0u8];
    let mut found = false;

    if ctx.flags.eeprom {
        ctx.store
            .load(ModuleId::Lora, LORA_CFG_ADR_CONN, &mut value)
            .map_err(|_| CommandError::MemoryIoFail)?;
        found = true;
    }
    if ctx.flags.ram {
        ctx.registry
            .ram_read(ModuleId::Lora, LORA_CFG_ADR_CONN as usize, &mut value)
            .map_err(|_| CommandError::MemoryIoFail)?;
        found = true;
    }

    if found {
        Ok(value[0])
    } else {
        Err(CommandError::Unspecified)
    }
}

/// Read-modify-write the connection byte in every flagged backend
fn update_conn(
    ctx: &mut CommandContext<'_>,
    update: fn(u8) -> u8,
) -> Result<(), CommandError> {
    if ctx.flags.ram {
        let mut value = [0u8];
        ctx.registry
            .ram_read(ModuleId::Lora, LORA_CFG_ADR_CONN as usize, &mut value)
            .map_err(|_| CommandError::MemoryIoFail)?;
        value[0] = update(value[0]);
        ctx.registry
            .ram_write(ModuleId::Lora, LORA_CFG_ADR_CONN as usize, &value)
            .map_err(|_| CommandError::MemoryIoFail)?;
    }
    if ctx.flags.eeprom {
        let mut value = [0u8];
        ctx.store
            .load(ModuleId::Lora, LORA_CFG_ADR_CONN, &mut value)
            .map_err(|_| CommandError::MemoryIoFail)?;
        value[0] = update(value[0]);
        ctx.store
            .save(ModuleId::Lora, LORA_CFG_ADR_CONN, &value)
            .map_err(|_| CommandError::MemoryIoFail)?;
    }
    Ok(())
}

/// `ABP`: show the ABP state, or select ABP activation
fn cmd_abp(ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    if ctx.flags.set {
        update_conn(ctx, |conn| conn & !CONN_OTAA)?;
        ctx.io = ParamValue::None;
    } else {
        let conn = read_conn(ctx)?;
        ctx.io = ParamValue::Bool(conn & CONN_OTAA == 0);
    }
    Ok(())
}

/// `OTAA`: show the OTAA state, or select OTAA activation
fn cmd_otaa(ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    if ctx.flags.set {
        update_conn(ctx, |conn| conn | CONN_OTAA)?;
        ctx.io = ParamValue::None;
    } else {
        let conn = read_conn(ctx)?;
        ctx.io = ParamValue::Bool(conn & CONN_OTAA != 0);
    }
    Ok(())
}

/// `devEUICustom`: use the user-defined device EUI
fn cmd_deveui_custom(ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    update_conn(ctx, |conn| conn | CONN_CUSTOM_DEV_EUI)
}

/// `devEUIBoard`: use the board-derived device EUI
fn cmd_deveui_board(ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    update_conn(ctx, |conn| conn & !CONN_CUSTOM_DEV_EUI)
}

/// `devEUIType`: show which device EUI source is selected
fn cmd_deveui_type(ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    let conn = read_conn(ctx)?;
    let label = if conn & CONN_CUSTOM_DEV_EUI != 0 {
        "custom"
    } else {
        "board"
    };
    let mut s = heapless::String::new();
    s.push_str(label).ok();
    ctx.io = ParamValue::Str(s);
    Ok(())
}

const fn toggle_flags() -> CommandFlags {
    CommandFlags {
        local: true,
        remote: true,
        set: true,
        show: true,
        eeprom: true,
        ram: true,
        ..CommandFlags::none()
    }
}

const fn set_only_flags() -> CommandFlags {
    CommandFlags {
        local: true,
        remote: true,
        set: true,
        eeprom: true,
        ram: true,
        ..CommandFlags::none()
    }
}

const fn show_only_flags() -> CommandFlags {
    CommandFlags {
        local: true,
        remote: true,
        show: true,
        eeprom: true,
        ram: true,
        ..CommandFlags::none()
    }
}

const fn generic_flags() -> CommandFlags {
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

const fn generic_bytes(label: &'static str, help: &'static str, offset: u16, len: u16) -> CommandNode {
    CommandNode {
        label,
        help,
        flags: generic_flags(),
        input: ParamKind::Bytes,
        output: ParamKind::Bytes,
        payload: CommandPayload::Config(ConfigVar {
            module: ModuleId::Lora,
            offset,
            len,
        }),
        module: ModuleId::Lora,
    }
}

/// LoRa command sub-table (shared by the set/show/setr/showr roots)
pub const LORA_COMMANDS: &[CommandNode] = &[
    CommandNode {
        label: "ABP",
        help: "Activation by personalization",
        flags: toggle_flags(),
        input: ParamKind::None,
        output: ParamKind::Bool,
        payload: CommandPayload::Callback(cmd_abp),
        module: ModuleId::Lora,
    },
    CommandNode {
        label: "OTAA",
        help: "Over-the-air activation",
        flags: toggle_flags(),
        input: ParamKind::None,
        output: ParamKind::Bool,
        payload: CommandPayload::Callback(cmd_otaa),
        module: ModuleId::Lora,
    },
    generic_bytes("appEUI", "Application EUI", LORA_CFG_ADR_APP_EUI, 8),
    generic_bytes("appKey", "Application key", LORA_CFG_ADR_APP_KEY, 16),
    generic_bytes("appSKey", "Application session key", LORA_CFG_ADR_APP_S_KEY, 16),
    generic_bytes("devAddr", "Device address", LORA_CFG_ADR_DEV_ADDR, 4),
    generic_bytes("devEUI", "Device EUI", LORA_CFG_ADR_DEV_EUI, 8),
    CommandNode {
        label: "devEUIBoard",
        help: "Use board (deviceID-based) device EUI",
        flags: set_only_flags(),
        input: ParamKind::None,
        output: ParamKind::None,
        payload: CommandPayload::Callback(cmd_deveui_board),
        module: ModuleId::Lora,
    },
    CommandNode {
        label: "devEUICustom",
        help: "Use custom (user-defined) device EUI",
        flags: set_only_flags(),
        input: ParamKind::None,
        output: ParamKind::None,
        payload: CommandPayload::Callback(cmd_deveui_custom),
        module: ModuleId::Lora,
    },
    CommandNode {
        label: "devEUIType",
        help: "Device EUI source: custom or board",
        flags: show_only_flags(),
        input: ParamKind::None,
        output: ParamKind::Str,
        payload: CommandPayload::Callback(cmd_deveui_type),
        module: ModuleId::Lora,
    },
    generic_bytes("netID", "Network id", LORA_CFG_ADR_NET_ID, 3),
    generic_bytes("nwkSKey", "Network session key", LORA_CFG_ADR_NWK_S_KEY, 16),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::modules::ModuleRegistry;
    use crate::core::store::{EepromStore, PersistentStore};
    use crate::modules::MODULES;
    use crate::platform::mock::MockEeprom;
    use crate::terminal::command::{execute, CommandOrigin};

    fn run_with_flags(
        node: &CommandNode,
        active: CommandFlags,
        registry: &mut ModuleRegistry,
        store: &mut EepromStore<MockEeprom>,
    ) -> Result<ParamValue, CommandError> {
        let mut ctx = CommandContext::new(CommandOrigin::Local, active, registry, store, None);
        execute(node, &mut ctx)?;
        Ok(ctx.io)
    }

    fn find(label: &str) -> &'static CommandNode {
        LORA_COMMANDS.iter().find(|n| n.label == label).unwrap()
    }

    #[test]
    fn test_defaults() {
        assert_eq!(LORA_CFG_DEFAULTS.len(), LORA_CFG_LEN);
        assert_eq!(LORA_CFG_DEFAULTS[LORA_CFG_ADR_CONN as usize], CONN_OTAA);
    }

    #[test]
    fn test_abp_otaa_toggle_ram() {
        let mut registry = ModuleRegistry::new(MODULES);
        let mut store = EepromStore::new(MockEeprom::new(), MODULES);

        let show = CommandFlags {
            show: true,
            ram: true,
            local: true,
            ..CommandFlags::none()
        };
        let set = CommandFlags {
            set: true,
            ram: true,
            local: true,
            ..CommandFlags::none()
        };

        // defaults select OTAA
        let out = run_with_flags(find("OTAA"), show, &mut registry, &mut store).unwrap();
        assert_eq!(out, ParamValue::Bool(true));
        let out = run_with_flags(find("ABP"), show, &mut registry, &mut store).unwrap();
        assert_eq!(out, ParamValue::Bool(false));

        // switch to ABP in the running configuration
        run_with_flags(find("ABP"), set, &mut registry, &mut store).unwrap();
        let out = run_with_flags(find("ABP"), show, &mut registry, &mut store).unwrap();
        assert_eq!(out, ParamValue::Bool(true));
    }

    #[test]
    fn test_deveui_type_follows_selection() {
        let mut registry = ModuleRegistry::new(MODULES);
        let mut store = EepromStore::new(MockEeprom::new(), MODULES);

        // persist the defaults first so the EEPROM copy is coherent
        store
            .save(ModuleId::Lora, 0, &LORA_CFG_DEFAULTS)
            .unwrap();

        let show = CommandFlags {
            show: true,
            eeprom: true,
            local: true,
            ..CommandFlags::none()
        };
        let set = CommandFlags {
            set: true,
            eeprom: true,
            local: true,
            ..CommandFlags::none()
        };

        let out = run_with_flags(find("devEUIType"), show, &mut registry, &mut store).unwrap();
        assert_eq!(out, ParamValue::Str(heapless::String::try_from("board").unwrap()));

        run_with_flags(find("devEUICustom"), set, &mut registry, &mut store).unwrap();
        let out = run_with_flags(find("devEUIType"), show, &mut registry, &mut store).unwrap();
        assert_eq!(out, ParamValue::Str(heapless::String::try_from("custom").unwrap()));
    }

    #[test]
    fn test_set_only_nodes_reject_show_context() {
        // narrowing from a show root turns the set flag off; the node then
        // fails subtree validity and resolution skips it entirely
        let show_root = CommandFlags {
            show: true,
            eeprom: true,
            local: true,
            remote: true,
            ..CommandFlags::none()
        };
        let narrowed = show_root.narrow(&find("devEUICustom").flags);
        assert!(!narrowed.subtree_valid());
    }
}
