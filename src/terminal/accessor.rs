//! Generic configuration-variable accessor
//!
//! Generic commands are pure data moves: the node's configuration-variable
//! descriptor names the bytes, the active flags pick the backend(s), and the
//! parameter container carries the value. No module code runs.
//!
//! When a node targets both backends the operation is applied to each in
//! turn (set: RAM then EEPROM, get: EEPROM then RAM, so a get surfaces the
//! live value) with no transaction: a failure on the second backend leaves
//! the first one's effect in place.

use super::command::{CommandContext, CommandError, CommandNode, ConfigVar};
use super::params::{ParamValue, PARAM_STR_MAX_LEN};
use crate::core::modules::ModuleError;
use crate::core::store::StoreError;

/// Widest record a generic variable may address
const RECORD_MAX: usize = PARAM_STR_MAX_LEN;

/// Run a generic command per the active flags
pub fn run_generic(
    node: &CommandNode,
    var: &ConfigVar,
    ctx: &mut CommandContext<'_>,
) -> Result<(), CommandError> {
    // zero-length descriptors are documentation-only placeholders
    if var.len == 0 {
        ctx.io = ParamValue::None;
        return Ok(());
    }
    if var.len as usize > RECORD_MAX {
        return Err(CommandError::Unspecified);
    }

    if ctx.flags.set {
        if ctx.flags.ram {
            ram_set(var, ctx)?;
        }
        if ctx.flags.eeprom {
            eeprom_set(var, ctx)?;
        }
        ctx.io = ParamValue::None;
        Ok(())
    } else if ctx.flags.show {
        if ctx.flags.eeprom {
            eeprom_get(node, var, ctx)?;
        }
        if ctx.flags.ram {
            ram_get(node, var, ctx)?;
        }
        Ok(())
    } else {
        Err(CommandError::Unspecified)
    }
}

fn eeprom_get(
    node: &CommandNode,
    var: &ConfigVar,
    ctx: &mut CommandContext<'_>,
) -> Result<(), CommandError> {
    let mut buf = [0u8; RECORD_MAX];
    let len = var.len as usize;
    ctx.store
        .load(var.module, var.offset, &mut buf[..len])
        .map_err(store_error)?;
    ctx.io = ParamValue::from_store_bytes(node.output, &buf[..len]);
    Ok(())
}

fn eeprom_set(var: &ConfigVar, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    let mut buf = [0u8; RECORD_MAX];
    let len = var.len as usize;
    ctx.io.to_store_bytes(&mut buf[..len]);
    ctx.store
        .save(var.module, var.offset, &buf[..len])
        .map_err(store_error)?;
    Ok(())
}

fn ram_get(
    node: &CommandNode,
    var: &ConfigVar,
    ctx: &mut CommandContext<'_>,
) -> Result<(), CommandError> {
    let mut buf = [0u8; RECORD_MAX];
    let len = var.len as usize;
    ctx.registry
        .ram_read(var.module, var.offset as usize, &mut buf[..len])
        .map_err(module_error)?;
    ctx.io = ParamValue::from_store_bytes(node.output, &buf[..len]);
    Ok(())
}

fn ram_set(var: &ConfigVar, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    let mut buf = [0u8; RECORD_MAX];
    let len = var.len as usize;
    ctx.io.to_store_bytes(&mut buf[..len]);
    ctx.registry
        .ram_write(var.module, var.offset as usize, &buf[..len])
        .map_err(module_error)?;
    Ok(())
}

fn store_error(err: StoreError) -> CommandError {
    match err {
        StoreError::ModuleNotFound => CommandError::ModuleNotFound,
        _ => CommandError::MemoryIoFail,
    }
}

fn module_error(err: ModuleError) -> CommandError {
    match err {
        ModuleError::NotFound => CommandError::ModuleNotFound,
        _ => CommandError::MemoryIoFail,
    }
}
