//! Remote terminal
//!
//! Stateless dispatcher for the binary downlink protocol. A packet is a
//! two-byte header followed by either one command body (opcode 0) or a
//! sequence of length-prefixed command bodies (opcode 1, batch).
//!
//! Commands are addressed by table position, except at the module depth
//! where the wire carries the module *id* (one byte, or two little-endian
//! bytes when the header's width flag is set). The response echoes the
//! request's first header byte so the far side can correlate answers by
//! sequence number, then carries one `{length, status, payload}` entry per
//! command. A batch is best-effort: a failed entry produces an error entry
//! and processing continues.

use super::cmdset::ROOT_COMMANDS;
use super::command::{
    execute, wants_input, CommandContext, CommandError, CommandNode, CommandOrigin, STATUS_OK,
};
use super::defer::{DeferredSlot, REMOTE_BUF_SIZE};
use super::flags::CommandFlags;
use super::params::ParamValue;
use crate::core::modules::ModuleRegistry;
use crate::core::store::PersistentStore;
use heapless::Vec;

/// Protocol version accepted by this build
pub const CORE_API_VERSION: u8 = 1;

/// Single-command packet
pub const OPCODE_SINGLE: u8 = 0;
/// Batched multi-command packet
pub const OPCODE_BATCH: u8 = 1;

/// Largest output payload of one command entry
const ENTRY_PAYLOAD_MAX: usize = 48;

/// First packet header byte: opcode (2 bits), module-id width flag (1 bit),
/// reserved (1 bit), sequence number (4 bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Packet opcode
    pub opcode: u8,
    /// Module ids are carried as two little-endian bytes
    pub wide_module_id: bool,
    /// Sequence number for response correlation
    pub seq: u8,
}

impl PacketHeader {
    /// Parse the first header byte
    pub fn parse(byte: u8) -> Self {
        Self {
            opcode: byte & 0x03,
            wide_module_id: byte & 0x04 != 0,
            seq: byte >> 4,
        }
    }

    /// Serialize back to the wire byte
    pub fn to_byte(self) -> u8 {
        (self.opcode & 0x03) | ((self.wide_module_id as u8) << 2) | (self.seq << 4)
    }
}

/// Result of processing one packet
pub struct PacketResponse {
    /// Encoded response, empty if the packet was dropped
    pub bytes: Vec<u8, REMOTE_BUF_SIZE>,
    /// An executed command requested a system reset
    pub reset_requested: bool,
}

/// Process one complete packet and build its response
pub fn process_packet(
    packet: &[u8],
    registry: &mut ModuleRegistry,
    store: &mut dyn PersistentStore,
) -> PacketResponse {
    let mut bytes: Vec<u8, REMOTE_BUF_SIZE> = Vec::new();
    let mut reset_requested = false;

    // no room for a header: nothing to echo, drop silently
    if packet.len() < 2 {
        return PacketResponse {
            bytes,
            reset_requested,
        };
    }

    let header = PacketHeader::parse(packet[0]);
    bytes.push(packet[0]).ok();

    if packet[1] != CORE_API_VERSION {
        emit_entry(&mut bytes, &Err(CommandError::CoreApiMismatch));
        return PacketResponse {
            bytes,
            reset_requested,
        };
    }

    let body = &packet[2..];
    match header.opcode {
        OPCODE_SINGLE => {
            let (result, reset) = process_command(body, header.wide_module_id, registry, store);
            reset_requested |= reset;
            emit_entry(&mut bytes, &result);
        }
        OPCODE_BATCH => {
            let mut cursor = 0usize;
            while cursor < body.len() {
                let entry_len = body[cursor] as usize;
                cursor += 1;
                let end = (cursor + entry_len).min(body.len());
                let entry = &body[cursor..end];

                let (result, reset) = process_command(entry, header.wide_module_id, registry, store);
                reset_requested |= reset;
                if !emit_entry(&mut bytes, &result) {
                    crate::log_warn!("response buffer full, remaining batch entries dropped");
                    break;
                }
                cursor = end;
            }
        }
        _ => {
            emit_entry(&mut bytes, &Err(CommandError::NotSupported));
        }
    }

    PacketResponse {
        bytes,
        reset_requested,
    }
}

/// Process the deferred packet, if any, and answer through its channel
///
/// Returns true if an executed command requested a system reset.
pub fn poll(
    slot: &DeferredSlot,
    registry: &mut ModuleRegistry,
    store: &mut dyn PersistentStore,
) -> bool {
    let mut buf = [0u8; REMOTE_BUF_SIZE];
    let Some((len, respond)) = slot.take(&mut buf) else {
        return false;
    };

    let response = process_packet(&buf[..len], registry, store);
    if !response.bytes.is_empty() {
        respond(&response.bytes);
    }
    response.reset_requested
}

/// Append one `{length, status, payload}` response entry
///
/// Returns false (entry not written) if it does not fit the buffer.
fn emit_entry(
    out: &mut Vec<u8, REMOTE_BUF_SIZE>,
    result: &Result<Vec<u8, ENTRY_PAYLOAD_MAX>, CommandError>,
) -> bool {
    match result {
        Ok(payload) => {
            if out.len() + 2 + payload.len() > out.capacity() {
                return false;
            }
            out.push(1 + payload.len() as u8).ok();
            out.push(STATUS_OK).ok();
            out.extend_from_slice(payload).ok();
        }
        Err(err) => {
            if out.len() + 2 > out.capacity() {
                return false;
            }
            out.push(1).ok();
            out.push(err.status_code()).ok();
        }
    }
    true
}

/// Resolve and execute one command body
///
/// Index-lexical walk: the first byte is a position in the root table; for
/// generic set/show roots the next one or two bytes select the module by
/// id, then one positional byte per depth until a non-group node. Context
/// validity is re-checked at the terminal node before execution.
fn process_command(
    body: &[u8],
    wide_module_id: bool,
    registry: &mut ModuleRegistry,
    store: &mut dyn PersistentStore,
) -> (Result<Vec<u8, ENTRY_PAYLOAD_MAX>, CommandError>, bool) {
    if body.is_empty() {
        return (Err(CommandError::CommandNotFound), false);
    }

    let Some(node) = ROOT_COMMANDS.get(body[0] as usize) else {
        return (Err(CommandError::CommandNotFound), false);
    };
    let active = CommandFlags::all().narrow(&node.flags);

    let Some(module_lists) = node.sub_commands() else {
        // plain root command (enable, reload, ...)
        return try_execute(node, active, &body[1..], registry, store);
    };

    if !(node.flags.generic && (node.flags.set || node.flags.show)) {
        return (Err(CommandError::NotSupported), false);
    }

    // module depth, addressed by id
    let (module_value, id_len) = if wide_module_id {
        if body.len() < 3 {
            return (Err(CommandError::CommandNotFound), false);
        }
        (u16::from_le_bytes([body[1], body[2]]), 2)
    } else {
        if body.len() < 2 {
            return (Err(CommandError::CommandNotFound), false);
        }
        (body[1] as u16, 1)
    };

    let mut module_match = None;
    for candidate in module_lists {
        if candidate.module.as_u16() != module_value {
            continue;
        }
        let narrowed = active.narrow(&candidate.flags);
        if !narrowed.subtree_valid() {
            // context-disjoint twin (e.g. an EEPROM-only entry under a RAM
            // root); keep scanning for a viable one
            continue;
        }
        module_match = Some((candidate, narrowed));
        break;
    }
    let Some((module_node, mut active)) = module_match else {
        return (Err(CommandError::ModuleNotFound), false);
    };
    let Some(mut list) = module_node.sub_commands() else {
        return (Err(CommandError::CommandNotFound), false);
    };

    // positional depths below the module
    let mut cursor = 1 + id_len;
    let terminal = loop {
        let Some(&index) = body.get(cursor) else {
            return (Err(CommandError::CommandNotFound), false);
        };
        cursor += 1;
        let Some(next) = list.get(index as usize) else {
            return (Err(CommandError::CommandNotFound), false);
        };
        active = active.narrow(&next.flags);
        match next.sub_commands() {
            Some(deeper) => list = deeper,
            None => break next,
        }
    };

    try_execute(terminal, active, &body[cursor..], registry, store)
}

fn try_execute(
    node: &CommandNode,
    active: CommandFlags,
    params: &[u8],
    registry: &mut ModuleRegistry,
    store: &mut dyn PersistentStore,
) -> (Result<Vec<u8, ENTRY_PAYLOAD_MAX>, CommandError>, bool) {
    if let Err(err) = active.check_context(CommandOrigin::Remote) {
        return (Err(err), false);
    }

    let input = if wants_input(node, &active) {
        if params.len() < node.input.min_static_len() {
            return (Err(CommandError::InvalidParams), false);
        }
        match ParamValue::decode(node.input, params) {
            Ok(value) => value,
            Err(err) => return (Err(err), false),
        }
    } else {
        ParamValue::None
    };

    let mut ctx = CommandContext::new(CommandOrigin::Remote, active, registry, store, None);
    ctx.io = input;
    let result = execute(node, &mut ctx);
    let reset = ctx.reset_requested;

    match result {
        Err(err) => (Err(err), reset),
        Ok(()) => {
            let mut scratch = [0u8; crate::terminal::params::PARAM_STR_MAX_LEN];
            let written = ctx.io.encode(&mut scratch);
            let mut payload = Vec::new();
            payload
                .extend_from_slice(&scratch[..written.min(ENTRY_PAYLOAD_MAX)])
                .ok();
            (Ok(payload), reset)
        }
    }
}
