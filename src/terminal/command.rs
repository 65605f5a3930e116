//! Command tree model and execution
//!
//! The command set is a static tree of [`CommandNode`] records. A node is
//! exactly one of: a group (sub-list of nodes), a custom callback, or a
//! generic command backed by a configuration-variable descriptor. The
//! payload enum makes the three shapes mutually exclusive at compile time.

use super::accessor;
use super::flags::CommandFlags;
use super::params::{ParamKind, ParamValue};
use crate::core::modules::{ModuleId, ModuleRegistry};
use crate::core::store::PersistentStore;
use crate::platform::traits::ConsoleInterface;

/// Where a command request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOrigin {
    /// Serial console
    Local,
    /// Wireless downlink
    Remote,
}

/// Command failure, surfaced as a one-byte status on the remote wire and as
/// text on the console
///
/// All failures are recovered locally; none escalates to a fault or reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Supplied parameters missing or malformed
    InvalidParams,
    /// Persisted-store read/write failed
    MemoryIoFail,
    /// No matching node at some tree depth
    CommandNotFound,
    /// Module index resolved to no module
    ModuleNotFound,
    /// Command is local-only, requested remotely
    ContextLocalOnly,
    /// Command is remote-only, requested locally
    ContextRemoteOnly,
    /// Table-authoring bug (invalid node definition)
    Unspecified,
    /// Group node reached without a further command
    NotSupported,
    /// Remote packet declared an incompatible protocol version
    CoreApiMismatch,
}

/// Wire status code for a successful command
pub const STATUS_OK: u8 = 0;

impl CommandError {
    /// One-byte wire status code
    pub fn status_code(self) -> u8 {
        match self {
            CommandError::InvalidParams => 1,
            CommandError::MemoryIoFail => 2,
            CommandError::CommandNotFound => 3,
            CommandError::ModuleNotFound => 4,
            CommandError::ContextLocalOnly => 5,
            CommandError::ContextRemoteOnly => 6,
            CommandError::Unspecified => 7,
            CommandError::NotSupported => 8,
            CommandError::CoreApiMismatch => 9,
        }
    }

    /// Console message
    pub fn describe(self) -> &'static str {
        match self {
            CommandError::InvalidParams => "Invalid parameter(s)!",
            CommandError::MemoryIoFail => "Memory IO error!",
            CommandError::CommandNotFound => "Command not found!",
            CommandError::ModuleNotFound => "Module not found!",
            CommandError::ContextLocalOnly => "Command is available in local terminal only!",
            CommandError::ContextRemoteOnly => "Command is available in remote terminal only!",
            CommandError::Unspecified => "Unspecified error!",
            CommandError::NotSupported => "Not supported!",
            CommandError::CoreApiMismatch => "Core API version mismatch!",
        }
    }
}

/// Configuration-variable descriptor for generic commands
///
/// Addresses `len` bytes at `offset` within the owning module's
/// configuration record, in whichever backend the active flags select.
/// `len == 0` marks a documentation-only placeholder; access is a no-op.
#[derive(Debug, Clone, Copy)]
pub struct ConfigVar {
    /// Owning module
    pub module: ModuleId,
    /// Byte offset within the module's configuration record
    pub offset: u16,
    /// Variable length in bytes
    pub len: u16,
}

/// Custom command implementation
pub type CommandCallback = fn(&mut CommandContext<'_>) -> Result<(), CommandError>;

/// Node payload; the flags and the payload variant must agree
pub enum CommandPayload {
    /// Custom callback leaf
    Callback(CommandCallback),
    /// Group with a sub-command list
    Group(&'static [CommandNode]),
    /// Generic leaf driven by a configuration variable
    Config(ConfigVar),
}

/// One entry of the static command table
pub struct CommandNode {
    /// Command word as typed on the console
    pub label: &'static str,
    /// Human-readable description/help
    pub help: &'static str,
    /// Capability flags
    pub flags: CommandFlags,
    /// Input parameter kind
    pub input: ParamKind,
    /// Output parameter kind
    pub output: ParamKind,
    /// Group / callback / generic payload
    pub payload: CommandPayload,
    /// Owning module (addressed by the remote protocol at group level)
    pub module: ModuleId,
}

impl CommandNode {
    /// True if this node is a group
    pub fn is_group(&self) -> bool {
        matches!(self.payload, CommandPayload::Group(_))
    }

    /// Sub-command list of a group node
    pub fn sub_commands(&self) -> Option<&'static [CommandNode]> {
        match self.payload {
            CommandPayload::Group(list) => Some(list),
            _ => None,
        }
    }
}

/// Mutable state a command executes against
///
/// The parameter container, the narrowed flags and the collaborator handles
/// travel together through one explicit context instead of process-wide
/// state.
pub struct CommandContext<'a> {
    /// Parameter container: input on entry, output on success
    pub io: ParamValue,
    /// Requesting origin
    pub origin: CommandOrigin,
    /// Active (narrowed) flags at the resolved node
    pub flags: CommandFlags,
    /// Module registry (live configuration records)
    pub registry: &'a mut ModuleRegistry,
    /// Persisted configuration store
    pub store: &'a mut dyn PersistentStore,
    /// Console, present for local requests only
    pub console: Option<&'a mut dyn ConsoleInterface>,
    /// Set by `reload`; the integration layer performs the actual reset
    pub reset_requested: bool,
}

impl<'a> CommandContext<'a> {
    /// Create a context for one command invocation
    pub fn new(
        origin: CommandOrigin,
        flags: CommandFlags,
        registry: &'a mut ModuleRegistry,
        store: &'a mut dyn PersistentStore,
        console: Option<&'a mut dyn ConsoleInterface>,
    ) -> Self {
        Self {
            io: ParamValue::None,
            origin,
            flags,
            registry,
            store,
            console,
            reset_requested: false,
        }
    }

    /// Write a line to the console if one is attached
    pub fn println(&mut self, line: &str) {
        if let Some(console) = self.console.as_deref_mut() {
            console.write_line(line);
        }
    }
}

/// Run a resolved command
///
/// The context's flags must already be the AND-narrowed path flags and must
/// have passed [`CommandFlags::check_context`] for the requesting origin.
pub fn execute(node: &CommandNode, ctx: &mut CommandContext<'_>) -> Result<(), CommandError> {
    match &node.payload {
        CommandPayload::Callback(callback) => callback(ctx),
        CommandPayload::Config(var) => accessor::run_generic(node, var, ctx),
        CommandPayload::Group(_) => Err(CommandError::NotSupported),
    }
}

/// True if the active flags call for input parameters
///
/// Show commands read a variable and take no input; everything else honors
/// the node's declared input kind.
pub fn wants_input(node: &CommandNode, flags: &CommandFlags) -> bool {
    if node.input == ParamKind::None {
        return false;
    }
    !(flags.show && !flags.set)
}
