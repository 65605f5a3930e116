//! Command resolution & execution engine
//!
//! One static command tree drives both command surfaces. The local terminal
//! resolves labels typed on the serial console; the remote terminal resolves
//! numeric indices carried by downlink packets. Both narrow the context
//! flags along the path and re-check them at the terminal node, then run the
//! command through the same execution path: a custom callback or the generic
//! configuration-variable accessor.

pub mod accessor;
pub mod cmdset;
pub mod command;
pub mod console;
pub mod defer;
pub mod flags;
pub mod params;
pub mod remote;

// Re-export the engine surface
pub use cmdset::ROOT_COMMANDS;
pub use command::{
    CommandContext, CommandError, CommandNode, CommandOrigin, CommandPayload, ConfigVar,
};
pub use console::LocalTerminal;
pub use defer::{DeferredSlot, ResponseFn, REMOTE_BUF_SIZE};
pub use flags::CommandFlags;
pub use params::{ParamKind, ParamValue};
