//! Context-flag algebra
//!
//! Every command node carries a small set of capability flags controlling
//! who may invoke it (local console / remote downlink) and how (env command,
//! set/show against RAM/EEPROM, generic vs. custom implementation). Flags
//! only *narrow* as resolution descends into sub-lists: the active context
//! is the field-wise AND of every node on the path, so a child can never
//! regain a capability an ancestor dropped.

use super::command::{CommandError, CommandOrigin};

/// Command capability flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFlags {
    /// Node is a command group (has subcommands, no handler)
    pub group: bool,
    /// Executable from the local terminal
    pub local: bool,
    /// Executable from the remote terminal
    pub remote: bool,
    /// Environment command (custom action, not a variable access)
    pub env: bool,
    /// SET command (writes a configuration variable)
    pub set: bool,
    /// SHOW command (reads a configuration variable)
    pub show: bool,
    /// Targets the persisted (EEPROM) record
    pub eeprom: bool,
    /// Targets the live (RAM) record
    pub ram: bool,
    /// Generic implementation (driven by a config-variable descriptor)
    pub generic: bool,
}

impl CommandFlags {
    /// All capabilities cleared
    pub const fn none() -> Self {
        Self {
            group: false,
            local: false,
            remote: false,
            env: false,
            set: false,
            show: false,
            eeprom: false,
            ram: false,
            generic: false,
        }
    }

    /// All capabilities granted (root resolution context)
    pub const fn all() -> Self {
        Self {
            group: true,
            local: true,
            remote: true,
            env: true,
            set: true,
            show: true,
            eeprom: true,
            ram: true,
            generic: true,
        }
    }

    /// Field-wise AND: the context after descending into `child`
    pub fn narrow(&self, child: &CommandFlags) -> Self {
        Self {
            group: self.group && child.group,
            local: self.local && child.local,
            remote: self.remote && child.remote,
            env: self.env && child.env,
            set: self.set && child.set,
            show: self.show && child.show,
            eeprom: self.eeprom && child.eeprom,
            ram: self.ram && child.ram,
            generic: self.generic && child.generic,
        }
    }

    /// True if a command subtree with these flags can still lead to a
    /// runnable command
    ///
    /// A subtree is viable when some origin may reach it and it is either an
    /// env command or a set/show command with at least one storage target.
    pub fn subtree_valid(&self) -> bool {
        if !(self.local || self.remote) {
            return false;
        }
        if self.env {
            return true;
        }
        (self.set || self.show) && (self.ram || self.eeprom)
    }

    /// Check that a command with these (already narrowed) flags may run for
    /// the given origin
    ///
    /// Evaluated fresh at the terminal node of every resolution; narrowing
    /// changes the answer level by level, so it is never cached.
    pub fn check_context(&self, origin: CommandOrigin) -> Result<(), CommandError> {
        if !self.subtree_valid() {
            // table-authoring bug, not a caller error
            return Err(CommandError::Unspecified);
        }

        match origin {
            CommandOrigin::Local if !self.local => Err(CommandError::ContextRemoteOnly),
            CommandOrigin::Remote if !self.remote => Err(CommandError::ContextLocalOnly),
            _ => Ok(()),
        }
    }

    fn as_array(&self) -> [bool; 9] {
        [
            self.group,
            self.local,
            self.remote,
            self.env,
            self.set,
            self.show,
            self.eeprom,
            self.ram,
            self.generic,
        ]
    }

    /// True if `self` grants no capability that `other` lacks
    pub fn subset_of(&self, other: &CommandFlags) -> bool {
        self.as_array()
            .iter()
            .zip(other.as_array().iter())
            .all(|(mine, theirs)| !mine | theirs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrow_is_field_wise_and() {
        let parent = CommandFlags {
            local: true,
            remote: true,
            set: true,
            eeprom: true,
            ..CommandFlags::none()
        };
        let child = CommandFlags {
            local: true,
            set: true,
            eeprom: true,
            ram: true,
            ..CommandFlags::none()
        };

        let narrowed = parent.narrow(&child);
        assert!(narrowed.local);
        assert!(!narrowed.remote); // child lacks it
        assert!(!narrowed.ram); // parent lacks it
        assert!(narrowed.set && narrowed.eeprom);
    }

    #[test]
    fn test_narrowing_never_widens() {
        let parent = CommandFlags {
            local: true,
            show: true,
            ram: true,
            ..CommandFlags::none()
        };
        let child = CommandFlags::all();

        let narrowed = parent.narrow(&child);
        assert!(narrowed.subset_of(&parent));
        assert!(narrowed.subset_of(&child));

        // repeated narrowing is monotonically non-increasing
        let deeper = narrowed.narrow(&CommandFlags {
            local: true,
            show: true,
            ..CommandFlags::none()
        });
        assert!(deeper.subset_of(&narrowed));
    }

    #[test]
    fn test_subtree_valid() {
        // env command reachable locally
        assert!(CommandFlags {
            local: true,
            env: true,
            ..CommandFlags::none()
        }
        .subtree_valid());

        // set command with a storage target
        assert!(CommandFlags {
            remote: true,
            set: true,
            eeprom: true,
            ..CommandFlags::none()
        }
        .subtree_valid());

        // no origin at all
        assert!(!CommandFlags {
            env: true,
            ..CommandFlags::none()
        }
        .subtree_valid());

        // set/show without a storage target
        assert!(!CommandFlags {
            local: true,
            set: true,
            show: true,
            ..CommandFlags::none()
        }
        .subtree_valid());

        // storage target without set/show or env
        assert!(!CommandFlags {
            local: true,
            ram: true,
            ..CommandFlags::none()
        }
        .subtree_valid());
    }

    #[test]
    fn test_check_context_origin_gating() {
        let local_only = CommandFlags {
            local: true,
            env: true,
            ..CommandFlags::none()
        };
        assert!(local_only.check_context(CommandOrigin::Local).is_ok());
        assert_eq!(
            local_only.check_context(CommandOrigin::Remote),
            Err(CommandError::ContextLocalOnly)
        );

        let remote_only = CommandFlags {
            remote: true,
            env: true,
            ..CommandFlags::none()
        };
        assert_eq!(
            remote_only.check_context(CommandOrigin::Local),
            Err(CommandError::ContextRemoteOnly)
        );
        assert!(remote_only.check_context(CommandOrigin::Remote).is_ok());
    }

    #[test]
    fn test_check_context_invalid_definition() {
        let broken = CommandFlags {
            local: true,
            set: true,
            ..CommandFlags::none()
        };
        assert_eq!(
            broken.check_context(CommandOrigin::Local),
            Err(CommandError::Unspecified)
        );
    }
}
