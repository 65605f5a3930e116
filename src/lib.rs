#![cfg_attr(not(test), no_std)]

//! sensecube - modular sensor-node firmware platform
//!
//! This library provides the configuration console and remote command engine
//! for a low-power sensor node, together with the module/configuration system
//! and the platform abstraction the integration layer plugs hardware into.
//!
//! The same command tree drives two surfaces:
//!
//! - a live serial console, fed one character at a time
//!   ([`terminal::console::LocalTerminal`])
//! - a compact binary downlink protocol with batched commands, deferred out
//!   of the radio receive interrupt ([`terminal::remote`], [`terminal::defer`])

// the mock peripherals are std-backed even when the library itself is not
#[cfg(all(feature = "mock", not(test)))]
extern crate std;

// Platform abstraction layer (hardware behind traits, mocks for host tests)
pub mod platform;

// Core systems: module registry, persisted configuration, logging
pub mod core;

// Command resolution & execution engine
pub mod terminal;

// Measurement/communication modules (config records + command tables)
pub mod modules;
