//! Machine-agnostic substrate for retro hardware emulators.
//!
//! Three pieces carry the weight: an address [`machine::memory::Bus`] that
//! dispatches reads and writes to a dynamic set of mapped regions, a
//! [`machine::clock::ClockScheduler`] that drives every subsystem from one
//! master counter at exact integer ratios, and the cartridge
//! [`machine::mapper`] controllers that rewire the bus in response to the
//! traffic running over it. CPUs, video and audio are guests on top of this;
//! they register clocks and regions like everything else.

// Emulator types are constrained by the original hardware, so intentional
// truncating and widening casts are pervasive.
#![allow(clippy::cast_possible_truncation)]
// Address windows read more naturally with explicit hex bounds than with
// computed lengths.
#![allow(clippy::unreadable_literal)]

mod error;

pub mod debugger;
pub mod input;
pub mod machine;
pub mod machines;
pub mod util;

pub use error::{RetroError, RetroResult};
pub use machine::{MachineConfig, MachineDesc, Registry, Session};
