//! Built-in machine definitions.

pub mod gb;
pub mod nes;
