//! Cartridge mapper controllers, one module per hardware family.

pub mod gb;
pub mod nrom;
