//! NES machine definition.

use crate::error::RetroResult;
use crate::machine::mapper::nrom::Nrom;
use crate::machine::resource::{Resource, ResourceTable};
use crate::machine::{MachineConfig, MachineDesc, Session};

pub const DESC: MachineDesc = MachineDesc {
    name: "nes",
    description: "Nintendo Entertainment System (NROM)",
    build,
};

fn resources() -> ResourceTable {
    ResourceTable::new(vec![
        Resource::mem("vram", 0x2000, 0x2fff),
        Resource::mem("vram_mirror", 0x3000, 0x3eff),
        Resource::mem("prg_rom", 0x8000, 0xffff),
    ])
}

fn build(config: &MachineConfig) -> RetroResult<Session> {
    let resources = resources();
    let mut session = Session::new("nes");

    session.add_controller(Box::new(Nrom::new(config.cart.clone())), &resources)?;

    Ok(session)
}
