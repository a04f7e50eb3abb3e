//! Game Boy (DMG) machine definition.

use crate::error::{RetroError, RetroResult};
use crate::machine::mapper::gb::GbMapper;
use crate::machine::memory::{Ram, Region};
use crate::machine::resource::{Resource, ResourceTable};
use crate::machine::{MachineConfig, MachineDesc, Session};
use std::cell::RefCell;
use std::rc::Rc;

pub const DESC: MachineDesc = MachineDesc {
    name: "gb",
    description: "Nintendo Game Boy (DMG)",
    build,
};

const WRAM_SIZE: usize = 0x2000;

fn resources() -> ResourceTable {
    ResourceTable::new(vec![
        Resource::mem("bootrom", 0x0000, 0x00ff),
        Resource::mem("rom0", 0x0000, 0x7fff),
        Resource::mem("lock", 0xff50, 0xff50),
        Resource::mem("wram", 0xc000, 0xdfff),
        Resource::mem("echo", 0xe000, 0xfdff),
    ])
}

fn build(config: &MachineConfig) -> RetroResult<Session> {
    let resources = resources();
    let mut session = Session::new("gb");

    // Work RAM is console-owned, with the hardware's echo window aliasing
    // all but the top 512 bytes of it.
    let wram = resources.get("wram")?.clone();
    let echo = resources.get("echo")?.clone();
    session.bus.add_region(Region::with_mirrors(
        wram,
        vec![echo],
        Rc::new(RefCell::new(Ram::new(WRAM_SIZE))),
    ))?;

    let bootrom = config.bootrom.clone().ok_or(RetroError::MissingBootRom)?;
    session.add_controller(
        Box::new(GbMapper::new(config.cart.clone(), bootrom)),
        &resources,
    )?;

    Ok(session)
}
