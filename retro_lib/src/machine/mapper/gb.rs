//! Game Boy cartridge mapper with boot-ROM lockout.
//!
//! At power-on the console's boot ROM shadows the bottom of the address
//! space and the cartridge ROM is reachable only above it. The boot sequence
//! finishes by writing a non-zero byte to a 1-byte lock port; that write
//! permanently swaps the boot ROM out and extends the cartridge ROM window
//! down over the vacated range. The transition is one-shot: later writes to
//! the port do nothing for the rest of the session.

use crate::error::{RetroError, RetroResult};
use crate::machine::cart::{CartHeader, HEADER_OFFSET, HEADER_SIZE};
use crate::machine::controller::Controller;
use crate::machine::memory::{Bus, MemOps, Region, RegionId, Rom};
use crate::machine::resource::{Resource, ResourceTable};
use crate::util::fs::map_file;
use log::{debug, error, info};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

/// Memory bank controller variants, keyed by the header's cartridge-type
/// code. Only plain ROM carts are wired up; anything else fails init.
#[derive(FromPrimitive, Copy, Clone, PartialEq, Eq, Debug)]
enum Mbc {
    RomOnly = 0x00,
}

pub struct GbMapper {
    cart_path: PathBuf,
    bootrom_path: PathBuf,
    state: Option<Rc<RefCell<MapperState>>>,
}

struct MapperState {
    cart_path: PathBuf,
    bootrom_path: PathBuf,
    bootrom_area: Resource,
    rom0_area: Resource,
    bootrom_len: u32,
    bootrom_region: Option<RegionId>,
    rom0_region: Option<RegionId>,
    lock_region: Option<RegionId>,
    locked: bool,
}

impl MapperState {
    fn map_bootrom(&mut self, bus: &mut Bus) -> RetroResult<()> {
        let buf = map_file(&self.bootrom_path, 0, self.bootrom_len as usize)?;
        let region = Region::new(
            self.bootrom_area.clone(),
            Rc::new(RefCell::new(Rom::new(buf))),
        );
        self.bootrom_region = Some(bus.add_region(region)?);
        Ok(())
    }

    /// Map the cartridge ROM under the current `rom0_area` window. While the
    /// boot ROM is still live the window sits above it and the image is read
    /// from the matching file offset; after lockout both drop to zero.
    fn map_rom0(&mut self, bus: &mut Bus) -> RetroResult<()> {
        let offset = if self.locked {
            0
        } else {
            u64::from(self.bootrom_len)
        };

        let buf = map_file(&self.cart_path, offset, self.rom0_area.len() as usize)?;
        let region = Region::new(self.rom0_area.clone(), Rc::new(RefCell::new(Rom::new(buf))));
        self.rom0_region = Some(bus.add_region(region)?);
        Ok(())
    }

    /// The lockout transition: boot ROM out, cartridge ROM remapped from the
    /// start of the image over the widened window.
    fn lock(&mut self, bus: &mut Bus) {
        self.locked = true;

        if let Some(id) = self.bootrom_region.take() {
            bus.remove_region(id);
        }
        if let Some(id) = self.rom0_region.take() {
            bus.remove_region(id);
        }

        let new_start = self.rom0_area.start() - self.bootrom_len as u16;
        self.rom0_area.set_start(new_start);

        if let Err(e) = self.map_rom0(bus) {
            // Bus writes have no error channel; the window stays open-bus.
            error!("lockout remap failed: {e}");
            return;
        }

        debug!("boot ROM locked out, cartridge ROM mapped from {new_start:#06x}");
    }

    /// Remove every Region this mapper still has on the bus.
    fn detach(&mut self, bus: &mut Bus) {
        for id in [
            self.bootrom_region.take(),
            self.rom0_region.take(),
            self.lock_region.take(),
        ]
        .into_iter()
        .flatten()
        {
            bus.remove_region(id);
        }
    }
}

/// The 1-byte control port. Reads float; the first non-zero write fires the
/// lockout transition.
struct LockPort {
    state: Rc<RefCell<MapperState>>,
}

impl MemOps for LockPort {
    fn write_byte(&mut self, bus: &mut Bus, _offset: u16, val: u8) {
        if val == 0 {
            return;
        }

        let mut state = self.state.borrow_mut();
        if state.locked {
            return;
        }

        state.lock(bus);
    }
}

impl GbMapper {
    pub fn new(cart_path: PathBuf, bootrom_path: PathBuf) -> GbMapper {
        GbMapper {
            cart_path,
            bootrom_path,
            state: None,
        }
    }
}

impl Controller for GbMapper {
    fn init(&mut self, bus: &mut Bus, resources: &ResourceTable) -> RetroResult<()> {
        let header_win = map_file(&self.cart_path, HEADER_OFFSET, HEADER_SIZE)?;
        let header = CartHeader::parse(&header_win)?;
        drop(header_win);

        header.log_banner();

        let mbc = Mbc::from_u8(header.cart_type)
            .ok_or(RetroError::UnsupportedCartType(header.cart_type))?;
        info!("Cart type {:02x} ({:?}) detected", header.cart_type, mbc);

        let bootrom_area = resources.get("bootrom")?.clone();
        let mut rom0_area = resources.get("rom0")?.clone();
        let lock_area = resources.get("lock")?.clone();

        // The cartridge window starts where the boot ROM shadow ends.
        let bootrom_len = bootrom_area.len();
        rom0_area.set_start(rom0_area.start() + bootrom_len as u16);

        let mut state = MapperState {
            cart_path: self.cart_path.clone(),
            bootrom_path: self.bootrom_path.clone(),
            bootrom_area,
            rom0_area,
            bootrom_len,
            bootrom_region: None,
            rom0_region: None,
            lock_region: None,
            locked: false,
        };

        let mapped = match state.map_bootrom(bus) {
            Ok(()) => state.map_rom0(bus),
            Err(e) => Err(e),
        };
        if let Err(e) = mapped {
            state.detach(bus);
            return Err(e);
        }

        let state = Rc::new(RefCell::new(state));
        let lock_port = LockPort {
            state: Rc::clone(&state),
        };
        match bus.add_region(Region::new(lock_area, Rc::new(RefCell::new(lock_port)))) {
            Ok(id) => state.borrow_mut().lock_region = Some(id),
            Err(e) => {
                state.borrow_mut().detach(bus);
                return Err(e);
            }
        }

        self.state = Some(state);
        Ok(())
    }

    fn deinit(&mut self, bus: &mut Bus) {
        if let Some(state) = self.state.take() {
            state.borrow_mut().detach(bus);
        }
    }
}
