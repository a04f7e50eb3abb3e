//! NES NROM cartridge mapper.
//!
//! No banking hardware at all: the PRG ROM sits in a fixed window (an
//! NROM-128 image is half the window's size and repeats to fill it), and the
//! cartridge's only configurable behavior is which VRAM address line it ties
//! off for nametable mirroring.

use crate::error::{RetroError, RetroResult};
use crate::machine::controller::Controller;
use crate::machine::memory::{Bus, MemOps, Region, RegionId, Rom};
use crate::machine::resource::ResourceTable;
use crate::util::fs::map_file;
use log::info;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

const INES_MAGIC: [u8; 4] = *b"NES\x1a";
const INES_HEADER_SIZE: usize = 16;
const TRAINER_SIZE: u64 = 512;
const PRG_BANK_SIZE: usize = 0x4000;

/// Nametable storage: 2 KiB of VRAM behind a 4 KiB window.
const VRAM_SIZE: usize = 0x800;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Mirroring {
    Vertical,
    Horizontal,
}

/// The iNES preamble, as far as NROM cares about it.
struct InesHeader {
    prg_banks: u8,
    flags6: u8,
    flags7: u8,
}

impl InesHeader {
    fn parse(raw: &[u8]) -> RetroResult<InesHeader> {
        if raw.len() < INES_HEADER_SIZE || raw[0..4] != INES_MAGIC {
            return Err(RetroError::BadCartImage("not an iNES image".to_string()));
        }

        Ok(InesHeader {
            prg_banks: raw[4],
            flags6: raw[6],
            flags7: raw[7],
        })
    }

    fn mapper_code(&self) -> u8 {
        (self.flags7 & 0xf0) | (self.flags6 >> 4)
    }

    fn mirroring(&self) -> Mirroring {
        if self.flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        }
    }

    fn prg_offset(&self) -> u64 {
        let trainer = if self.flags6 & 0x04 != 0 {
            TRAINER_SIZE
        } else {
            0
        };
        INES_HEADER_SIZE as u64 + trainer
    }

    fn prg_len(&self) -> usize {
        usize::from(self.prg_banks) * PRG_BANK_SIZE
    }
}

/// Fold a nametable-window address down to the wired VRAM cell.
///
/// The cartridge controls how VRAM address line 11 reaches the 2 KiB chip:
/// vertical mirroring drops it, horizontal mirroring routes it onto line 10.
fn mirror_address(mode: Mirroring, addr: u16) -> u16 {
    match mode {
        Mirroring::Vertical => addr & !(1 << 11),
        Mirroring::Horizontal => {
            let bit = (addr >> 11) & 1;
            (addr & !(0x3 << 10)) | (bit << 10)
        }
    }
}

/// Nametable VRAM with the session's mirroring mode baked in.
struct Nametables {
    vram: Box<[u8]>,
    mode: Mirroring,
}

impl MemOps for Nametables {
    fn read_byte(&mut self, _bus: &mut Bus, offset: u16) -> u8 {
        self.vram[mirror_address(self.mode, offset) as usize]
    }

    fn write_byte(&mut self, _bus: &mut Bus, offset: u16, val: u8) {
        self.vram[mirror_address(self.mode, offset) as usize] = val;
    }
}

pub struct Nrom {
    cart_path: PathBuf,
    vram_region: Option<RegionId>,
    prg_region: Option<RegionId>,
}

impl Nrom {
    pub fn new(cart_path: PathBuf) -> Nrom {
        Nrom {
            cart_path,
            vram_region: None,
            prg_region: None,
        }
    }

    fn detach(&mut self, bus: &mut Bus) {
        for id in [self.vram_region.take(), self.prg_region.take()]
            .into_iter()
            .flatten()
        {
            bus.remove_region(id);
        }
    }

    fn try_init(&mut self, bus: &mut Bus, resources: &ResourceTable) -> RetroResult<()> {
        let header_win = map_file(&self.cart_path, 0, INES_HEADER_SIZE)?;
        let header = InesHeader::parse(&header_win)?;
        drop(header_win);

        if header.mapper_code() != 0 {
            return Err(RetroError::UnsupportedCartType(header.mapper_code()));
        }

        let mirroring = header.mirroring();
        info!(
            "Mapper 000 (NROM), {} x 16 KiB PRG, {:?} mirroring",
            header.prg_banks, mirroring
        );

        let vram_area = resources.get("vram")?.clone();
        let mirrors = match resources.find("vram_mirror") {
            Some(m) => vec![m.clone()],
            None => Vec::new(),
        };
        let nametables = Nametables {
            vram: vec![0; VRAM_SIZE].into_boxed_slice(),
            mode: mirroring,
        };
        self.vram_region = Some(bus.add_region(Region::with_mirrors(
            vram_area,
            mirrors,
            Rc::new(RefCell::new(nametables)),
        ))?);

        let prg_area = resources.get("prg_rom")?.clone();
        let prg = Rom::new(map_file(&self.cart_path, header.prg_offset(), header.prg_len())?);
        self.prg_region =
            Some(bus.add_region(Region::new(prg_area, Rc::new(RefCell::new(prg))))?);

        Ok(())
    }
}

impl Controller for Nrom {
    fn init(&mut self, bus: &mut Bus, resources: &ResourceTable) -> RetroResult<()> {
        self.try_init(bus, resources).inspect_err(|_| {
            self.detach(bus);
        })
    }

    fn deinit(&mut self, bus: &mut Bus) {
        self.detach(bus);
    }
}
