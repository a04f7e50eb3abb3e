//! Address bus: dispatches byte/word accesses to a dynamic set of Regions.
//!
//! Regions live in a slot arena and are addressed by `RegionId`, so a write
//! operation is free to add or remove Regions on the bus that is currently
//! dispatching to it (the mechanism behind bank switching and boot-ROM
//! lockout). Dispatch resolves the target up front and keeps its own handle
//! on the device, so a Region removed from inside its own write completes
//! the call in progress; the mutation is visible from the next dispatch on.

use crate::error::{RetroError, RetroResult};
use crate::machine::resource::Resource;
use crate::util::fs::FileBuffer;
use std::cell::RefCell;
use std::rc::Rc;

/// What a read of an unmapped address returns. Real hardware leaves the data
/// lines floating high.
pub const OPEN_BUS: u8 = 0xff;

/// Read/write operations backing one Region.
///
/// Every operation receives the dispatching bus, so a device can remap the
/// address space in reaction to traffic. The word operations default to two
/// byte accesses composed little-endian; devices with wider backing storage
/// can override them. Unimplemented reads float, unimplemented writes are
/// swallowed.
pub trait MemOps {
    fn read_byte(&mut self, bus: &mut Bus, offset: u16) -> u8 {
        let _ = (bus, offset);
        OPEN_BUS
    }

    fn write_byte(&mut self, bus: &mut Bus, offset: u16, val: u8) {
        let _ = (bus, offset, val);
    }

    fn read_word(&mut self, bus: &mut Bus, offset: u16) -> u16 {
        let lo = self.read_byte(bus, offset);
        let hi = self.read_byte(bus, offset.wrapping_add(1));
        u16::from(lo) | (u16::from(hi) << 8)
    }

    fn write_word(&mut self, bus: &mut Bus, offset: u16, val: u16) {
        self.write_byte(bus, offset, val as u8);
        self.write_byte(bus, offset.wrapping_add(1), (val >> 8) as u8);
    }
}

/// Shared handle on a Region's device. The bus and the controller that owns
/// the Region both hold one; an in-flight dispatch holds a third for the
/// duration of the call.
pub type DevHandle = Rc<RefCell<dyn MemOps>>;

/// A live binding of a Resource window to a device.
pub struct Region {
    area: Resource,
    mirrors: Vec<Resource>,
    dev: DevHandle,
}

impl Region {
    pub fn new(area: Resource, dev: DevHandle) -> Region {
        Region {
            area,
            mirrors: Vec::new(),
            dev,
        }
    }

    /// A Region whose device is also reachable through alternate windows.
    /// Accesses through a mirror are translated to the primary window's
    /// local coordinates modulo its length before reaching the device.
    pub fn with_mirrors(area: Resource, mirrors: Vec<Resource>, dev: DevHandle) -> Region {
        Region { area, mirrors, dev }
    }

    pub fn name(&self) -> &'static str {
        self.area.name()
    }

    fn ranges(&self) -> impl Iterator<Item = &Resource> {
        std::iter::once(&self.area).chain(self.mirrors.iter())
    }

    /// Translate a bus address into the Region's local coordinate, if any of
    /// its windows claim it.
    fn translate(&self, addr: u16) -> Option<u16> {
        if self.area.contains(addr) {
            return Some(addr - self.area.start());
        }

        for mirror in &self.mirrors {
            if mirror.contains(addr) {
                let local = u32::from(addr - mirror.start());
                return Some((local % self.area.len()) as u16);
            }
        }

        None
    }
}

/// Stable handle on an active Region. Stays valid until the Region is
/// removed, no matter what else is added or removed around it.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct RegionId(usize);

/// The address bus for one machine session.
pub struct Bus {
    slots: Vec<Option<Region>>,
}

impl Bus {
    pub fn new() -> Bus {
        Bus { slots: Vec::new() }
    }

    fn active(&self) -> impl Iterator<Item = &Region> {
        self.slots.iter().flatten()
    }

    /// Number of active Regions.
    pub fn region_count(&self) -> usize {
        self.active().count()
    }

    /// Activate a Region. Every window the Region declares (its area and its
    /// mirrors) must be disjoint from every window of every active Region;
    /// an overlap is a configuration error and the Region is not added.
    pub fn add_region(&mut self, region: Region) -> RetroResult<RegionId> {
        for other in self.active() {
            for theirs in other.ranges() {
                if region.ranges().any(|ours| ours.overlaps(theirs)) {
                    return Err(RetroError::RegionOverlap(region.name().to_string()));
                }
            }
        }

        let id = match self.slots.iter().position(Option::is_none) {
            Some(free) => {
                self.slots[free] = Some(region);
                free
            }
            None => {
                self.slots.push(Some(region));
                self.slots.len() - 1
            }
        };

        Ok(RegionId(id))
    }

    /// Deactivate a Region, freeing its address range for reuse. Legal from
    /// within a dispatch through the Region itself; the call in progress
    /// completes against the device it already resolved.
    pub fn remove_region(&mut self, id: RegionId) {
        self.slots[id.0] = None;
    }

    /// Drop every active Region. Machine teardown.
    pub fn remove_all(&mut self) {
        self.slots.clear();
    }

    /// Resolve an address to the owning Region's device and local offset.
    /// Returns an owned device handle so the caller holds no reference into
    /// the slot arena while the device runs.
    fn resolve(&self, addr: u16) -> Option<(DevHandle, u16)> {
        for region in self.active() {
            if let Some(local) = region.translate(addr) {
                return Some((Rc::clone(&region.dev), local));
            }
        }

        None
    }

    pub fn read_byte(&mut self, addr: u16) -> u8 {
        match self.resolve(addr) {
            Some((dev, local)) => dev.borrow_mut().read_byte(self, local),
            None => OPEN_BUS,
        }
    }

    pub fn read_word(&mut self, addr: u16) -> u16 {
        match self.resolve(addr) {
            Some((dev, local)) => dev.borrow_mut().read_word(self, local),
            None => u16::from(OPEN_BUS) | (u16::from(OPEN_BUS) << 8),
        }
    }

    pub fn write_byte(&mut self, addr: u16, val: u8) {
        if let Some((dev, local)) = self.resolve(addr) {
            dev.borrow_mut().write_byte(self, local, val);
        }
    }

    pub fn write_word(&mut self, addr: u16, val: u16) {
        if let Some((dev, local)) = self.resolve(addr) {
            dev.borrow_mut().write_word(self, local, val);
        }
    }
}

impl Default for Bus {
    fn default() -> Bus {
        Bus::new()
    }
}

/// Read-only storage mapped from a cartridge or boot ROM file. Accesses
/// reduce the local address modulo the storage length, so a small image in a
/// larger window repeats to fill it (NROM-128 style wiring). Writes are
/// swallowed, as on the real pins.
pub struct Rom {
    data: FileBuffer,
}

impl Rom {
    pub fn new(data: FileBuffer) -> Rom {
        Rom { data }
    }
}

impl MemOps for Rom {
    fn read_byte(&mut self, _bus: &mut Bus, offset: u16) -> u8 {
        self.data[offset as usize % self.data.len()]
    }
}

/// Plain byte-addressable RAM, allocated by a machine definition.
pub struct Ram {
    data: Box<[u8]>,
}

impl Ram {
    pub fn new(len: usize) -> Ram {
        Ram {
            data: vec![0; len].into_boxed_slice(),
        }
    }
}

impl MemOps for Ram {
    fn read_byte(&mut self, _bus: &mut Bus, offset: u16) -> u8 {
        self.data[offset as usize % self.data.len()]
    }

    fn write_byte(&mut self, _bus: &mut Bus, offset: u16, val: u8) {
        let len = self.data.len();
        self.data[offset as usize % len] = val;
    }
}
