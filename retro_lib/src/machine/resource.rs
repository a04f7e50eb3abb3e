//! Named address ranges owned by a machine definition.

use crate::error::{RetroError, RetroResult};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ResourceKind {
    Mem,
}

/// A named address range. Machine definitions declare these up front;
/// controllers claim the ones they need by name.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Resource {
    name: &'static str,
    start: u16,
    end: u16,
    kind: ResourceKind,
}

impl Resource {
    pub fn mem(name: &'static str, start: u16, end: u16) -> Resource {
        assert!(start <= end, "resource \"{name}\" has start > end");

        Resource {
            name,
            start,
            end,
            kind: ResourceKind::Mem,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Window length in bytes. A full 64KiB range doesn't fit a `u16`.
    pub fn len(&self) -> u32 {
        u32::from(self.end) - u32::from(self.start) + 1
    }

    pub fn contains(&self, addr: u16) -> bool {
        addr >= self.start && addr <= self.end
    }

    /// Rewrite the window's start address; `end` stays put, so the window
    /// grows or shrinks. Only a controller performing a remap does this
    /// (boot-ROM lockout extends the primary ROM window down over the
    /// vacated range).
    pub fn set_start(&mut self, start: u16) {
        assert!(start <= self.end, "resource \"{}\" has start > end", self.name);
        self.start = start;
    }

    pub fn overlaps(&self, other: &Resource) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Flat lookup table of a machine's Resources. Built once at machine init,
/// never mutated afterwards.
pub struct ResourceTable {
    resources: Vec<Resource>,
}

impl ResourceTable {
    pub fn new(resources: Vec<Resource>) -> ResourceTable {
        ResourceTable { resources }
    }

    pub fn find(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Look up a Resource a controller depends on. An unresolved name is a
    /// configuration error in the machine definition.
    pub fn get(&self, name: &str) -> RetroResult<&Resource> {
        self.find(name)
            .ok_or_else(|| RetroError::UnknownResource(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup() {
        let table = ResourceTable::new(vec![
            Resource::mem("rom0", 0x0000, 0x7fff),
            Resource::mem("wram", 0xc000, 0xdfff),
        ]);

        assert_eq!(table.get("wram").unwrap().start(), 0xc000);
        assert!(matches!(
            table.get("vram"),
            Err(RetroError::UnknownResource(_))
        ));
    }

    #[test]
    fn window_arithmetic() {
        let r = Resource::mem("r", 0x2000, 0x2fff);

        assert_eq!(r.len(), 0x1000);
        assert!(r.contains(0x2000));
        assert!(r.contains(0x2fff));
        assert!(!r.contains(0x3000));
    }

    #[test]
    fn set_start_keeps_end() {
        let mut r = Resource::mem("rom0", 0x0100, 0x7fff);
        r.set_start(0x0000);

        assert_eq!(r.start(), 0x0000);
        assert_eq!(r.end(), 0x7fff);
        assert_eq!(r.len(), 0x8000);
    }

    #[test]
    fn overlap() {
        let a = Resource::mem("a", 0x0000, 0x00ff);
        let b = Resource::mem("b", 0x00ff, 0x01ff);
        let c = Resource::mem("c", 0x0100, 0x01ff);

        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }
}
