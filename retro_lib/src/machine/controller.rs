//! Cartridge controller interface.

use crate::error::RetroResult;
use crate::machine::memory::Bus;
use crate::machine::resource::ResourceTable;

/// Cartridge-type-specific logic owning mapped memory and the Regions built
/// on top of it.
///
/// `init` claims the Resources the variant needs, maps its file windows and
/// activates its Regions on the bus; on failure it must leave nothing behind
/// — every Region it managed to add is removed again before the error is
/// returned. `deinit` removes whatever is still active; the backing buffers
/// go away with their devices.
pub trait Controller {
    fn init(&mut self, bus: &mut Bus, resources: &ResourceTable) -> RetroResult<()>;

    fn deinit(&mut self, bus: &mut Bus);
}
