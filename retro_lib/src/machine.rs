//! Machine sessions and the machine registry.
//!
//! A `Session` is the explicit context for one emulated machine: its bus,
//! its clock scheduler and its controllers. Machine definitions are plain
//! descriptors registered by name at startup; building one wires resources,
//! controllers and clocks into a fresh session.

pub mod cart;
pub mod clock;
pub mod controller;
pub mod mapper;
pub mod memory;
pub mod resource;

use crate::debugger::{DebugAction, Debugger};
use crate::error::{RetroError, RetroResult};
use crate::input::InputFrontend;
use fnv::FnvHashMap;
use log::{info, warn};
use self::clock::ClockScheduler;
use self::controller::Controller;
use self::memory::Bus;
use self::resource::ResourceTable;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Everything a machine builder needs to know from the outside world.
pub struct MachineConfig {
    /// Cartridge image.
    pub cart: PathBuf,
    /// Boot ROM image, for machines that ship one.
    pub bootrom: Option<PathBuf>,
}

/// One live machine instance.
pub struct Session {
    name: &'static str,
    pub bus: Bus,
    pub clocks: ClockScheduler,
    controllers: Vec<Box<dyn Controller>>,
    running: bool,
}

impl Session {
    pub fn new(name: &'static str) -> Session {
        Session {
            name,
            bus: Bus::new(),
            clocks: ClockScheduler::new(),
            controllers: Vec::new(),
            running: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Initialize a controller against this session's bus and keep it. A
    /// failed init adds nothing (the controller is responsible for removing
    /// anything it had placed before erroring) and the controller is
    /// dropped.
    pub fn add_controller(
        &mut self,
        mut controller: Box<dyn Controller>,
        resources: &ResourceTable,
    ) -> RetroResult<()> {
        controller.init(&mut self.bus, resources)?;
        self.controllers.push(controller);
        Ok(())
    }

    /// Drive the machine until the input frontend or the debugger stops it.
    ///
    /// Each iteration: debugger hook, input poll, one `tick_all`, then a
    /// pacing sleep whenever emulated time is ahead of wall-clock time. The
    /// pacing window resets every `master_rate` ticks (once per emulated
    /// second) so a long stall doesn't turn into an unbounded sprint
    /// afterwards.
    pub fn run(&mut self, input: &mut dyn InputFrontend, debugger: &mut dyn Debugger) {
        let master_rate = self.clocks.master_rate();
        if master_rate == 0 {
            warn!("no clock registered for machine \"{}\"", self.name);
            return;
        }

        let tick_ns = NANOS_PER_SEC / u64::from(master_rate);
        let mut counter: u32 = 0;
        let mut window_start = Instant::now();

        self.running = true;
        while self.running {
            if debugger.update() == DebugAction::Kill {
                self.running = false;
                continue;
            }
            if input.poll_quit() {
                self.running = false;
                continue;
            }

            self.clocks.tick_all(counter, &mut self.bus);
            counter += 1;

            let target = Duration::from_nanos(tick_ns * u64::from(counter));
            let elapsed = window_start.elapsed();
            if target > elapsed {
                thread::sleep(target - elapsed);
            }

            if counter == master_rate {
                counter = 0;
                window_start = Instant::now();
            }
        }
    }

    /// Tear the machine down: clocks first, then controllers (each removes
    /// its Regions and releases its buffers), then whatever machine-owned
    /// Regions remain. Idempotent.
    pub fn deinit(&mut self) {
        self.clocks.remove_all();
        for controller in &mut self.controllers {
            controller.deinit(&mut self.bus);
        }
        self.controllers.clear();
        self.bus.remove_all();
    }
}

/// A machine definition: a name, a blurb and a builder.
#[derive(Copy, Clone)]
pub struct MachineDesc {
    pub name: &'static str,
    pub description: &'static str,
    pub build: fn(&MachineConfig) -> RetroResult<Session>,
}

/// Name-keyed machine registry, populated explicitly at startup.
pub struct Registry {
    machines: FnvHashMap<&'static str, MachineDesc>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry {
            machines: FnvHashMap::default(),
        }
    }

    /// Every machine definition this library ships.
    pub fn with_builtins() -> Registry {
        let mut registry = Registry::new();
        registry.register(crate::machines::gb::DESC);
        registry.register(crate::machines::nes::DESC);
        registry
    }

    pub fn register(&mut self, desc: MachineDesc) {
        self.machines.insert(desc.name, desc);
    }

    pub fn find(&self, name: &str) -> Option<&MachineDesc> {
        self.machines.get(name)
    }

    /// Look a machine up by name and build a session for it.
    pub fn build(&self, name: &str, config: &MachineConfig) -> RetroResult<Session> {
        let desc = self
            .find(name)
            .ok_or_else(|| RetroError::UnknownMachine(name.to_string()))?;

        info!("Machine: {} ({})", desc.name, desc.description);
        (desc.build)(config)
    }
}

impl Default for Registry {
    fn default() -> Registry {
        Registry::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::clock::{Clock, Tickable};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct TickCounter {
        ticks: Rc<RefCell<u32>>,
    }

    impl Tickable for TickCounter {
        fn tick(&mut self, _bus: &mut Bus) {
            *self.ticks.borrow_mut() += 1;
        }
    }

    /// Requests a kill after a fixed number of polls.
    struct KillSwitch {
        polls_left: u32,
    }

    impl Debugger for KillSwitch {
        fn update(&mut self) -> DebugAction {
            if self.polls_left == 0 {
                DebugAction::Kill
            } else {
                self.polls_left -= 1;
                DebugAction::Continue
            }
        }
    }

    struct QuitAfter {
        polls_left: u32,
    }

    impl InputFrontend for QuitAfter {
        fn poll_quit(&mut self) -> bool {
            if self.polls_left == 0 {
                true
            } else {
                self.polls_left -= 1;
                false
            }
        }
    }

    #[test]
    fn unknown_machine_rejected() {
        let registry = Registry::with_builtins();
        let config = MachineConfig {
            cart: "nowhere.bin".into(),
            bootrom: None,
        };

        assert!(matches!(
            registry.build("vectrex", &config),
            Err(RetroError::UnknownMachine(_))
        ));
    }

    #[test]
    fn run_without_clocks_returns() {
        let mut session = Session::new("bare");
        // Returns immediately instead of spinning forever.
        session.run(&mut (), &mut ());
    }

    #[test]
    fn input_quit_stops_the_loop() {
        let ticks = Rc::new(RefCell::new(0));
        let mut session = Session::new("ticky");
        session
            .clocks
            .add(Clock::new(
                10_000,
                Rc::new(RefCell::new(TickCounter {
                    ticks: Rc::clone(&ticks),
                })),
            ))
            .unwrap();

        let mut input = QuitAfter { polls_left: 5 };
        session.run(&mut input, &mut ());

        // One tick per iteration, and the quit poll lands before the tick.
        assert_eq!(*ticks.borrow(), 5);
    }

    #[test]
    fn debugger_kill_stops_the_loop() {
        let ticks = Rc::new(RefCell::new(0));
        let mut session = Session::new("killed");
        session
            .clocks
            .add(Clock::new(
                10_000,
                Rc::new(RefCell::new(TickCounter {
                    ticks: Rc::clone(&ticks),
                })),
            ))
            .unwrap();

        let mut debugger = KillSwitch { polls_left: 3 };
        session.run(&mut (), &mut debugger);

        assert_eq!(*ticks.borrow(), 3);
    }

    #[test]
    fn deinit_clears_everything_and_is_idempotent() {
        let ticks = Rc::new(RefCell::new(0));
        let mut session = Session::new("teardown");
        session
            .clocks
            .add(Clock::new(
                100,
                Rc::new(RefCell::new(TickCounter {
                    ticks: Rc::clone(&ticks),
                })),
            ))
            .unwrap();
        session
            .bus
            .add_region(memory::Region::new(
                resource::Resource::mem("scratch", 0x0000, 0x00ff),
                Rc::new(RefCell::new(memory::Ram::new(0x100))),
            ))
            .unwrap();

        session.deinit();
        assert_eq!(session.clocks.clock_count(), 0);
        assert_eq!(session.bus.region_count(), 0);

        session.deinit();
        assert_eq!(session.bus.region_count(), 0);
    }
}
