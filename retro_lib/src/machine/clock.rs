//! Multi-rate clock scheduling.
//!
//! Every subsystem clock is expressed as an exact integer divisor of one
//! master rate (the LCM of all registered rates), so two clocks never drift
//! apart no matter how many ticks elapse. The run loop advances a single
//! master counter; each clock fires whenever the counter is a multiple of
//! its divisor.

use crate::error::{RetroError, RetroResult};
use crate::machine::memory::Bus;
use std::cell::RefCell;
use std::rc::Rc;

/// A subsystem driven by the scheduler. Tick callbacks are where CPUs and
/// peripherals do their work, so they get the session's bus.
pub trait Tickable {
    fn tick(&mut self, bus: &mut Bus);
}

/// A periodic driver for one subsystem.
pub struct Clock {
    rate: u32,
    div: u32,
    dev: Rc<RefCell<dyn Tickable>>,
}

impl Clock {
    pub fn new(rate: u32, dev: Rc<RefCell<dyn Tickable>>) -> Clock {
        // The divisor is derived when the clock is registered.
        Clock { rate, div: 0, dev }
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn divisor(&self) -> u32 {
        self.div
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    let (mut a, mut b) = (a, b);
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

fn lcm(a: u64, b: u64) -> u64 {
    // Divide before multiplying; the inputs individually fit 32 bits but
    // their product needs the full 64.
    a / gcd(a, b) * b
}

/// Registration-ordered collection of Clocks plus the derived master rate.
pub struct ClockScheduler {
    clocks: Vec<Clock>,
    master_rate: u32,
}

impl ClockScheduler {
    pub fn new() -> ClockScheduler {
        ClockScheduler {
            clocks: Vec::new(),
            master_rate: 0,
        }
    }

    /// Master ticks per second: the LCM of every registered clock's rate.
    /// Zero until the first clock is registered.
    pub fn master_rate(&self) -> u32 {
        self.master_rate
    }

    pub fn clock_count(&self) -> usize {
        self.clocks.len()
    }

    /// Registered clocks, in registration order.
    pub fn clocks(&self) -> impl Iterator<Item = &Clock> {
        self.clocks.iter()
    }

    /// Register a clock and refresh the master rate and every divisor.
    ///
    /// A zero rate can never divide the master rate and is rejected here so
    /// `tick_all` never sees it. A combination of rates whose LCM exceeds
    /// 32 bits is likewise rejected.
    ///
    /// Caveat: registering a clock after the run loop has already advanced
    /// its counter recomputes divisors but not the counter's phase, so the
    /// newcomer fires relative to wherever the counter happens to be.
    pub fn add(&mut self, clock: Clock) -> RetroResult<()> {
        if clock.rate == 0 {
            return Err(RetroError::ZeroClockRate);
        }

        let master = self
            .clocks
            .iter()
            .map(|c| u64::from(c.rate))
            .fold(u64::from(clock.rate), lcm);
        let master = u32::try_from(master).map_err(|_| RetroError::MasterRateOverflow)?;

        self.clocks.push(clock);
        self.master_rate = master;
        for c in &mut self.clocks {
            c.div = master / c.rate;
        }

        Ok(())
    }

    /// Fire every clock whose divisor divides `counter`, in registration
    /// order. Ordering matters when one subsystem's tick depends on another
    /// having advanced in the same master step.
    pub fn tick_all(&mut self, counter: u32, bus: &mut Bus) {
        for clock in &self.clocks {
            if counter % clock.div == 0 {
                clock.dev.borrow_mut().tick(bus);
            }
        }
    }

    /// Drop every registered clock. Machine teardown; idempotent.
    pub fn remove_all(&mut self) {
        self.clocks.clear();
        self.master_rate = 0;
    }
}

impl Default for ClockScheduler {
    fn default() -> ClockScheduler {
        ClockScheduler::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records which tag ticked, in order, into a shared trace.
    struct Tracer {
        tag: u32,
        trace: Rc<RefCell<Vec<u32>>>,
    }

    impl Tickable for Tracer {
        fn tick(&mut self, _bus: &mut Bus) {
            self.trace.borrow_mut().push(self.tag);
        }
    }

    fn tracer(tag: u32, trace: &Rc<RefCell<Vec<u32>>>) -> Rc<RefCell<Tracer>> {
        Rc::new(RefCell::new(Tracer {
            tag,
            trace: Rc::clone(trace),
        }))
    }

    #[test]
    fn master_rate_is_lcm() {
        let trace = Rc::new(RefCell::new(Vec::new()));
        let mut sched = ClockScheduler::new();

        sched.add(Clock::new(2, tracer(2, &trace))).unwrap();
        assert_eq!(sched.master_rate(), 2);

        sched.add(Clock::new(3, tracer(3, &trace))).unwrap();
        assert_eq!(sched.master_rate(), 6);

        sched.add(Clock::new(4, tracer(4, &trace))).unwrap();
        assert_eq!(sched.master_rate(), 12);

        // Master rate divides evenly by every registered rate.
        for rate in [2u32, 3, 4] {
            assert_eq!(sched.master_rate() % rate, 0);
        }
    }

    #[test]
    fn two_and_three_hertz() {
        let trace = Rc::new(RefCell::new(Vec::new()));
        let mut bus = Bus::new();
        let mut sched = ClockScheduler::new();

        sched.add(Clock::new(2, tracer(2, &trace))).unwrap();
        sched.add(Clock::new(3, tracer(3, &trace))).unwrap();
        assert_eq!(sched.master_rate(), 6);
        let divisors: Vec<u32> = sched.clocks().map(Clock::divisor).collect();
        assert_eq!(divisors, vec![3, 2]);

        sched.tick_all(0, &mut bus);
        assert_eq!(*trace.borrow(), vec![2, 3]);

        trace.borrow_mut().clear();
        sched.tick_all(2, &mut bus);
        assert_eq!(*trace.borrow(), vec![3]);

        trace.borrow_mut().clear();
        sched.tick_all(3, &mut bus);
        assert_eq!(*trace.borrow(), vec![2]);
    }

    #[test]
    fn fire_counts_over_full_period() {
        let trace = Rc::new(RefCell::new(Vec::new()));
        let mut bus = Bus::new();
        let mut sched = ClockScheduler::new();

        sched.add(Clock::new(2, tracer(2, &trace))).unwrap();
        sched.add(Clock::new(3, tracer(3, &trace))).unwrap();

        for counter in 0..sched.master_rate() {
            sched.tick_all(counter, &mut bus);
        }

        let trace = trace.borrow();
        assert_eq!(trace.iter().filter(|&&t| t == 2).count(), 2);
        assert_eq!(trace.iter().filter(|&&t| t == 3).count(), 3);
    }

    #[test]
    fn registration_order_on_shared_tick() {
        let trace = Rc::new(RefCell::new(Vec::new()));
        let mut bus = Bus::new();
        let mut sched = ClockScheduler::new();

        sched.add(Clock::new(6, tracer(6, &trace))).unwrap();
        sched.add(Clock::new(2, tracer(2, &trace))).unwrap();
        sched.add(Clock::new(3, tracer(3, &trace))).unwrap();

        // Counter 0 fires all three, in the order they were registered.
        sched.tick_all(0, &mut bus);
        assert_eq!(*trace.borrow(), vec![6, 2, 3]);
    }

    #[test]
    fn zero_rate_rejected() {
        let trace = Rc::new(RefCell::new(Vec::new()));
        let mut sched = ClockScheduler::new();

        assert!(matches!(
            sched.add(Clock::new(0, tracer(0, &trace))),
            Err(RetroError::ZeroClockRate)
        ));
        assert_eq!(sched.clock_count(), 0);
    }

    #[test]
    fn master_rate_overflow_rejected() {
        let trace = Rc::new(RefCell::new(Vec::new()));
        let mut sched = ClockScheduler::new();

        // Two coprime rates whose product blows past 32 bits.
        sched
            .add(Clock::new(2_147_483_647, tracer(1, &trace)))
            .unwrap();
        assert!(matches!(
            sched.add(Clock::new(65_537, tracer(2, &trace))),
            Err(RetroError::MasterRateOverflow)
        ));

        // The failed add left the scheduler untouched.
        assert_eq!(sched.clock_count(), 1);
        assert_eq!(sched.master_rate(), 2_147_483_647);
    }

    #[test]
    fn remove_all_is_idempotent() {
        let trace = Rc::new(RefCell::new(Vec::new()));
        let mut sched = ClockScheduler::new();
        sched.add(Clock::new(100, tracer(1, &trace))).unwrap();

        sched.remove_all();
        assert_eq!(sched.clock_count(), 0);
        assert_eq!(sched.master_rate(), 0);
        sched.remove_all();
        assert_eq!(sched.clock_count(), 0);
    }
}
