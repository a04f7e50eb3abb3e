//! Input frontend interface.
//!
//! The emulation core never talks to a windowing system or a keyboard; a
//! frontend drains its own event queue once per run-loop iteration and tells
//! the session whether the user asked to quit.

pub trait InputFrontend {
    /// Drain pending events. Returns true if a quit was requested; the
    /// session observes it at the top of the next loop iteration.
    fn poll_quit(&mut self) -> bool;
}

/// Headless frontend: no events, never quits.
impl InputFrontend for () {
    fn poll_quit(&mut self) -> bool {
        false
    }
}
