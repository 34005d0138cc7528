//! Blocking gate the reader parks on while the disc holds a still frame.

use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Why [`WaitGate::wait`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Another thread asked the reader to continue.
    Released,
    TimedOut,
    /// The session is shutting down.
    Closed,
}

#[derive(Default)]
struct GateState {
    released: bool,
    closed: bool,
}

/// A release latch plus a close flag behind one condition variable.
#[derive(Default)]
pub struct WaitGate {
    state: Mutex<GateState>,
    cond: Condvar,
}

impl WaitGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new wait, forgetting releases aimed at an earlier one.
    pub fn arm(&self) {
        self.state.lock().released = false;
    }

    /// Let the current (or next) waiter continue.
    pub fn release(&self) {
        self.state.lock().released = true;
        self.cond.notify_all();
    }

    /// Wake every waiter for good.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.cond.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Block until released, closed, or `timeout` elapses. A release is
    /// consumed by the waiter that observes it.
    pub fn wait(&self, timeout: Duration) -> WaitOutcome {
        let mut state = self.state.lock();
        if !state.closed && !state.released {
            self.cond.wait_for(&mut state, timeout);
        }
        if state.closed {
            WaitOutcome::Closed
        } else if state.released {
            state.released = false;
            WaitOutcome::Released
        } else {
            WaitOutcome::TimedOut
        }
    }
}
