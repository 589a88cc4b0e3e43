use parking_lot::{Condvar, Mutex};

/// A manual-reset, one-shot-per-arm blocking event.
///
/// Mirrors Windows `CreateEvent(manual_reset = true)` semantics: `set`
/// transitions to signalled and stays there until `clear`; `wait` returns
/// immediately if already signalled; multiple `set` calls between `clear`s
/// coalesce into one signalled state.
#[derive(Debug, Default)]
pub struct Event {
    signalled: Mutex<bool>,
    condvar: Condvar,
}

impl Event {
    /// Allocates a new, initially non-signalled event.
    #[must_use]
    pub fn new() -> Self {
        Self {
            signalled: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Transitions to signalled. Idempotent: a second `set` before the next
    /// `clear` is a no-op beyond waking any waiter again.
    pub fn set(&self) {
        let mut signalled = self.signalled.lock();
        if !*signalled {
            *signalled = true;
        }
        // Notify unconditionally: a waiter may have already re-checked the
        // flag and be about to sleep (handled by the caller's own
        // arm-then-recheck fence, not by this primitive), so a redundant
        // notify is always safe and never lost.
        self.condvar.notify_one();
    }

    /// Resets to non-signalled.
    pub fn clear(&self) {
        *self.signalled.lock() = false;
    }

    /// Blocks until signalled, then returns. Returns immediately if already
    /// signalled. Does not clear the flag — the caller clears before arming
    /// again, per the arm-then-recheck protocol.
    pub fn wait(&self) {
        let mut signalled = self.signalled.lock();
        while !*signalled {
            self.condvar.wait(&mut signalled);
        }
    }

    /// Non-blocking check of the current state. Used by tests to observe
    /// wake-ups without racing a real `wait`.
    #[must_use]
    pub fn is_signalled(&self) -> bool {
        *self.signalled.lock()
    }
}
