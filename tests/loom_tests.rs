//! Concurrency model-checking for the arm-then-recheck wake-up handshake.
//!
//! Run with: `cargo test --features loom --test loom_tests --release`
//!
//! Loom exhaustively explores thread interleavings under its own atomics, so
//! the protocol under test is reproduced here with `loom::sync` primitives
//! rather than exercised through the real `Part`/`Endpoint` (which are built
//! on `std::sync::atomic` for the non-loom build). What's checked is the
//! handshake itself: a consumer that arms its wake-up flag, fences, and only
//! then rechecks emptiness must never end up parked while data it could have
//! seen sits unread.

#![cfg(feature = "loom")]

use loom::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use loom::sync::Arc;
use loom::thread;

struct Model {
    write_count: AtomicU64,
    read_count: AtomicU64,
    armed: AtomicBool,
    woken: AtomicBool,
}

impl Model {
    fn new() -> Self {
        Self {
            write_count: AtomicU64::new(0),
            read_count: AtomicU64::new(0),
            armed: AtomicBool::new(false),
            woken: AtomicBool::new(false),
        }
    }

    fn has_pending(&self) -> bool {
        self.read_count.load(Ordering::Relaxed) != self.write_count.load(Ordering::Acquire)
    }

    // Mirrors `Endpoint::wait`'s arm-then-recheck: arm, fence, recheck.
    fn arm_then_recheck(&self) -> bool {
        self.armed.store(true, Ordering::Release);
        loom::sync::atomic::fence(Ordering::SeqCst);
        self.has_pending()
    }

    // Mirrors `Part::commit_write` followed by the producer's armed-check.
    fn publish_and_maybe_wake(&self) {
        self.write_count.store(1, Ordering::Release);
        loom::sync::atomic::fence(Ordering::Release);
        if self.armed.load(Ordering::Acquire) {
            self.woken.store(true, Ordering::SeqCst);
        }
    }
}

/// A producer publishing concurrently with a consumer arming must leave the
/// consumer in a state where it can tell, without blocking, that data is
/// ready — either it observes `has_pending()` directly in the recheck, or
/// the producer's publish observes the arm and records a wake. One of the
/// two must hold in every interleaving, or the consumer could park forever
/// on data that already arrived.
#[test]
fn arm_then_recheck_never_misses_a_concurrent_publish() {
    loom::model(|| {
        let model = Arc::new(Model::new());
        let producer_model = Arc::clone(&model);

        let producer = thread::spawn(move || {
            producer_model.publish_and_maybe_wake();
        });

        let saw_pending_on_recheck = model.arm_then_recheck();

        producer.join().unwrap();

        let woken = model.woken.load(Ordering::SeqCst);
        assert!(
            saw_pending_on_recheck || woken,
            "consumer armed without observing pending data and was never woken"
        );
    });
}
