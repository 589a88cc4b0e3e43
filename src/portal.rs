use crate::error::PortalError;
use crate::invariants::{debug_assert_read_not_past_pending, debug_assert_shadow_ahead};
use crate::{Backoff, Config, Event, Metrics, Part};
use std::cell::Cell;
use std::sync::atomic::{compiler_fence, fence, AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_ENDPOINT_ID: AtomicU64 = AtomicU64::new(0);

/// One side of a portal pair.
///
/// An `Endpoint<T>` is a producer toward its peer (through `remote`) and a
/// consumer from its peer (through `local`). It is built to be used by
/// exactly one thread at a time — nothing here is `Sync`, though the
/// endpoint itself is `Send` so it can be handed to the thread that will
/// own it.
pub struct Endpoint<T> {
    id: u64,
    remote: Arc<Part<T>>,
    local: Arc<Part<T>>,
    /// This endpoint's own wake-up event, armed into `local`'s slots when
    /// this endpoint is about to block.
    event: Arc<Event>,
    /// Producer-private shadow of `remote.write_count`: lives on the
    /// endpoint, not the shared part, and is never touched by anyone but
    /// this endpoint's own thread, hence a plain `Cell`.
    pending_write_count: Cell<u64>,
    /// Number of messages the last `pending()` call reported available,
    /// used to make a misused `read(n)` a catchable error.
    last_pending: Cell<usize>,
    metrics: Metrics,
}

/// Allocates a bidirectional portal pair.
///
/// There is no explicit "free": shared ownership is realized directly
/// through `Arc` — dropping both returned endpoints drops their shared
/// `Part`s and `Event`s exactly once, with no possibility of a double-free
/// or use-after-free.
pub struct PortalPair;

impl PortalPair {
    /// Builds two endpoints wired mirror-symmetrically: endpoint A's
    /// `remote` is endpoint B's `local` and vice versa.
    #[must_use]
    pub fn new<T: Copy + Default>(config: Config) -> (Endpoint<T>, Endpoint<T>) {
        let part_a = Arc::new(Part::new(config));
        let part_b = Arc::new(Part::new(config));
        let event_a = Arc::new(Event::new());
        let event_b = Arc::new(Event::new());

        let a = Endpoint {
            id: NEXT_ENDPOINT_ID.fetch_add(1, Ordering::Relaxed),
            remote: Arc::clone(&part_a),
            local: Arc::clone(&part_b),
            event: event_a,
            pending_write_count: Cell::new(0),
            last_pending: Cell::new(0),
            metrics: Metrics::new(),
        };
        let b = Endpoint {
            id: NEXT_ENDPOINT_ID.fetch_add(1, Ordering::Relaxed),
            remote: part_b,
            local: part_a,
            event: event_b,
            pending_write_count: Cell::new(0),
            last_pending: Cell::new(0),
            metrics: Metrics::new(),
        };

        tracing::debug!(a = a.id, b = b.id, capacity = config.capacity(), "portal pair allocated");
        (a, b)
    }
}

/// Issues `fence(order)` normally, or only a compiler reorder barrier under
/// the single-core [`Config::uniprocessor`] toggle — hardware fences are
/// unneeded when both endpoints are pinned to the same core, but the
/// compiler must still be stopped from reordering around the publication
/// point.
#[inline]
fn ordering_fence(uniprocessor: bool, order: Ordering) {
    if uniprocessor {
        compiler_fence(order);
    } else {
        fence(order);
    }
}

impl<T: Copy + Default> Endpoint<T> {
    /// Allocates a portal pair directly off `Endpoint`, mirroring
    /// `std::os::unix::net::UnixStream::pair`'s "give me both ends" shape.
    #[must_use]
    pub fn pair(config: Config) -> (Self, Self) {
        PortalPair::new(config)
    }

    /// Aggregated send/receive counters for this endpoint, including the
    /// backpressure counter (see [`Metrics`]).
    #[must_use]
    pub fn metrics(&self) -> crate::MetricsSnapshot {
        self.metrics.snapshot()
    }

    // -------------------------------------------------------------------
    // Producer path
    // -------------------------------------------------------------------

    /// Publishes one message into `remote`'s ring. Busy-waits (yielding to
    /// the scheduler) if the ring is full, charity-waking a sleeping
    /// consumer so it can drain and make room. Does not itself make the
    /// write visible to the consumer — call [`Endpoint::flush`] or
    /// [`Endpoint::notify`] to publish the batch, unless this endpoint was
    /// built with [`Config::uniprocessor`], in which case every write
    /// publishes immediately (see [`Endpoint::flush`]).
    pub fn write(&self, msg: T) {
        let pending_write_count = self.pending_write_count.get();
        debug_assert_shadow_ahead!(pending_write_count, self.remote.write_count_relaxed());

        let read_count = self.remote.load_read_count_relaxed();
        let used = pending_write_count.wrapping_sub(read_count);
        if used >= self.remote.capacity() as u64 {
            // Charity wake: a consumer may already be asleep on this ring
            // even though we're the one hitting backpressure. Without this,
            // the producer could spin forever while the consumer sleeps.
            // Counted once per `write` that found the ring full, not once
            // per spin iteration — matching the original's `*test += 1` and
            // `event_set` before its spin loop.
            if let Some(event) = self.remote.armed_event() {
                ordering_fence(self.remote.uniprocessor(), Ordering::Release);
                event.set();
                self.metrics.record_charity_wake();
            }
            self.metrics.record_backpressure();
            tracing::trace!(endpoint = self.id, "ring full, backing off");

            let mut backoff = Backoff::new();
            loop {
                backoff.snooze();
                let read_count = self.remote.load_read_count_relaxed();
                let used = pending_write_count.wrapping_sub(read_count);
                if used < self.remote.capacity() as u64 {
                    break;
                }
            }
        }

        self.remote.write_slot(pending_write_count, msg);
        self.pending_write_count.set(pending_write_count + 1);
        self.metrics.add_messages_sent(1);

        // Under the uniprocessor toggle there is no batching shadow: every
        // write publishes `write_count` on the spot (spec.md §6).
        if self.remote.uniprocessor() {
            self.flush();
        }
    }

    /// Publishes the deferred batch: advances `remote.write_count` to
    /// match `pending_write_count` in one release-fenced store, if there is
    /// anything unpublished.
    pub fn flush(&self) {
        let pending_write_count = self.pending_write_count.get();
        if pending_write_count != self.remote.write_count_relaxed() {
            self.remote.commit_write(pending_write_count);
            self.metrics.add_batches_sent(1);
        }
    }

    /// Flushes, then wakes the consumer if it is armed and the ring is
    /// non-empty. Idempotent and cheap when no consumer is waiting.
    pub fn notify(&self) {
        self.flush();
        if let Some(event) = self.remote.armed_event() {
            if self.remote.has_pending() {
                ordering_fence(self.remote.uniprocessor(), Ordering::Release);
                event.set();
            }
        }
    }

    /// `write(msg)` + `flush()` + unconditional wake if armed — the single
    /// message request/reply primitive.
    pub fn write_and_notify(&self, msg: T) {
        self.write(msg);
        self.flush();
        if let Some(event) = self.remote.armed_event() {
            ordering_fence(self.remote.uniprocessor(), Ordering::Release);
            event.set();
        }
    }

    // -------------------------------------------------------------------
    // Consumer path
    // -------------------------------------------------------------------

    /// Zero-copy peek: returns up to the ring's worth of contiguous
    /// messages currently available, as a borrow into the ring itself. The
    /// borrow is only valid until the next `read`/`wait` call on this
    /// endpoint.
    pub fn pending(&self) -> &[T] {
        let (n, slice) = self.local.pending();
        self.last_pending.set(n);
        slice
    }

    /// Commits consumption of `n` messages, returning them to the producer
    /// for reuse. `n` must not exceed the count the immediately preceding
    /// [`Endpoint::pending`] call reported.
    pub fn read(&self, n: usize) -> Result<(), PortalError> {
        let available = self.last_pending.get();
        debug_assert_read_not_past_pending!(n, available);
        if n > available {
            return Err(PortalError::ReadPastPending {
                requested: n,
                available,
            });
        }

        self.local.advance_read(n as u64);
        self.last_pending.set(available - n);
        self.metrics.add_messages_received(n as u64);
        self.metrics.add_batches_received(1);
        Ok(())
    }

    /// Blocks until `local` is non-empty, using the arm-then-recheck
    /// protocol: never miss a wake-up from a producer that publishes
    /// between the emptiness check and going to sleep.
    pub fn wait(&self) {
        // Publish any producer-side batch toward the peer first — matters
        // when the calling thread alternates direction.
        self.notify();

        self.event.clear();
        self.local.arm_event(&self.event);

        // The arm store above must be globally visible before the
        // emptiness recheck below: the protocol's hinge. Both endpoints
        // share one `uniprocessor` setting by construction (it comes from
        // the `Config` the pair was built with), so consulting `local` here
        // agrees with the `remote`-side checks in the producer path above.
        ordering_fence(self.local.uniprocessor(), Ordering::SeqCst);

        if !self.local.has_pending() {
            tracing::trace!(endpoint = self.id, "blocking on empty ring");
            self.event.wait();
        }

        self.local.disarm_event();
    }

    // -------------------------------------------------------------------
    // Sync request/reply overlay
    // -------------------------------------------------------------------

    /// Sends `msg` tagged with `msg_id` and blocks until the peer replies
    /// with a matching [`Endpoint::sync_reply`] (or, if the peer never
    /// matches the id, blocks forever — this is a single-outstanding-query
    /// protocol, not a queue).
    ///
    /// Returns an error instead of blocking if a previous `sync_query` on
    /// this endpoint has not yet returned.
    pub fn sync_query(&self, msg: T, msg_id: u64) -> Result<(), PortalError> {
        if self.local.armed_msg_event().is_some() {
            return Err(PortalError::ReentrantSyncQuery);
        }

        self.event.clear();
        self.local.arm_msg_event(&self.event, msg_id);

        self.write_and_notify(msg);
        self.event.wait();

        self.local.disarm_msg_event();
        Ok(())
    }

    /// Answers a query if the peer is synchronously awaiting `msg_id`,
    /// waking it directly; otherwise delivers `msg` as an ordinary
    /// streaming message.
    pub fn sync_reply(&self, msg: T, msg_id: u64) {
        if let Some((event, remote_msg_id)) = self.remote.armed_msg_event() {
            if remote_msg_id == msg_id {
                self.write(msg);
                self.flush();
                ordering_fence(self.remote.uniprocessor(), Ordering::Release);
                event.set();
                return;
            }
        }

        self.write_and_notify(msg);
    }
}

impl<T> Drop for Endpoint<T> {
    fn drop(&mut self) {
        tracing::debug!(endpoint = self.id, "endpoint dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singleton_round_trip() {
        let (a, b) = Endpoint::<u64>::pair(Config::default());

        a.write(42);
        a.notify();

        b.wait();
        let pending = b.pending();
        assert_eq!(pending, &[42]);
        b.read(pending.len()).unwrap();

        assert!(b.pending().is_empty());
    }

    #[test]
    fn uniprocessor_toggle_publishes_every_write_without_a_separate_flush() {
        let config = Config::new(4, false).uniprocessor(); // capacity 16
        let (a, b) = Endpoint::<u64>::pair(config);

        // No `notify`/`flush` call here: under the uniprocessor toggle,
        // `write` alone must already have published `write_count`.
        a.write(7);
        assert_eq!(b.pending(), &[7]);
        b.read(1).unwrap();
    }

    #[test]
    fn fill_to_capacity_triggers_backpressure() {
        let config = Config::new(3, false); // capacity 8
        let (a, b) = Endpoint::<u64>::pair(config);

        for i in 0..8u64 {
            a.write(i);
        }
        // Publish the batch (but don't wake anyone — no consumer is waiting
        // yet) so there is something for the consumer to drain once the
        // 9th write blocks below.
        a.flush();
        assert_eq!(a.metrics().full_backpressure, 0);

        // The 9th write must block until the consumer reads at least one
        // slot; drive it from another thread and unblock it from here.
        let writer = std::thread::spawn(move || {
            a.write(8);
            a.flush();
            a.metrics().full_backpressure
        });

        std::thread::sleep(std::time::Duration::from_millis(20));
        b.wait();
        let pending = b.pending();
        assert_eq!(pending.len(), 8);
        b.read(1).unwrap();

        // Exactly one `write` found the ring full.
        let backpressure = writer.join().unwrap();
        assert_eq!(backpressure, 1);
    }

    #[test]
    fn read_past_pending_is_an_error() {
        let (a, b) = Endpoint::<u64>::pair(Config::default());
        a.write(1);
        a.notify();
        b.wait();
        let n = b.pending().len();
        assert_eq!(b.read(n + 1), Err(PortalError::ReadPastPending {
            requested: n + 1,
            available: n,
        }));
    }

    #[test]
    fn sync_query_round_trip() {
        let (a, b) = Endpoint::<u64>::pair(Config::default());

        let responder = std::thread::spawn(move || {
            b.wait();
            let request = b.pending()[0];
            b.read(1).unwrap();
            b.sync_reply(request * 10, 7);
        });

        a.sync_query(6, 7).unwrap();
        let reply = a.pending()[0];
        a.read(1).unwrap();
        assert_eq!(reply, 60);

        responder.join().unwrap();
    }

    #[test]
    fn reentrant_sync_query_is_rejected() {
        // Simulate an in-flight query (as if a prior `sync_query` call were
        // still blocked on `event.wait()` on another thread) by arming the
        // msg-event slot directly, bypassing the blocking call.
        let (a, _b) = Endpoint::<u64>::pair(Config::default());
        a.local.arm_msg_event(&a.event, 99);

        assert_eq!(a.sync_query(1, 1), Err(PortalError::ReentrantSyncQuery));

        a.local.disarm_msg_event();
    }
}
