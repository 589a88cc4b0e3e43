use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for monitoring portal performance.
///
/// Every field is an independent `AtomicU64` with `Relaxed` ordering —
/// these are observability counters, not synchronization, so there is no
/// ordering contract between them and the data they describe.
#[derive(Debug, Default)]
pub struct Metrics {
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    batches_sent: AtomicU64,
    batches_received: AtomicU64,
    /// One per `write` call that found the ring full and had to busy-wait —
    /// the only externally observable sign of backpressure.
    full_backpressure: AtomicU64,
    /// Times a producer fired the consumer's event from the backpressure
    /// path rather than from `notify` (a "charity wake").
    charity_wakes: AtomicU64,
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_messages_sent(&self, n: u64) {
        self.messages_sent.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn add_messages_received(&self, n: u64) {
        self.messages_received.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn add_batches_sent(&self, n: u64) {
        self.batches_sent.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn add_batches_received(&self, n: u64) {
        self.batches_received.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn record_backpressure(&self) {
        self.full_backpressure.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_charity_wake(&self) {
        self.charity_wakes.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            batches_received: self.batches_received.load(Ordering::Relaxed),
            full_backpressure: self.full_backpressure.load(Ordering::Relaxed),
            charity_wakes: self.charity_wakes.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`Metrics`], cheap to pass around and compare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub batches_sent: u64,
    pub batches_received: u64,
    pub full_backpressure: u64,
    pub charity_wakes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_events() {
        let metrics = Metrics::new();
        metrics.add_messages_sent(5);
        metrics.add_batches_sent(1);
        metrics.record_backpressure();
        metrics.record_charity_wake();

        let snap = metrics.snapshot();
        assert_eq!(snap.messages_sent, 5);
        assert_eq!(snap.batches_sent, 1);
        assert_eq!(snap.full_backpressure, 1);
        assert_eq!(snap.charity_wakes, 1);
        assert_eq!(snap.messages_received, 0);
    }
}
