use crate::invariants::{
    debug_assert_bounded_count, debug_assert_monotonic, debug_assert_read_not_past_write,
};
use crate::{Config, Event};
use std::cell::UnsafeCell;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicU64, Ordering};

/// One direction of a portal pair.
///
/// A `Part<T>` is the shared ring for a single direction: the endpoint that
/// holds it as `remote` is its producer, the endpoint that holds it as
/// `local` is its consumer. Only the producer writes `write_count` and
/// buffer slots; only the consumer writes `read_count`, `event_slot`,
/// `msg_event_slot`, and `msg_id`. The producer-side batching cache
/// (`pending_write_count`) lives on `Endpoint` rather than here, since it is
/// private to whichever endpoint is producing and must survive independent
/// of this shared ring. Payloads are `Copy`, so slots never need
/// `MaybeUninit` or drop glue.
///
/// `write_count`, `read_count`, and `event_slot` each sit on their own
/// cache line via [`CacheAligned`]: the producer publishes `write_count`
/// and polls `event_slot` while the consumer publishes `read_count` and
/// arms `event_slot`, so packing any pair of these into one line would
/// have each side's hot store evict the other's hot load on every step.
#[repr(C)]
pub struct Part<T> {
    /// Total messages published since creation. Written only by the
    /// producer, via a release store at `flush` time.
    write_count: CacheAligned<AtomicU64>,
    /// Total messages consumed since creation. Written only by the
    /// consumer.
    read_count: CacheAligned<AtomicU64>,
    /// Non-owning pointer to the consumer's wake-up event, armed only when
    /// the consumer is about to block. Polled by the producer on every
    /// backpressure spin, armed/disarmed by the consumer around `wait`.
    event_slot: CacheAligned<AtomicPtr<Event>>,
    /// Non-owning pointer to the consumer's sync-reply event.
    msg_event_slot: AtomicPtr<Event>,
    /// Id of the currently awaited synchronous reply.
    msg_id: AtomicU64,
    config: Config,
    /// Fixed-capacity ring storage, zero-initialized at construction.
    /// `T: Copy + Default` lets every slot start valid, so reads never need
    /// `MaybeUninit`.
    buffer: UnsafeCell<Box<[T]>>,
}

// Safety: all mutable access to `buffer`/the atomics is mediated by the
// single-producer/single-consumer protocol documented on each method below.
unsafe impl<T: Send> Send for Part<T> {}
unsafe impl<T: Send> Sync for Part<T> {}

impl<T: Copy + Default> Part<T> {
    pub(crate) fn new(config: Config) -> Self {
        let buffer = vec![T::default(); config.capacity()].into_boxed_slice();

        Self {
            write_count: CacheAligned::new(AtomicU64::new(0)),
            read_count: CacheAligned::new(AtomicU64::new(0)),
            event_slot: CacheAligned::new(AtomicPtr::new(ptr::null_mut())),
            msg_event_slot: AtomicPtr::new(ptr::null_mut()),
            msg_id: AtomicU64::new(0),
            config,
            buffer: UnsafeCell::new(buffer),
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.config.capacity()
    }

    /// Whether this part was built under the single-core fence-elision
    /// toggle (see [`Config::uniprocessor`]).
    #[inline]
    pub(crate) fn uniprocessor(&self) -> bool {
        self.config.uniprocessor
    }

    #[inline]
    fn mask(&self) -> usize {
        self.config.mask()
    }

    // -------------------------------------------------------------------
    // Producer side (called by the endpoint holding this part as `remote`)
    // -------------------------------------------------------------------

    /// Relaxed load of `read_count`: stale values only under-estimate free
    /// space and cause an extra backpressure yield, never corruption.
    #[inline]
    pub(crate) fn load_read_count_relaxed(&self) -> u64 {
        self.read_count.load(Ordering::Relaxed)
    }

    /// Relaxed load of `write_count`, used by the producer to tell whether
    /// its own unpublished batch (`pending_write_count`) differs from what
    /// it last published — never read by anyone but the single producer.
    #[inline]
    pub(crate) fn write_count_relaxed(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    /// Stores `msg` into the slot `index` addresses, with no ordering of
    /// its own — visibility is established later, in one batch, by
    /// [`Part::commit_write`]'s release store.
    ///
    /// # Safety invariant
    /// The caller (the producer) must only call this for indices it has
    /// reserved via its own `pending_write_count` bookkeeping, and must not
    /// call it concurrently with another producer — upheld by `Endpoint`
    /// owning the only producer handle to this part.
    pub(crate) fn write_slot(&self, index: u64, msg: T) {
        let idx = (index as usize) & self.mask();
        // SAFETY: only one producer ever calls this, and only for slots at
        // or beyond the last published `write_count`; the consumer will not
        // read past `write_count` until this producer's next
        // `commit_write` makes the new range visible.
        unsafe {
            (*self.buffer.get())[idx] = msg;
        }
    }

    /// Publishes `new_write_count`, making every slot up to it visible to
    /// the consumer.
    pub(crate) fn commit_write(&self, new_write_count: u64) {
        let read_count = self.read_count.load(Ordering::Relaxed);
        debug_assert_bounded_count!(
            new_write_count.wrapping_sub(read_count),
            self.capacity() as u64
        );
        let old_write_count = self.write_count.load(Ordering::Relaxed);
        debug_assert_monotonic!("write_count", old_write_count, new_write_count);

        self.write_count.store(new_write_count, Ordering::Release);
    }

    /// Acquire load of the armed wake-up event, if any. Ordered after the
    /// relaxed `read_count` load above so a producer that observes no armed
    /// event never misses one that was armed concurrently with the ring
    /// going full.
    #[inline]
    pub(crate) fn armed_event(&self) -> Option<&Event> {
        let ptr = self.event_slot.load(Ordering::Acquire);
        // SAFETY: non-null only while the arming endpoint's own `Arc<Event>`
        // clone is alive, which is for at least the lifetime of the portal
        // pair.
        unsafe { ptr.as_ref() }
    }

    /// Acquire load of the armed sync-reply event and the id it awaits.
    pub(crate) fn armed_msg_event(&self) -> Option<(&Event, u64)> {
        let ptr = self.msg_event_slot.load(Ordering::Acquire);
        let id = self.msg_id.load(Ordering::Acquire);
        // SAFETY: see `armed_event`.
        unsafe { ptr.as_ref() }.map(|event| (event, id))
    }

    // -------------------------------------------------------------------
    // Consumer side (called by the endpoint holding this part as `local`)
    // -------------------------------------------------------------------

    /// Returns `true` if there are messages to consume. Used by
    /// `notify`/`wait` to decide whether a wake-up is warranted.
    #[inline]
    pub(crate) fn has_pending(&self) -> bool {
        self.read_count.load(Ordering::Relaxed) != self.write_count.load(Ordering::Acquire)
    }

    /// Zero-copy peek: returns the number of contiguous messages available
    /// and a borrow into the ring covering them.
    pub(crate) fn pending(&self) -> (usize, &[T]) {
        let read_count = self.read_count.load(Ordering::Relaxed);
        let write_count = self.write_count.load(Ordering::Acquire);
        let available = write_count.wrapping_sub(read_count) as usize;

        if available == 0 {
            return (0, &[]);
        }

        let offset = (read_count as usize) & self.mask();
        let contiguous = available.min(self.capacity() - offset);

        // SAFETY: slots in [read_count, write_count) were published by the
        // producer's release store above, which this Acquire load
        // synchronizes with; only the consumer reads these slots.
        let buf: &[T] = unsafe { &*self.buffer.get() };
        (contiguous, &buf[offset..offset + contiguous])
    }

    /// Publishes consumption of `n` messages, returning those slots to the
    /// producer for reuse.
    pub(crate) fn advance_read(&self, n: u64) {
        let read_count = self.read_count.load(Ordering::Relaxed);
        let new_read_count = read_count.wrapping_add(n);
        let write_count = self.write_count.load(Ordering::Relaxed);
        debug_assert_read_not_past_write!(new_read_count, write_count);
        debug_assert_monotonic!("read_count", read_count, new_read_count);

        // Release, not acquire: the consumer's reads of the buffer slots
        // must complete before the producer can observe these slots as free
        // to reuse.
        self.read_count.store(new_read_count, Ordering::Release);
    }

    /// Arms this part's event slot, pointing at the consumer's own event.
    /// The arm step of `wait`'s arm-then-recheck protocol.
    pub(crate) fn arm_event(&self, event: &Event) {
        self.event_slot
            .store(ptr::from_ref(event).cast_mut(), Ordering::Release);
    }

    /// Disarms this part's event slot.
    pub(crate) fn disarm_event(&self) {
        self.event_slot.store(ptr::null_mut(), Ordering::Release);
    }

    /// Arms the sync-reply slot with `event` and the awaited `msg_id`.
    pub(crate) fn arm_msg_event(&self, event: &Event, msg_id: u64) {
        self.msg_id.store(msg_id, Ordering::Release);
        self.msg_event_slot
            .store(ptr::from_ref(event).cast_mut(), Ordering::Release);
    }

    /// Disarms the sync-reply slot.
    pub(crate) fn disarm_msg_event(&self) {
        self.msg_event_slot.store(ptr::null_mut(), Ordering::Release);
    }
}

// ---------------------------------------------------------------------
// HELPER: 128-byte cache-aligned wrapper
// ---------------------------------------------------------------------

/// Wrapper type that ensures 128-byte alignment to prevent prefetcher-induced
/// false sharing on Intel/AMD CPUs (which may prefetch adjacent cache lines).
#[repr(align(128))]
struct CacheAligned<T> {
    value: T,
}

impl<T> CacheAligned<T> {
    const fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T> std::ops::Deref for CacheAligned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}
