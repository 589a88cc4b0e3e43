/// Configuration for a [`crate::PortalPair`] and the [`crate::Part`] rings it allocates.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Ring buffer size as a power of 2 (default: 9 = 512 slots).
    pub ring_bits: u8,
    /// Enable metrics collection (slight overhead).
    pub enable_metrics: bool,
    /// Single-core build toggle: elide the hardware memory fences this
    /// crate otherwise issues around counter publication, keeping only the
    /// compiler reorder barrier, and publish `write_count` on every `write`
    /// instead of batching it behind `pending_write_count`. Only sound when
    /// both endpoints are guaranteed to run on the same core and never
    /// migrate — leave this `false` on any multi-core target.
    pub uniprocessor: bool,
}

impl Config {
    /// Creates a new configuration with custom settings.
    ///
    /// # Panics
    ///
    /// Panics if `ring_bits` is 0 or greater than 20 (1M slots max), to keep
    /// the power-of-two capacity invariant meaningful and bound memory use.
    pub const fn new(ring_bits: u8, enable_metrics: bool) -> Self {
        assert!(
            ring_bits > 0 && ring_bits <= 20,
            "ring_bits must be between 1 and 20 (max 1M slots)"
        );

        Self {
            ring_bits,
            enable_metrics,
            uniprocessor: false,
        }
    }

    /// Opts into the single-core fence-elision/no-batching build toggle
    /// described on [`Config::uniprocessor`]. Consuming builder method so
    /// call sites read `Config::new(bits, metrics).uniprocessor()`.
    #[must_use]
    pub const fn uniprocessor(mut self) -> Self {
        self.uniprocessor = true;
        self
    }

    /// Returns the capacity of the ring buffer. Always a power of two.
    #[inline]
    pub const fn capacity(&self) -> usize {
        1 << self.ring_bits
    }

    /// Returns the mask used to wrap a monotonic count into a buffer index.
    #[inline]
    pub const fn mask(&self) -> usize {
        self.capacity() - 1
    }
}

impl Default for Config {
    fn default() -> Self {
        // 512 slots: fits comfortably in L2 while absorbing a healthy
        // producer/consumer scheduling jitter.
        Self {
            ring_bits: 9,
            enable_metrics: false,
            uniprocessor: false,
        }
    }
}

/// Low latency configuration (64 slots, fits comfortably in L1 cache).
pub const LOW_LATENCY_CONFIG: Config = Config::new(6, false);

/// High throughput configuration (64K slots, amortizes backpressure further).
pub const HIGH_THROUGHPUT_CONFIG: Config = Config::new(16, false);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_512_slots() {
        let config = Config::default();
        assert_eq!(config.capacity(), 512);
        assert_eq!(config.mask(), 511);
    }

    #[test]
    fn capacity_is_always_power_of_two() {
        for bits in 1..=20u8 {
            let config = Config::new(bits, false);
            assert_eq!(config.capacity() & (config.capacity() - 1), 0);
            assert_eq!(config.mask(), config.capacity() - 1);
        }
    }

    #[test]
    #[should_panic(expected = "ring_bits must be between 1 and 20")]
    fn rejects_zero_bits() {
        let _ = Config::new(0, false);
    }

    #[test]
    #[should_panic(expected = "ring_bits must be between 1 and 20")]
    fn rejects_oversized_bits() {
        let _ = Config::new(21, false);
    }

    #[test]
    fn presets_are_sane() {
        assert_eq!(LOW_LATENCY_CONFIG.capacity(), 64);
        assert_eq!(HIGH_THROUGHPUT_CONFIG.capacity(), 65536);
    }

    #[test]
    fn uniprocessor_defaults_off_and_is_opt_in() {
        assert!(!Config::default().uniprocessor);
        assert!(!Config::new(9, false).uniprocessor);
        assert!(Config::new(9, false).uniprocessor().uniprocessor);
    }

    proptest::proptest! {
        #[test]
        fn mask_is_always_capacity_minus_one(bits in 1u8..=20) {
            let config = Config::new(bits, false);
            proptest::prop_assert_eq!(config.mask(), config.capacity() - 1);
        }

        #[test]
        fn any_count_wraps_into_bounds(bits in 1u8..=20, count in 0u64..=u64::MAX) {
            let config = Config::new(bits, false);
            let index = (count as usize) & config.mask();
            proptest::prop_assert!(index < config.capacity());
        }
    }
}
