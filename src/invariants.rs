//! Debug assertion macros for the ring buffer's core invariants.
//!
//! These are runtime checks, active only in debug builds (`debug_assert!`),
//! so there is zero overhead in release builds. Used by [`crate::part::Part`]
//! and [`crate::portal::Endpoint`].

// =============================================================================
// Bounded count
// =============================================================================

/// Assert that occupancy does not exceed capacity.
///
/// **Invariant**: `0 ≤ write_count − read_count ≤ capacity`.
///
/// Used in: `Part::commit_write` after computing the new `write_count`.
macro_rules! debug_assert_bounded_count {
    ($count:expr, $capacity:expr) => {
        debug_assert!(
            $count <= $capacity,
            "occupancy {} exceeds capacity {}",
            $count,
            $capacity
        )
    };
}

/// Assert that `read_count` does not advance past `write_count`.
///
/// Used in: `Part::advance_read` before updating `read_count`.
macro_rules! debug_assert_read_not_past_write {
    ($new_read_count:expr, $write_count:expr) => {
        debug_assert!(
            $new_read_count <= $write_count,
            "advancing read_count {} beyond write_count {}",
            $new_read_count,
            $write_count
        )
    };
}

// =============================================================================
// Monotonic progress
// =============================================================================

/// Assert that a counter only increases.
///
/// **Invariant**: a published count never moves backward.
///
/// Used in: `Part::commit_write` for `write_count`, `Part::advance_read` for
/// `read_count`.
macro_rules! debug_assert_monotonic {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "{} decreased from {} to {}",
            $name,
            $old,
            $new
        )
    };
}

// =============================================================================
// read(n) never commits more than the preceding pending() reported.
// =============================================================================

/// Assert that a `read(n)` call is consistent with the last `pending()`.
///
/// **Invariant**: `read(n)` is never called with `n` greater than the count
/// the immediately preceding `pending()` reported.
///
/// Used in: `Endpoint::read`.
macro_rules! debug_assert_read_not_past_pending {
    ($n:expr, $pending:expr) => {
        debug_assert!(
            $n <= $pending,
            "read({}) exceeds the {} messages the last pending() returned",
            $n,
            $pending
        )
    };
}

// =============================================================================
// pending_write_count never falls behind the ring's published write_count.
// =============================================================================

/// Assert the producer's unpublished batch never goes negative.
///
/// **Invariant**: `pending_write_count ≥ remote.write_count`.
///
/// Used in: `Endpoint::write` and `Endpoint::flush`.
macro_rules! debug_assert_shadow_ahead {
    ($pending_write_count:expr, $write_count:expr) => {
        debug_assert!(
            $pending_write_count >= $write_count,
            "pending_write_count {} behind published write_count {}",
            $pending_write_count,
            $write_count
        )
    };
}

// =============================================================================
// Re-exports for crate-internal use
// =============================================================================

pub(crate) use debug_assert_bounded_count;
pub(crate) use debug_assert_monotonic;
pub(crate) use debug_assert_read_not_past_pending;
pub(crate) use debug_assert_read_not_past_write;
pub(crate) use debug_assert_shadow_ahead;
