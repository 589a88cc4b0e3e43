/// The fixed-size payload the channel carries.
///
/// Four machine words: 128 bits on 32-bit targets, 256 bits on 64-bit
/// targets. The channel treats `Message` as opaque POD — it never inspects
/// the words and never owns anything a word might, in some other layer, be
/// interpreted as pointing to.
///
/// `align(16)` leaves a 16-byte vector load/store available to a future
/// implementation without requiring one; the default copy path is a plain
/// `Copy` move.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Message {
    pub data: [usize; 4],
}

impl Message {
    /// Builds a message from four words.
    #[inline]
    #[must_use]
    pub const fn new(data: [usize; 4]) -> Self {
        Self { data }
    }
}

impl From<[usize; 4]> for Message {
    fn from(data: [usize; 4]) -> Self {
        Self::new(data)
    }
}
