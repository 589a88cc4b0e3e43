use thiserror::Error;

/// Recoverable misuse conditions this crate chooses to surface as `Result`
/// rather than leave as pure debug-assert UB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PortalError {
    /// `read(n)` was called with `n` greater than the count the immediately
    /// preceding `pending()` returned.
    #[error("read({requested}) exceeds the {available} messages the last pending() returned")]
    ReadPastPending { requested: usize, available: usize },

    /// `sync_query` was called while a previous `sync_query` on the same
    /// endpoint has not yet returned — at most one outstanding query is
    /// allowed per direction.
    #[error("sync_query called re-entrantly on the same endpoint")]
    ReentrantSyncQuery,
}
