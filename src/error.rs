//! Error types for keyed-store

use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while operating on a [`KeyedStore`](crate::KeyedStore)
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// The store was torn down with `destroy(Destroy::Store)`
    ///
    /// Destruction is terminal. Every later call on the store, or on any
    /// clone of its handle, reports this error instead of touching the
    /// released state.
    #[error("store has been destroyed")]
    Destroyed,

    /// A mutation ran while a `get_all()` borrow was still alive
    ///
    /// Drop the borrow returned by `get_all()` before writing to the store.
    #[error("store state is borrowed by a live get_all() reference")]
    Borrowed,
}
