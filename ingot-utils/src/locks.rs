//! Lock aliases used across the workspace.
//!
//! Everything in the tick path is synchronous, so these are plain `parking_lot` locks.

/// A synchronous mutex.
pub type SyncMutex<T> = parking_lot::Mutex<T>;
/// A guard for [`SyncMutex`].
pub type SyncMutexGuard<'a, T> = parking_lot::MutexGuard<'a, T>;
/// A synchronous reader-writer lock.
pub type SyncRwLock<T> = parking_lot::RwLock<T>;
