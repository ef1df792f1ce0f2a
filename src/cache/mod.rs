//! Response cache with a time-to-live
//!
//! [`TtlCache`] stores JSON payloads in a [`Storage`] backend (files under the
//! XDG cache directory, or memory) and treats entries older than the TTL as
//! absent. Cache faults are logged and never reach callers.

mod manager;
mod storage;

pub use manager::{CacheEntry, CacheProvider, Clock, SystemClock, TtlCache};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};

#[cfg(test)]
pub(crate) use manager::tests::ManualClock;
