//! Per-hash reader/writer locks
//!
//! Entries exist only while some task holds or waits for the lock and are
//! dropped with the last guard.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

#[derive(Default)]
pub(crate) struct HashLocks {
    locks: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

/// Held lock on one hash. Releases and prunes the table entry on drop.
pub(crate) struct HashGuard<'a, G> {
    table: &'a HashLocks,
    hash: String,
    guard: Option<G>,
}

impl HashLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, hash: &str) -> Arc<RwLock<()>> {
        self.locks
            .lock()
            .entry(hash.to_string())
            .or_default()
            .clone()
    }

    /// Shared access, for readers of `hash`
    pub(crate) async fn read(&self, hash: &str) -> HashGuard<'_, OwnedRwLockReadGuard<()>> {
        let guard = self.lock_for(hash).read_owned().await;
        HashGuard {
            table: self,
            hash: hash.to_string(),
            guard: Some(guard),
        }
    }

    /// Exclusive access, for anything that mutates `hash`
    pub(crate) async fn write(&self, hash: &str) -> HashGuard<'_, OwnedRwLockWriteGuard<()>> {
        let guard = self.lock_for(hash).write_owned().await;
        HashGuard {
            table: self,
            hash: hash.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of hashes with a live lock entry
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.lock().len()
    }
}

impl<G> Drop for HashGuard<'_, G> {
    fn drop(&mut self) {
        self.guard.take();

        // Only the table holds the Arc once every guard and waiter is gone
        let mut locks = self.table.locks.lock();
        if locks
            .get(&self.hash)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.hash);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_entries_pruned_after_release() {
        let locks = HashLocks::new();
        {
            let _a = locks.read("a").await;
            let _b = locks.read("a").await;
            let _c = locks.write("c").await;
            assert_eq!(locks.len(), 2);
        }
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_writer_excludes_readers() {
        let locks = Arc::new(HashLocks::new());
        let guard = locks.write("h").await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.read("h").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_distinct_hashes_do_not_block() {
        let locks = HashLocks::new();
        let _a = locks.write("a").await;
        let _b = locks.write("b").await;
        assert_eq!(locks.len(), 2);
    }
}
