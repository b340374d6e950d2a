use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// A map of lazily-created async mutexes, one per key.
///
/// Intake uses this keyed by phone number so that two concurrent submissions
/// from the same phone serialize their customer find-or-create instead of
/// racing the UNIQUE constraint. Unrelated keys never contend.
pub struct MutexSwapper<T: Eq + Hash> {
    state: Mutex<HashMap<T, Arc<Mutex<()>>>>,
}

impl<T: Eq + Hash + Clone> MutexSwapper<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the lock for `key`. The returned guard releases on drop.
    pub async fn lock(&self, key: T) -> OwnedMutexGuard<()> {
        let per_key = {
            let mut state = self.state.lock().await;
            state
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        per_key.lock_owned().await
    }
}

impl<T: Eq + Hash + Clone> Default for MutexSwapper<T> {
    fn default() -> Self {
        Self::new()
    }
}
