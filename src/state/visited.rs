use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

/// Set of canonical URLs that some traversal branch has claimed for fetching
///
/// `try_claim` is an atomic check-and-insert, so exactly one of any number of concurrent
/// callers for the same URL wins the right to fetch it.
#[derive(Debug, Default)]
pub struct VisitedSet {
    claimed: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `url` for fetching
    ///
    /// Returns true if the URL was unclaimed (the caller must fetch it), false if another
    /// branch already claimed it.
    pub fn try_claim(&self, url: &str) -> bool {
        let mut claimed = self.lock();
        if claimed.contains(url) {
            return false;
        }
        claimed.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Consumes the set, returning the claimed URLs
    pub fn into_inner(self) -> HashSet<String> {
        self.claimed
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // No code path panics while holding the lock; recover the set if one ever does.
        self.claimed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
