//! Shared work queue for upload workers

use crate::domain::LedgerEntry;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// FIFO of entries waiting for a worker
///
/// Each entry is handed to exactly one worker. Workers exit when
/// [`UploadQueue::try_pop`] returns `None`.
pub struct UploadQueue {
    items: Mutex<VecDeque<LedgerEntry>>,
}

impl UploadQueue {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    pub async fn push(&self, entry: LedgerEntry) {
        self.items.lock().await.push_back(entry);
    }

    /// Take the next entry without waiting for more to arrive
    pub async fn try_pop(&self) -> Option<LedgerEntry> {
        self.items.lock().await.pop_front()
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }
}

impl Default for UploadQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<LedgerEntry> for UploadQueue {
    fn from_iter<I: IntoIterator<Item = LedgerEntry>>(iter: I) -> Self {
        Self {
            items: Mutex::new(iter.into_iter().collect()),
        }
    }
}
