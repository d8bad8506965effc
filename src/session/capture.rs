use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Entries {
    order: Vec<String>,
    seen: HashSet<String>,
}

/// Append-only log of URLs observed by network interception.
///
/// Cloned handles share the same log. Readers take a snapshot; entries are
/// never removed while the session lives.
#[derive(Debug, Clone, Default)]
pub struct CaptureLog {
    inner: Arc<Mutex<Entries>>,
}

impl CaptureLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Entries> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record `url`. Returns false when it was already present.
    pub fn record(&self, url: &str) -> bool {
        let mut entries = self.entries();
        if !entries.seen.insert(url.to_string()) {
            return false;
        }
        entries.order.push(url.to_string());
        true
    }

    /// Captured URLs in first-seen order.
    pub fn snapshot(&self) -> Vec<String> {
        self.entries().order.clone()
    }

    pub fn len(&self) -> usize {
        self.entries().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
