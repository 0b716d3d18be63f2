use crate::error::{Result, SyllabusSplitterError};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Keyed storage bridging an upload request to later download requests.
pub trait ResultStore: Send + Sync {
    /// Stores the files of one processed document and returns its identifier.
    fn insert(&self, files: Vec<(String, Vec<u8>)>) -> String;

    fn get_file(&self, id: &str, filename: &str) -> Result<Vec<u8>>;

    /// All files of a result, in document order.
    fn get_all(&self, id: &str) -> Result<Vec<(String, Vec<u8>)>>;
}

struct StoredResult {
    files: Vec<(String, Vec<u8>)>,
    created_at: Instant,
}

/// In-process store. Entries expire after `ttl`; once `max_entries` is
/// reached the oldest entry is evicted to make room.
pub struct MemoryResultStore {
    entries: Mutex<HashMap<String, StoredResult>>,
    ttl: Duration,
    max_entries: usize,
}

impl MemoryResultStore {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn len(&self) -> usize {
        let mut entries = self.lock();
        self.evict_expired(&mut entries);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredResult>> {
        // A poisoned map is still structurally valid
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn evict_expired(&self, entries: &mut HashMap<String, StoredResult>) {
        let before = entries.len();
        entries.retain(|_, stored| stored.created_at.elapsed() < self.ttl);
        if entries.len() < before {
            debug!("Evicted {} expired results", before - entries.len());
        }
    }

    fn with_entry<T>(&self, id: &str, f: impl FnOnce(&StoredResult) -> Result<T>) -> Result<T> {
        let mut entries = self.lock();
        self.evict_expired(&mut entries);
        match entries.get(id) {
            Some(stored) => f(stored),
            None => Err(SyllabusSplitterError::UnknownResult { id: id.to_string() }),
        }
    }
}

impl ResultStore for MemoryResultStore {
    fn insert(&self, files: Vec<(String, Vec<u8>)>) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let mut entries = self.lock();
        self.evict_expired(&mut entries);

        while entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, stored)| stored.created_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    debug!("Store full, evicting result {}", key);
                    entries.remove(&key);
                }
                None => break,
            }
        }

        entries.insert(
            id.clone(),
            StoredResult {
                files,
                created_at: Instant::now(),
            },
        );
        id
    }

    fn get_file(&self, id: &str, filename: &str) -> Result<Vec<u8>> {
        self.with_entry(id, |stored| {
            stored
                .files
                .iter()
                .find(|(name, _)| name == filename)
                .map(|(_, bytes)| bytes.clone())
                .ok_or_else(|| SyllabusSplitterError::UnknownFile {
                    id: id.to_string(),
                    filename: filename.to_string(),
                })
        })
    }

    fn get_all(&self, id: &str) -> Result<Vec<(String, Vec<u8>)>> {
        self.with_entry(id, |stored| Ok(stored.files.clone()))
    }
}
