use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::StorageError;

/// One mutation inside an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvOp {
    Put(&'static str, String),
    Remove(&'static str),
}

/// Durable string-keyed storage with synchronous access.
///
/// `commit` applies every op or none of them; readers never observe half a
/// batch.
pub trait KeyValueStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn commit(&self, ops: &[KvOp]) -> Result<(), StorageError>;
}

/// Process-local backend for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries
            .lock()
            .expect("memory store lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .lock()
            .expect("memory store lock poisoned")
            .get(key)
            .cloned())
    }

    fn commit(&self, ops: &[KvOp]) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().expect("memory store lock poisoned");
        for op in ops {
            match op {
                KvOp::Put(key, value) => {
                    entries.insert((*key).to_string(), value.clone());
                }
                KvOp::Remove(key) => {
                    entries.remove(*key);
                }
            }
        }
        Ok(())
    }
}
