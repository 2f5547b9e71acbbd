mod error;
pub mod keys;
mod kv;
mod redb_store;
mod store;

pub use error::*;
pub use kv::{KeyValueStore, KvOp, MemoryKeyValueStore};
pub use redb_store::RedbKeyValueStore;
pub use store::{IntegrityError, OtpScratch, PersistentStore, StoredSession};
