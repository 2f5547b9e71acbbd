use std::sync::atomic::{AtomicU64, Ordering};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use redb::{Database, TableDefinition};

use crate::{KeyValueStore, KvOp, StorageError};

const ENTRIES: TableDefinition<&str, &str> = TableDefinition::new("entries");

/// File-backed store; one redb database holding a single string table.
pub struct RedbKeyValueStore {
    path: Utf8PathBuf,
    db: Database,
}

impl RedbKeyValueStore {
    fn is_corrupt_open_error(err: &redb::DatabaseError) -> bool {
        match err {
            redb::DatabaseError::Storage(storage) => match storage {
                redb::StorageError::Corrupted(_) => true,
                redb::StorageError::Io(ioe) => matches!(
                    ioe.kind(),
                    std::io::ErrorKind::InvalidData | std::io::ErrorKind::UnexpectedEof
                ),
                _ => false,
            },
            _ => false,
        }
    }

    /// Opens the store at `path`, creating it when missing. A corrupt file is
    /// moved aside and replaced by an empty store.
    pub fn open(path: &Utf8Path) -> Result<Self, StorageError> {
        if path.file_name().is_none() {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = match Database::create(path.as_std_path()) {
            Ok(db) => db,
            Err(e) if Self::is_corrupt_open_error(&e) => {
                quarantine(path)?;
                Database::create(path.as_std_path())?
            }
            Err(e) => return Err(e.into()),
        };

        let write_tx = db.begin_write()?;
        {
            let _ = write_tx.open_table(ENTRIES)?;
        }
        write_tx.commit()?;

        Ok(Self {
            path: path.to_path_buf(),
            db,
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl KeyValueStore for RedbKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let read_tx = self.db.begin_read()?;
        let table = read_tx.open_table(ENTRIES)?;
        let value = table.get(key)?.map(|g| g.value().to_string());
        Ok(value)
    }

    fn commit(&self, ops: &[KvOp]) -> Result<(), StorageError> {
        let write_tx = self.db.begin_write()?;
        {
            let mut table = write_tx.open_table(ENTRIES)?;
            for op in ops {
                match op {
                    KvOp::Put(key, value) => {
                        table.insert(*key, value.as_str())?;
                    }
                    KvOp::Remove(key) => {
                        table.remove(*key)?;
                    }
                }
            }
        }
        write_tx.commit()?;
        Ok(())
    }
}

fn quarantine(path: &Utf8Path) -> std::io::Result<()> {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    if !path.exists() {
        return Ok(());
    }
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.f");
    let target = path.with_file_name(format!(
        "{}.corrupt.{stamp}.{}.{}",
        path.file_name().unwrap_or("console.redb"),
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    tracing::warn!("console store at {} is unreadable, moved to {}", path, target);
    std::fs::rename(path, &target)
}
