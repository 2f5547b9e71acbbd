use std::sync::{Arc, Mutex};

use crate::domain::RootState;

use super::{actions::Action, reducer::reduce};

/// Single owner of the console state. Only `apply` mutates it.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<Mutex<RootState>>,
}

impl Store {
    pub fn new(state: RootState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn state(&self) -> RootState {
        self.inner.lock().expect("store lock poisoned").clone()
    }

    /// Reads a projection without cloning the whole tree.
    pub fn select<R>(&self, f: impl FnOnce(&RootState) -> R) -> R {
        let guard = self.inner.lock().expect("store lock poisoned");
        f(&guard)
    }

    pub fn apply(&self, action: &Action) {
        let mut guard = self.inner.lock().expect("store lock poisoned");
        let next = reduce(std::mem::take(&mut *guard), action);
        *guard = next;
    }
}
