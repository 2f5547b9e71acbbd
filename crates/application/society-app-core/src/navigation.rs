use society_core::routes::{default_route, is_reachable};
use society_persistence::{PersistentStore, StorageError};
use tracing::{debug, info};

use crate::app_core::{Action, NavigationAction};
use crate::kernel::AppKernel;

/// Keeps `lastActivePath` and `tabOpenStates` in step with the store.
pub struct NavigationPersister {
    storage: PersistentStore,
    restored: bool,
}

impl NavigationPersister {
    pub fn new(storage: PersistentStore) -> Self {
        Self {
            storage,
            restored: false,
        }
    }

    /// Loads the persisted menus and last path into the store.
    pub fn hydrate(&mut self, kernel: &mut AppKernel) -> Result<(), StorageError> {
        let nav = self.storage.load_navigation()?;
        kernel.dispatch(Action::Navigation(NavigationAction::Restored(nav)));
        Ok(())
    }

    /// First mount after sign-in: picks the screen to open, at most once per
    /// session. A persisted path the roles can no longer reach is replaced by
    /// the role default and overwritten.
    pub fn restore_once(
        &mut self,
        kernel: &mut AppKernel,
    ) -> Result<Option<String>, StorageError> {
        if self.restored {
            return Ok(None);
        }
        let Some(roles) = kernel.store().select(|s| {
            s.session
                .user
                .as_ref()
                .filter(|_| s.session.is_authenticated())
                .map(|u| u.roles.clone())
        }) else {
            return Ok(None);
        };
        self.restored = true;

        let persisted = self.storage.load_navigation()?.active_path;
        let target = match persisted {
            Some(path) if is_reachable(&path, &roles) => path,
            Some(path) => {
                info!("persisted path {path} is not reachable any more");
                default_route(&roles).to_string()
            }
            None => default_route(&roles).to_string(),
        };
        self.record_route(kernel, &target)?;
        Ok(Some(target))
    }

    /// Applies a successful route change and writes it through.
    pub fn record_route(&mut self, kernel: &mut AppKernel, path: &str) -> Result<(), StorageError> {
        kernel.dispatch(Action::Navigation(NavigationAction::RouteChanged(
            path.to_string(),
        )));
        self.persist(kernel)
    }

    pub fn toggle_menu(
        &mut self,
        kernel: &mut AppKernel,
        group: &str,
    ) -> Result<bool, StorageError> {
        kernel.dispatch(Action::Navigation(NavigationAction::MenuToggled(
            group.to_string(),
        )));
        self.persist(kernel)?;
        Ok(kernel.store().select(|s| s.navigation.is_expanded(group)))
    }

    fn persist(&self, kernel: &AppKernel) -> Result<(), StorageError> {
        let nav = kernel.store().select(|s| s.navigation.clone());
        debug!("persisting navigation at {:?}", nav.active_path);
        self.storage.save_navigation(&nav)
    }

    /// Arms the one-time restore again, for the next sign-in.
    pub fn reset(&mut self) {
        self.restored = false;
    }
}
