use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use society_core::{Profile, ProfilePatch, Tenant};
use society_infra::{default_http_client, HttpGateway};
use society_persistence::{PersistentStore, StorageErrorKind};
use tokio::runtime::Handle;
use tracing::info;

use crate::app_core::{Action, ActionFamily, Store};
use crate::domain::RootState;
use crate::guard;
use crate::kernel::AppKernel;
use crate::navigation::NavigationPersister;
use crate::ports::ApiGateway;
use crate::session::{ResendCooldown, SessionError, SessionManager};
use crate::settings::ConsoleSettings;

/// The console as a whole: kernel plus the session and navigation layers
/// that consume its state.
pub struct ConsoleApp {
    kernel: AppKernel,
    session: SessionManager,
    navigation: NavigationPersister,
}

impl ConsoleApp {
    pub fn new(storage: PersistentStore, gateway: Arc<dyn ApiGateway>, handle: Handle) -> Self {
        Self {
            kernel: AppKernel::new(Store::default(), gateway.clone(), handle),
            session: SessionManager::new(storage.clone(), gateway),
            navigation: NavigationPersister::new(storage),
        }
    }

    /// Opens the on-disk store and the HTTP gateway described by `settings`.
    pub fn from_settings(settings: &ConsoleSettings, handle: Handle) -> Result<Self> {
        let store_path = settings.store_path()?;
        let storage = match PersistentStore::open(&store_path) {
            Ok(storage) => storage,
            Err(e) if e.kind() == StorageErrorKind::Busy => {
                anyhow::bail!("Console store {store_path} is in use by another console")
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to open console store at {store_path}"))
            }
        };
        let client = default_http_client().context("Failed to build HTTP client")?;
        let gateway = HttpGateway::new(client, settings.api_base_url.clone());
        info!("using API at {}", gateway.base_url());
        Ok(Self::new(storage, Arc::new(gateway), handle))
    }

    pub fn with_cooldown(mut self, cooldown: ResendCooldown) -> Self {
        self.session = self.session.with_cooldown(cooldown);
        self
    }

    /// Rehydrates session, OTP flow and navigation from storage.
    pub fn boot(&mut self) -> Result<()> {
        self.session
            .restore(&mut self.kernel)
            .context("Failed to restore session")?;
        self.navigation
            .hydrate(&mut self.kernel)
            .context("Failed to restore navigation")?;
        Ok(())
    }

    pub fn state(&self) -> RootState {
        self.kernel.state()
    }

    pub fn kernel(&mut self) -> &mut AppKernel {
        &mut self.kernel
    }

    pub fn dispatch(&mut self, action: Action) {
        self.kernel.dispatch(action);
    }

    /// Applies arrived completions and finishes a verified login.
    pub fn pump(&mut self) -> Result<usize> {
        let applied = self.kernel.tick();
        self.session.reconcile(&mut self.kernel)?;
        Ok(applied)
    }

    /// Waits for `family` to resolve, then reconciles the session.
    pub async fn settle(&mut self, family: ActionFamily) -> Result<()> {
        self.kernel.settle_family(family).await;
        self.session.reconcile(&mut self.kernel)?;
        Ok(())
    }

    pub async fn settle_all(&mut self) -> Result<()> {
        self.kernel.settle().await;
        self.session.reconcile(&mut self.kernel)?;
        Ok(())
    }

    // --- session ---

    pub fn request_otp(&mut self, phone: &str, tenant: Tenant) -> Result<(), SessionError> {
        self.session.submit_phone(&mut self.kernel, phone, tenant)
    }

    pub fn submit_otp(&mut self, code: &str) -> Result<(), SessionError> {
        self.session.submit_otp(&mut self.kernel, code)
    }

    pub fn resend_otp(&mut self) -> Result<(), SessionError> {
        self.session.resend_otp(&mut self.kernel)
    }

    pub fn resend_remaining(&self) -> Duration {
        self.session.resend_remaining()
    }

    pub fn abandon_otp(&mut self) -> Result<(), SessionError> {
        self.session.abandon_otp(&mut self.kernel)
    }

    pub fn login(&mut self, profile: Profile, token: &str) -> Result<(), SessionError> {
        self.session.login(&mut self.kernel, profile, token)
    }

    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.session.logout(&mut self.kernel)?;
        self.navigation.reset();
        Ok(())
    }

    pub fn update_profile(&mut self, patch: ProfilePatch) -> Result<Profile, SessionError> {
        self.session.update_profile(&mut self.kernel, patch)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated(&self.kernel)
    }

    pub fn current_user(&self) -> Option<Profile> {
        self.session.current_user(&self.kernel)
    }

    // --- routing ---

    /// First mount after sign-in. `None` when already restored or signed out.
    pub fn mount(&mut self) -> Result<Option<String>> {
        Ok(self.navigation.restore_once(&mut self.kernel)?)
    }

    /// Runs the guard for `raw_path` and records the screen that renders.
    /// Only private screens are persisted.
    pub fn navigate(&mut self, raw_path: &str) -> Result<String> {
        let session = self.kernel.store().select(|s| s.session.clone());
        let path = guard::resolve(&session, raw_path);
        if session.is_authenticated() {
            self.navigation.record_route(&mut self.kernel, &path)?;
        }
        Ok(path)
    }

    pub fn toggle_menu(&mut self, group: &str) -> Result<bool> {
        Ok(self.navigation.toggle_menu(&mut self.kernel, group)?)
    }

    pub fn shutdown(&mut self) {
        self.kernel.shutdown();
    }
}
