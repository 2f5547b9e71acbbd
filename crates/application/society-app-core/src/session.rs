//! Login lifecycle on top of the kernel.
//!
//! `Anonymous -> OtpPending -> Authenticated`. The store owns the phase; the
//! manager validates input, keeps persisted keys in step with it and pushes
//! the access token into the gateway.

use std::sync::Arc;
use std::time::Duration;

use society_core::{OtpCode, PhoneNumber, Profile, ProfilePatch, Tenant, ValidationError};
use chrono::Utc;
use society_persistence::{OtpScratch, PersistentStore, StorageError, StoredSession};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::app_core::{Action, SessionAction, SlicePhase, Status};
use crate::auth::VerifyOtpRequest;
use crate::kernel::AppKernel;
use crate::ports::ApiGateway;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("console storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error("Already signed in")]
    AlreadyAuthenticated,
    #[error("Not signed in")]
    NotAuthenticated,
    #[error("Request an OTP first")]
    NoPendingOtp,
    #[error("You can resend the OTP in {0}s")]
    ResendCoolingDown(u64),
    #[error("Profile has no id or no roles")]
    MalformedProfile,
}

/// Fixed countdown gating the resend affordance. Expiry changes no state.
#[derive(Debug, Clone)]
pub struct ResendCooldown {
    period: Duration,
    started: Option<Instant>,
}

impl ResendCooldown {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            started: None,
        }
    }

    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    pub fn clear(&mut self) {
        self.started = None;
    }

    /// Picks the countdown up `elapsed` after a send made by an earlier run.
    pub fn resume(&mut self, elapsed: Duration) {
        self.started = if elapsed >= self.period {
            None
        } else {
            Instant::now().checked_sub(elapsed)
        };
    }

    pub fn remaining(&self) -> Duration {
        match self.started {
            Some(at) => self.period.saturating_sub(at.elapsed()),
            None => Duration::ZERO,
        }
    }

    pub fn can_resend(&self) -> bool {
        self.remaining().is_zero()
    }
}

impl Default for ResendCooldown {
    fn default() -> Self {
        Self::new(society_config::resend_cooldown())
    }
}

pub struct SessionManager {
    storage: PersistentStore,
    gateway: Arc<dyn ApiGateway>,
    cooldown: ResendCooldown,
    token: Option<String>,
    /// A send was dispatched and its outcome is not persisted yet.
    send_unrecorded: bool,
}

impl SessionManager {
    pub fn new(storage: PersistentStore, gateway: Arc<dyn ApiGateway>) -> Self {
        Self {
            storage,
            gateway,
            cooldown: ResendCooldown::default(),
            token: None,
            send_unrecorded: false,
        }
    }

    pub fn with_cooldown(mut self, cooldown: ResendCooldown) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Rehydrates from persisted keys. A half-written or undecodable session
    /// is wiped and the console starts signed out.
    pub fn restore(&mut self, kernel: &mut AppKernel) -> Result<(), SessionError> {
        match self.storage.load_session()? {
            StoredSession::Valid { token, profile } => {
                info!("restored session for {}", profile.id);
                self.gateway.set_access_token(Some(token.clone()));
                self.token = Some(token);
                kernel.dispatch(Action::Session(SessionAction::Authenticated(profile)));
            }
            StoredSession::Broken(err) => {
                warn!("discarding persisted session: {err}");
                self.storage.clear_session()?;
                self.gateway.set_access_token(None);
            }
            StoredSession::Empty => {
                if let Some(scratch) = self.storage.load_otp_scratch()? {
                    info!("resuming OTP flow for {}", scratch.phone.masked());
                    if let Some(sent_at) = scratch.sent_at {
                        let elapsed = (Utc::now() - sent_at).to_std().unwrap_or_default();
                        self.cooldown.resume(elapsed);
                    }
                    kernel.dispatch(Action::Session(SessionAction::OtpFlowRestored {
                        phone: scratch.phone,
                        tenant: Tenant::from_building(scratch.building_id),
                    }));
                }
            }
        }
        Ok(())
    }

    /// Phase one. Nothing is dispatched unless the number is valid.
    pub fn submit_phone(
        &mut self,
        kernel: &mut AppKernel,
        raw_phone: &str,
        tenant: Tenant,
    ) -> Result<(), SessionError> {
        if kernel.store().select(|s| s.session.is_authenticated()) {
            return Err(SessionError::AlreadyAuthenticated);
        }
        let phone = PhoneNumber::parse(raw_phone)?;
        kernel.dispatch(Action::VerifyOtp(SlicePhase::Reset));
        kernel.dispatch(Action::send_otp(phone, tenant));
        self.send_unrecorded = true;
        self.cooldown.start();
        Ok(())
    }

    /// Phase two. Uses the phone number and tenant of the pending flow.
    pub fn submit_otp(
        &mut self,
        kernel: &mut AppKernel,
        raw_code: &str,
    ) -> Result<(), SessionError> {
        let (phone, tenant) = self.pending(kernel)?;
        let otp = OtpCode::parse(raw_code)?;
        kernel.dispatch(Action::verify_otp(VerifyOtpRequest { phone, otp, tenant }));
        Ok(())
    }

    pub fn resend_otp(&mut self, kernel: &mut AppKernel) -> Result<(), SessionError> {
        let (phone, tenant) = self.pending(kernel)?;
        if !self.cooldown.can_resend() {
            let secs = self.cooldown.remaining().as_secs_f64().ceil() as u64;
            return Err(SessionError::ResendCoolingDown(secs));
        }
        kernel.dispatch(Action::send_otp(phone, tenant));
        self.send_unrecorded = true;
        self.cooldown.start();
        Ok(())
    }

    pub fn resend_remaining(&self) -> Duration {
        self.cooldown.remaining()
    }

    /// Leaves the OTP screen: scratch keys and both auth slices are dropped.
    pub fn abandon_otp(&mut self, kernel: &mut AppKernel) -> Result<(), SessionError> {
        self.storage.clear_otp_scratch()?;
        kernel.dispatch(Action::SendOtp(SlicePhase::Reset));
        kernel.dispatch(Action::VerifyOtp(SlicePhase::Reset));
        kernel.dispatch(Action::Session(SessionAction::OtpFlowAbandoned));
        self.send_unrecorded = false;
        self.cooldown.clear();
        Ok(())
    }

    fn pending(&self, kernel: &AppKernel) -> Result<(PhoneNumber, Tenant), SessionError> {
        kernel.store().select(|s| {
            if s.session.is_authenticated() {
                return Err(SessionError::AlreadyAuthenticated);
            }
            s.session
                .pending_otp()
                .map(|(phone, tenant)| (phone.clone(), tenant.clone()))
                .ok_or(SessionError::NoPendingOtp)
        })
    }

    /// Persists the OTP scratch once a send lands, and finishes a login once
    /// the verify slice holds a result. Returns whether a login was completed.
    pub fn reconcile(&mut self, kernel: &mut AppKernel) -> Result<bool, SessionError> {
        self.record_send(kernel)?;

        let verified = kernel.store().select(|s| match s.verify_otp.status {
            Status::Complete => s.verify_otp.data.clone(),
            _ => None,
        });
        let Some(login) = verified else {
            return Ok(false);
        };
        if let Err(e) = self.login(kernel, login.profile, &login.token) {
            warn!("verified login could not be completed: {e}");
            kernel.dispatch(Action::VerifyOtp(SlicePhase::Reset));
            return Err(e);
        }
        Ok(true)
    }

    /// Only a send the backend accepted leaves scratch keys behind, so a
    /// restart never resumes a flow whose OTP was not sent.
    fn record_send(&mut self, kernel: &AppKernel) -> Result<(), SessionError> {
        if !self.send_unrecorded {
            return Ok(());
        }
        let (status, dispatched) = kernel
            .store()
            .select(|s| (s.send_otp.status, s.send_otp.data.clone()));
        match (status, dispatched) {
            (Status::Complete, Some(sent)) => {
                self.send_unrecorded = false;
                self.storage.save_otp_scratch(&OtpScratch {
                    phone: sent.phone,
                    building_id: sent.tenant.building_id().cloned(),
                    sent_at: Some(Utc::now()),
                })?;
            }
            (Status::Failed, _) | (Status::Idle, _) => self.send_unrecorded = false,
            _ => {}
        }
        Ok(())
    }

    /// Token and profile are written in one batch together with dropping the
    /// OTP scratch keys; the store only flips once that write succeeded.
    pub fn login(
        &mut self,
        kernel: &mut AppKernel,
        profile: Profile,
        token: &str,
    ) -> Result<(), SessionError> {
        if !profile.is_well_formed() || token.trim().is_empty() {
            return Err(SessionError::MalformedProfile);
        }
        self.storage.complete_login(token, &profile)?;
        self.gateway.set_access_token(Some(token.to_string()));
        self.token = Some(token.to_string());

        info!("signed in as {} ({:?})", profile.id, profile.roles);
        kernel.dispatch(Action::Session(SessionAction::Authenticated(profile)));
        kernel.dispatch(Action::SendOtp(SlicePhase::Reset));
        kernel.dispatch(Action::VerifyOtp(SlicePhase::Reset));
        self.send_unrecorded = false;
        self.cooldown.clear();
        Ok(())
    }

    /// Clears every persisted key and the whole state tree.
    pub fn logout(&mut self, kernel: &mut AppKernel) -> Result<(), SessionError> {
        self.storage.clear_all()?;
        self.gateway.set_access_token(None);
        self.token = None;
        self.send_unrecorded = false;
        self.cooldown.clear();
        kernel.dispatch(Action::Session(SessionAction::LoggedOut));
        info!("signed out");
        Ok(())
    }

    pub fn update_profile(
        &mut self,
        kernel: &mut AppKernel,
        patch: ProfilePatch,
    ) -> Result<Profile, SessionError> {
        let (Some(mut profile), Some(token)) = (self.current_user(kernel), self.token.clone())
        else {
            return Err(SessionError::NotAuthenticated);
        };
        profile.apply(patch);
        self.storage.save_session(&token, &profile)?;
        kernel.dispatch(Action::Session(SessionAction::ProfileUpdated(profile.clone())));
        Ok(profile)
    }

    pub fn is_authenticated(&self, kernel: &AppKernel) -> bool {
        kernel.store().select(|s| s.session.is_authenticated())
    }

    pub fn current_user(&self, kernel: &AppKernel) -> Option<Profile> {
        kernel.store().select(|s| {
            if s.session.is_authenticated() {
                s.session.user.clone()
            } else {
                None
            }
        })
    }
}
