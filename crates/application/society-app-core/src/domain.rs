use std::collections::BTreeMap;

use serde_json::Value;
use society_core::{NavigationState, PhoneNumber, Profile, Tenant};

use crate::app_core::{SliceState, Status};
use crate::auth::{OtpDispatched, VerifiedLogin};
use crate::resources::ResourceKey;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionPhase {
    #[default]
    Anonymous,
    /// An OTP went out to `phone`; waiting for the code.
    OtpPending { phone: PhoneNumber, tenant: Tenant },
    Authenticated,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub user: Option<Profile>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.phase == SessionPhase::Authenticated && self.user.is_some()
    }

    pub fn pending_otp(&self) -> Option<(&PhoneNumber, &Tenant)> {
        match &self.phase {
            SessionPhase::OtpPending { phone, tenant } => Some((phone, tenant)),
            _ => None,
        }
    }
}

/// Everything the console renders from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootState {
    pub send_otp: SliceState<Option<OtpDispatched>>,
    pub verify_otp: SliceState<Option<VerifiedLogin>>,
    /// Created lazily on the first action for a key.
    pub resources: BTreeMap<ResourceKey, SliceState<Value>>,
    pub session: SessionState,
    pub navigation: NavigationState,
}

impl RootState {
    pub fn resource(&self, key: ResourceKey) -> Option<&SliceState<Value>> {
        self.resources.get(&key)
    }

    pub fn resource_status(&self, key: ResourceKey) -> Status {
        self.resource(key).map(|s| s.status).unwrap_or_default()
    }
}
