use std::fmt;

use serde_json::Value;
use society_core::{NavigationState, PhoneNumber, Profile, Tenant};

use crate::auth::{OtpDispatched, SendOtpRequest, VerifiedLogin, VerifyOtpRequest};
use crate::resources::{ResourceKey, ResourceRequest};

/// The four actions every request slice understands.
#[derive(Debug, Clone, PartialEq)]
pub enum SlicePhase<Req, Res> {
    Request(Req),
    Success(Res),
    Failure(String),
    Reset,
}

impl<Req, Res> SlicePhase<Req, Res> {
    pub fn name(&self) -> &'static str {
        match self {
            SlicePhase::Request(_) => "request",
            SlicePhase::Success(_) => "success",
            SlicePhase::Failure(_) => "failure",
            SlicePhase::Reset => "reset",
        }
    }

    pub fn is_request(&self) -> bool {
        matches!(self, SlicePhase::Request(_))
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, SlicePhase::Reset)
    }
}

/// Request families. At most one call per family is allowed to land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionFamily {
    SendOtp,
    VerifyOtp,
    Resource(ResourceKey),
}

impl fmt::Display for ActionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionFamily::SendOtp => f.write_str("auth/sendOtp"),
            ActionFamily::VerifyOtp => f.write_str("auth/verifyOtp"),
            ActionFamily::Resource(key) => write!(f, "resource/{key}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// A phone number from an earlier, unfinished OTP flow was found on boot.
    OtpFlowRestored { phone: PhoneNumber, tenant: Tenant },
    OtpFlowAbandoned,
    Authenticated(Profile),
    ProfileUpdated(Profile),
    LoggedOut,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NavigationAction {
    Restored(NavigationState),
    RouteChanged(String),
    MenuToggled(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SendOtp(SlicePhase<SendOtpRequest, OtpDispatched>),
    VerifyOtp(SlicePhase<VerifyOtpRequest, VerifiedLogin>),
    Resource(ResourceKey, SlicePhase<ResourceRequest, Value>),
    Session(SessionAction),
    Navigation(NavigationAction),
}

impl Action {
    pub fn send_otp(phone: PhoneNumber, tenant: Tenant) -> Self {
        Action::SendOtp(SlicePhase::Request(SendOtpRequest { phone, tenant }))
    }

    pub fn verify_otp(request: VerifyOtpRequest) -> Self {
        Action::VerifyOtp(SlicePhase::Request(request))
    }

    pub fn resource(key: ResourceKey, request: ResourceRequest) -> Self {
        Action::Resource(key, SlicePhase::Request(request))
    }

    pub fn reset_resource(key: ResourceKey) -> Self {
        Action::Resource(key, SlicePhase::Reset)
    }

    pub fn family(&self) -> Option<ActionFamily> {
        match self {
            Action::SendOtp(_) => Some(ActionFamily::SendOtp),
            Action::VerifyOtp(_) => Some(ActionFamily::VerifyOtp),
            Action::Resource(key, _) => Some(ActionFamily::Resource(*key)),
            Action::Session(_) | Action::Navigation(_) => None,
        }
    }

    fn phase_name(&self) -> Option<&'static str> {
        match self {
            Action::SendOtp(p) => Some(p.name()),
            Action::VerifyOtp(p) => Some(p.name()),
            Action::Resource(_, p) => Some(p.name()),
            Action::Session(_) | Action::Navigation(_) => None,
        }
    }

    pub fn is_request(&self) -> bool {
        self.phase_name() == Some("request")
    }

    pub fn is_reset(&self) -> bool {
        self.phase_name() == Some("reset")
    }

    /// Stable string tag, e.g. `auth/verifyOtp/success`.
    pub fn action_type(&self) -> String {
        if let (Some(family), Some(phase)) = (self.family(), self.phase_name()) {
            return format!("{family}/{phase}");
        }
        let tag = match self {
            Action::Session(SessionAction::OtpFlowRestored { .. }) => "session/otpFlowRestored",
            Action::Session(SessionAction::OtpFlowAbandoned) => "session/otpFlowAbandoned",
            Action::Session(SessionAction::Authenticated(_)) => "session/authenticated",
            Action::Session(SessionAction::ProfileUpdated(_)) => "session/profileUpdated",
            Action::Session(SessionAction::LoggedOut) => "session/loggedOut",
            Action::Navigation(NavigationAction::Restored(_)) => "navigation/restored",
            Action::Navigation(NavigationAction::RouteChanged(_)) => "navigation/routeChanged",
            Action::Navigation(NavigationAction::MenuToggled(_)) => "navigation/menuToggled",
            Action::SendOtp(_) | Action::VerifyOtp(_) | Action::Resource(..) => "unknown",
        };
        tag.to_string()
    }
}
