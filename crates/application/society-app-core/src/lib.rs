pub mod app;
pub mod app_core;
pub mod auth;
pub mod domain;
pub mod effects;
pub mod guard;
pub mod kernel;
pub mod navigation;
pub mod ports;
pub mod resources;
pub mod session;
pub mod settings;

pub use app::ConsoleApp;
pub use app_core::*;
pub use auth::{OtpDispatched, SendOtpRequest, VerifiedLogin, VerifyOtpRequest};
pub use domain::{RootState, SessionPhase, SessionState};
pub use guard::GuardDecision;
pub use kernel::{AppKernel, Delivery};
pub use ports::ApiGateway;
pub use resources::{ResourceKey, ResourceKind, ResourceRequest, ResourceVerb};
pub use session::{ResendCooldown, SessionError, SessionManager};
pub use settings::{ConsoleSettings, SettingsFile};
