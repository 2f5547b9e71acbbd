pub mod credentials;
pub mod navigation;
pub mod profile;
pub mod role;
pub mod routes;

pub use credentials::{OtpCode, PhoneNumber, ValidationError};
pub use navigation::NavigationState;
pub use profile::{BuildingId, Profile, ProfilePatch, Tenant};
pub use role::Role;
pub use routes::{Location, RouteClass};
