//! OTP login payloads and their backend calls.

use std::fmt;

use serde::Deserialize;
use serde_json::{json, Value};
use society_core::{BuildingId, OtpCode, PhoneNumber, Profile, Role, Tenant};
use society_infra::ApiRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOtpRequest {
    pub phone: PhoneNumber,
    pub tenant: Tenant,
}

impl SendOtpRequest {
    pub(crate) fn to_api_request(&self) -> ApiRequest {
        match &self.tenant {
            Tenant::Global => ApiRequest::post(
                "/auth/super-admin/send-otp",
                json!({ "phoneNumber": self.phone.as_str() }),
            ),
            Tenant::Building(id) => ApiRequest::post(
                "/auth/building-admin/send-otp",
                json!({ "phoneNumber": self.phone.as_str(), "buildingId": id.as_str() }),
            ),
        }
    }
}

/// Data of a successful send-OTP call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpDispatched {
    pub phone: PhoneNumber,
    pub tenant: Tenant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOtpRequest {
    pub phone: PhoneNumber,
    pub otp: OtpCode,
    pub tenant: Tenant,
}

impl VerifyOtpRequest {
    pub(crate) fn to_api_request(&self) -> ApiRequest {
        let mut body = json!({
            "phoneNumber": self.phone.as_str(),
            "otp": self.otp.as_str(),
        });
        let url = match &self.tenant {
            Tenant::Global => "/auth/super-admin/verify-otp",
            Tenant::Building(id) => {
                body["buildingId"] = Value::from(id.as_str());
                "/auth/building-admin/verify-otp"
            }
        };
        ApiRequest::post(url, body)
    }

    /// Turns the verify response into a session. A response without any
    /// console role is a failed login.
    pub(crate) fn decode(&self, data: Value) -> Result<VerifiedLogin, String> {
        let resp: VerifyOtpResponse = serde_json::from_value(data)
            .map_err(|e| format!("Unexpected response from server: {e}"))?;
        if resp.access_token.trim().is_empty() {
            return Err("Login response did not include an access token".into());
        }

        let roles = Role::parse_set(resp.user_roles.iter().map(String::as_str));
        if roles.is_empty() {
            return Err("This account has no access to the admin console".into());
        }

        let building_id = match resp.building_id.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                Some(BuildingId::parse(raw).map_err(|e| e.to_string())?)
            }
            _ => self.tenant.building_id().cloned(),
        };

        let profile = Profile {
            id: resp.user_id.unwrap_or_else(|| self.phone.to_string()),
            name: resp.name.unwrap_or_else(|| self.phone.masked()),
            roles,
            building_id,
        };
        Ok(VerifiedLogin {
            token: resp.access_token,
            profile,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyOtpResponse {
    access_token: String,
    #[serde(default)]
    user_roles: Vec<String>,
    #[serde(default)]
    building_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Data of a successful verify-OTP call.
#[derive(Clone, PartialEq, Eq)]
pub struct VerifiedLogin {
    pub token: String,
    pub profile: Profile,
}

impl fmt::Debug for VerifiedLogin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifiedLogin")
            .field("token", &"<redacted>")
            .field("profile", &self.profile)
            .finish()
    }
}
