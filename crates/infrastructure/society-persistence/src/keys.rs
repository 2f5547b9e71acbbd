//! Storage keys. Values are JSON encoded.

pub const AUTH_TOKEN: &str = "auth_token";
pub const USER_INFO: &str = "userInfo";
pub const USER_MOBILE: &str = "user_mobile";
pub const BUILDING_ID: &str = "building_id";
/// Unix millis of the last OTP send; gates resend across restarts.
pub const OTP_SENT_AT: &str = "otp_sent_at";
pub const LAST_ACTIVE_PATH: &str = "lastActivePath";
pub const TAB_OPEN_STATES: &str = "tabOpenStates";

pub const SESSION_KEYS: [&str; 2] = [AUTH_TOKEN, USER_INFO];
pub const OTP_SCRATCH_KEYS: [&str; 3] = [USER_MOBILE, BUILDING_ID, OTP_SENT_AT];
pub const NAVIGATION_KEYS: [&str; 2] = [LAST_ACTIVE_PATH, TAB_OPEN_STATES];
