//! Central configuration constants for the console core.

/// Number of digits in an accepted mobile number.
pub const PHONE_DIGITS: usize = 10;

/// Number of digits in a one-time passcode.
pub const OTP_DIGITS: usize = 6;

/// Seconds the "resend code" affordance stays locked after an OTP is sent.
pub const OTP_RESEND_COOLDOWN_SECS: u64 = 30;

/// Landing route when none of the profile's roles has a default.
pub const FALLBACK_ROUTE: &str = "/dashboard";

/// Backend used when neither settings nor environment name one.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

/// Environment variable overriding the configured backend URL.
pub const API_URL_ENV: &str = "SOCIETY_API_URL";

/// File name of the on-disk key-value store.
pub const STORE_FILENAME: &str = "console.redb";

/// Resend cooldown as a `Duration`.
pub fn resend_cooldown() -> std::time::Duration {
    std::time::Duration::from_secs(OTP_RESEND_COOLDOWN_SECS)
}
