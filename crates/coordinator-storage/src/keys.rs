//! Storage key constants.

/// Storage keys used by the coordinator
pub struct StorageKeys;

impl StorageKeys {
    /// Whether a signed-in session exists
    pub const IS_AUTHENTICATED: &'static str = "isAuthenticated";

    /// Backend-issued session token
    pub const AUTH_TOKEN: &'static str = "authToken";

    /// User profile (JSON)
    pub const USER_PROFILE: &'static str = "userProfile";
}
