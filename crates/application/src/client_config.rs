/// Endpoint paths, storage keys and navigation targets used by the session core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Login endpoint, relative to the API base URL.
    pub login_path: String,
    /// Registration endpoint.
    pub register_path: String,
    /// Token refresh endpoint.
    pub refresh_path: String,
    /// Logout endpoint.
    pub logout_path: String,
    /// Scheme written before the access token in the `Authorization` header.
    pub token_type: String,
    /// Storage key of the access token.
    pub access_token_key: String,
    /// Storage key of the refresh token.
    pub refresh_token_key: String,
    /// Storage key of the serialized user profile.
    pub user_key: String,
    /// Location the navigator is sent to when the session ends.
    pub login_location: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            login_path: "authentication/login/".to_owned(),
            register_path: "authentication/register/".to_owned(),
            refresh_path: "authentication/refresh/".to_owned(),
            logout_path: "authentication/logout/".to_owned(),
            token_type: "Bearer".to_owned(),
            access_token_key: "accessToken".to_owned(),
            refresh_token_key: "refreshToken".to_owned(),
            user_key: "userData".to_owned(),
            login_location: "/login".to_owned(),
        }
    }
}

impl ClientConfig {
    /// Overrides the login location.
    #[must_use]
    pub fn with_login_location(mut self, location: impl Into<String>) -> Self {
        self.login_location = location.into();
        self
    }
}
