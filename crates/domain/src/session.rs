use serde::{Deserialize, Serialize};

/// Access and refresh tokens of one session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    /// Short-lived bearer credential.
    pub access: String,
    /// Longer-lived credential used to mint new access tokens.
    pub refresh: Option<String>,
}

impl SessionTokens {
    /// Creates a token pair.
    #[must_use]
    pub fn new(access: impl Into<String>, refresh: Option<String>) -> Self {
        Self {
            access: access.into(),
            refresh,
        }
    }
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SessionTokens")
            .field("access", &"<redacted>")
            .field("refresh", &self.refresh.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Token payload returned by the login and refresh endpoints.
///
/// The backend has shipped three shapes over time; all are accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TokenResponse {
    /// `{ "tokens": { "access": ..., "refresh": ... } }`
    Nested {
        /// Inner token object.
        tokens: TokenPayload,
    },
    /// `{ "access": ..., "refresh": ... }`
    Flat(TokenPayload),
    /// `{ "accessToken": ..., "refreshToken": ... }`
    CamelCase {
        /// New access token.
        #[serde(rename = "accessToken")]
        access_token: String,
        /// Rotated refresh token, if any.
        #[serde(rename = "refreshToken", default)]
        refresh_token: Option<String>,
    },
}

/// Snake-case token object.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPayload {
    /// New access token.
    pub access: String,
    /// Rotated refresh token, if any.
    #[serde(default)]
    pub refresh: Option<String>,
}

impl From<TokenResponse> for SessionTokens {
    fn from(value: TokenResponse) -> Self {
        match value {
            TokenResponse::Nested { tokens } | TokenResponse::Flat(tokens) => {
                Self::new(tokens.access, tokens.refresh)
            }
            TokenResponse::CamelCase {
                access_token,
                refresh_token,
            } => Self::new(access_token, refresh_token),
        }
    }
}
