//! Authenticated user profile as returned by the login endpoint.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::role::Role;

/// User profile persisted alongside the session tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Backend user id.
    pub id: i64,
    /// Login name.
    #[serde(default)]
    pub username: String,
    /// Email address, if known.
    #[serde(default)]
    pub email: Option<String>,
    /// Given name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Raw role identifier exactly as sent by the backend.
    #[serde(default)]
    pub role: Option<String>,
    /// Backend superuser flag.
    #[serde(default)]
    pub is_superuser: bool,
    /// Backend staff flag.
    #[serde(default)]
    pub is_staff: bool,
    /// Profile fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl SessionUser {
    /// Creates a profile with the given id, username and role.
    #[must_use]
    pub fn new(id: i64, username: impl Into<String>, role: Option<&str>) -> Self {
        Self {
            id,
            username: username.into(),
            email: None,
            first_name: None,
            last_name: None,
            role: role.map(str::to_owned),
            is_superuser: false,
            is_staff: false,
            extra: BTreeMap::new(),
        }
    }

    /// Returns the raw role identifier.
    #[must_use]
    pub fn role_str(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// Returns the resolved role, falling back to [`Role::FALLBACK`].
    #[must_use]
    pub fn resolved_role(&self) -> Role {
        Role::resolve(self.role_str())
    }

    /// Superusers bypass every permission check.
    #[must_use]
    pub fn is_super_user(&self) -> bool {
        self.role_str() == Some(Role::Admin.as_str()) || self.is_superuser || self.is_staff
    }

    /// Returns "first last", or the username when names are missing.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full_name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if full_name.is_empty() {
            self.username.clone()
        } else {
            full_name
        }
    }
}
