//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod permission_resolver;
mod role;
mod security;
mod session;
mod user;

pub use permission_resolver::PermissionResolver;
pub use role::{Role, RoleConfig, RoleOption, role_table};
pub use security::{Permission, PermissionCategory, PermissionSet, WILDCARD_PERMISSION};
pub use session::{SessionTokens, TokenPayload, TokenResponse};
pub use user::SessionUser;
