use crate::role::{Role, RoleConfig, RoleOption, role_table};
use crate::security::{Permission, PermissionSet};

/// Total lookups over the canonical role table.
///
/// Every method accepts the raw role identifier the backend sent. Unknown,
/// empty and missing identifiers resolve to [`Role::FALLBACK`], so none of
/// these lookups can fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionResolver;

impl PermissionResolver {
    /// Creates a resolver over the canonical table.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Returns the configuration of the role, or of the fallback role.
    #[must_use]
    pub fn role_config(&self, role: Option<&str>) -> &'static RoleConfig {
        Role::resolve(role).config()
    }

    /// Returns the permission set granted to the role.
    #[must_use]
    pub fn permissions(&self, role: Option<&str>) -> &'static PermissionSet {
        &self.role_config(role).permissions
    }

    /// Returns whether the role is granted the permission.
    ///
    /// `admin` is granted everything; otherwise the role's set must be the
    /// wildcard or contain the permission verbatim.
    #[must_use]
    pub fn has_permission(&self, role: Option<&str>, permission: &str) -> bool {
        if role == Some(Role::Admin.as_str()) {
            return true;
        }

        self.permissions(role).contains(permission)
    }

    /// Typed variant of [`PermissionResolver::has_permission`].
    #[must_use]
    pub fn role_has(&self, role: Role, permission: Permission) -> bool {
        self.has_permission(Some(role.as_str()), permission.as_str())
    }

    /// Returns the concrete permissions of the role with the wildcard expanded.
    #[must_use]
    pub fn effective_permissions(&self, role: Option<&str>) -> Vec<Permission> {
        self.permissions(role).expand()
    }

    /// Returns every role as a picker option, in table order.
    #[must_use]
    pub fn available_roles(&self) -> Vec<RoleOption> {
        role_table()
            .iter()
            .map(|(role, config)| RoleOption {
                value: *role,
                label: config.name,
                description: config.description,
                color: config.color,
                icon: config.icon,
            })
            .collect()
    }

    /// Returns the badge color token of the role.
    #[must_use]
    pub fn role_color(&self, role: Option<&str>) -> &'static str {
        self.role_config(role).color
    }

    /// Returns the badge icon token of the role.
    #[must_use]
    pub fn role_icon(&self, role: Option<&str>) -> &'static str {
        self.role_config(role).icon
    }
}
