//! Route guarding and user-management rules built on the role table.

use projecttracker_core::{AppError, AppResult};
use projecttracker_domain::{PermissionResolver, Role, SessionUser};
use tracing::debug;

/// Access requirements attached to a route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRequirement {
    /// Permission the user must hold.
    pub required_permission: Option<String>,
    /// Role the user must have.
    pub required_role: Option<Role>,
    /// Roles of which the user must have one. Empty means no constraint.
    pub required_any_role: Vec<Role>,
}

impl RouteRequirement {
    /// Requirement satisfied by any signed-in user.
    #[must_use]
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// Requirement on a single permission.
    #[must_use]
    pub fn permission(permission: impl Into<String>) -> Self {
        Self {
            required_permission: Some(permission.into()),
            ..Self::default()
        }
    }

    /// Requirement on an exact role.
    #[must_use]
    pub fn role(role: Role) -> Self {
        Self {
            required_role: Some(role),
            ..Self::default()
        }
    }

    /// Requirement on one of several roles.
    #[must_use]
    pub fn any_role(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            required_any_role: roles.into_iter().collect(),
            ..Self::default()
        }
    }
}

/// Outcome of a route guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// The route may be entered.
    Allow,
    /// There is no session; the user has to sign in first.
    RedirectToLogin,
    /// The user is signed in but not allowed in.
    Deny {
        /// Short explanation for the user.
        reason: String,
    },
}

/// Action one user may take on another in user management screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    /// Open the profile.
    View,
    /// Edit the profile.
    Edit,
    /// Delete the account.
    Delete,
    /// Change role and permissions.
    ManagePermissions,
}

impl UserAction {
    /// Returns the stable identifier of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::ManagePermissions => "manage_permissions",
        }
    }
}

/// Application service for client-side access decisions.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPolicy {
    resolver: PermissionResolver,
}

impl AccessPolicy {
    /// Creates a policy over the canonical role table.
    #[must_use]
    pub fn new(resolver: PermissionResolver) -> Self {
        Self { resolver }
    }

    /// Returns the resolver the policy consults.
    #[must_use]
    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    /// Decides whether the user may enter a route.
    #[must_use]
    pub fn authorize_route(
        &self,
        user: Option<&SessionUser>,
        requirement: &RouteRequirement,
    ) -> RouteDecision {
        let Some(user) = user else {
            return RouteDecision::RedirectToLogin;
        };
        if user.is_super_user() {
            return RouteDecision::Allow;
        }

        let role = user.role_str().and_then(Role::parse);

        if let Some(permission) = requirement.required_permission.as_deref()
            && !self.resolver.has_permission(user.role_str(), permission)
        {
            return deny(user, format!("missing permission '{permission}'"));
        }

        if let Some(required) = requirement.required_role
            && role != Some(required)
        {
            return deny(user, format!("requires role '{required}'"));
        }

        if !requirement.required_any_role.is_empty()
            && !role.is_some_and(|role| requirement.required_any_role.contains(&role))
        {
            let roles = requirement
                .required_any_role
                .iter()
                .map(Role::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            return deny(user, format!("requires one of roles: {roles}"));
        }

        RouteDecision::Allow
    }

    /// Returns whether the user holds the permission. Superusers hold all.
    #[must_use]
    pub fn user_has_permission(&self, user: &SessionUser, permission: &str) -> bool {
        user.is_super_user() || self.resolver.has_permission(user.role_str(), permission)
    }

    /// Ensures the user holds the permission.
    pub fn require_permission(&self, user: &SessionUser, permission: &str) -> AppResult<()> {
        if self.user_has_permission(user, permission) {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "user '{}' is missing permission '{permission}'",
            user.username
        )))
    }

    /// Returns whether the actor may manage the target user.
    #[must_use]
    pub fn can_act_on(&self, actor: &SessionUser, target: &SessionUser) -> bool {
        if actor.is_super_user() {
            return true;
        }
        if target.is_super_user() {
            return false;
        }

        hierarchy_level(actor) >= hierarchy_level(target)
    }

    /// Lists what the actor may do with the target user, in display order.
    #[must_use]
    pub fn available_user_actions(
        &self,
        actor: &SessionUser,
        target: &SessionUser,
    ) -> Vec<UserAction> {
        let can_act = self.can_act_on(actor, target);
        let mut actions = vec![UserAction::View];

        if can_act {
            actions.push(UserAction::Edit);
        }
        if can_act && !target.is_super_user() {
            actions.push(UserAction::Delete);
        }
        if actor.is_super_user() && !target.is_super_user() {
            actions.push(UserAction::ManagePermissions);
        }

        actions
    }

    /// Checks that the actor may give the target the new role.
    pub fn validate_role_assignment(
        &self,
        new_role: Role,
        actor: &SessionUser,
        target: &SessionUser,
    ) -> AppResult<()> {
        if target.is_super_user() {
            return Err(AppError::Forbidden(
                "the role of a superuser cannot be changed".to_owned(),
            ));
        }
        if new_role == Role::Admin && !actor.is_super_user() {
            return Err(AppError::Forbidden(
                "only superusers can assign the admin role".to_owned(),
            ));
        }
        if !self.can_act_on(actor, target) {
            return Err(AppError::Forbidden(format!(
                "user '{}' cannot change the role of '{}'",
                actor.username, target.username
            )));
        }

        Ok(())
    }

    /// Filters a user list down to the users the actor may see.
    ///
    /// A `manager` sees everyone except admins, other managers and
    /// superusers. Every other role, `project_manager` included, sees the
    /// users it can act on.
    #[must_use]
    pub fn visible_users<'a>(
        &self,
        actor: &SessionUser,
        users: &'a [SessionUser],
    ) -> Vec<&'a SessionUser> {
        if actor.is_super_user() {
            return users.iter().collect();
        }

        let is_manager = actor.role_str().and_then(Role::parse) == Some(Role::Manager);

        users
            .iter()
            .filter(|user| {
                if is_manager {
                    !user.is_super_user()
                        && !matches!(
                            user.role_str().and_then(Role::parse),
                            Some(Role::Admin | Role::Manager)
                        )
                } else {
                    self.can_act_on(actor, user)
                }
            })
            .collect()
    }
}

/// Level of the user's role; unknown or missing roles rank below every role.
fn hierarchy_level(user: &SessionUser) -> u8 {
    user.role_str()
        .and_then(Role::parse)
        .map_or(0, |role| role.hierarchy_level())
}

fn deny(user: &SessionUser, reason: String) -> RouteDecision {
    debug!(user_id = user.id, role = ?user.role_str(), reason = %reason, "route access denied");
    RouteDecision::Deny { reason }
}
