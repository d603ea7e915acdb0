use std::collections::BTreeSet;
use std::str::FromStr;

use projecttracker_core::AppError;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wildcard entry granting every permission.
pub const WILDCARD_PERMISSION: &str = "*";

/// Permissions known to the project tracker UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    /// Allows listing and opening projects.
    ProjectView,
    /// Allows creating projects.
    ProjectCreate,
    /// Allows editing projects.
    ProjectEdit,
    /// Allows deleting projects.
    ProjectDelete,
    /// Allows listing and opening tasks.
    TaskView,
    /// Allows creating tasks.
    TaskCreate,
    /// Allows editing tasks.
    TaskEdit,
    /// Allows deleting tasks.
    TaskDelete,
    /// Allows listing users.
    UserView,
    /// Allows creating users.
    UserCreate,
    /// Allows editing users.
    UserEdit,
    /// Allows deleting users.
    UserDelete,
    /// Allows full user management.
    UserManage,
    /// Allows reading permission assignments.
    PermissionView,
    /// Allows changing permission assignments.
    PermissionChange,
    /// Allows reading role definitions.
    RoleView,
    /// Allows changing role definitions.
    RoleChange,
    /// Allows system administration.
    SystemAdmin,
    /// Allows viewing teams.
    TeamView,
    /// Allows managing teams.
    TeamManage,
}

impl Permission {
    /// Returns the `resource:action` wire value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectView => "project:view",
            Self::ProjectCreate => "project:create",
            Self::ProjectEdit => "project:edit",
            Self::ProjectDelete => "project:delete",
            Self::TaskView => "task:view",
            Self::TaskCreate => "task:create",
            Self::TaskEdit => "task:edit",
            Self::TaskDelete => "task:delete",
            Self::UserView => "user:view",
            Self::UserCreate => "user:create",
            Self::UserEdit => "user:edit",
            Self::UserDelete => "user:delete",
            Self::UserManage => "user:manage",
            Self::PermissionView => "permission:view",
            Self::PermissionChange => "permission:change",
            Self::RoleView => "role:view",
            Self::RoleChange => "role:change",
            Self::SystemAdmin => "system:admin",
            Self::TeamView => "team:view",
            Self::TeamManage => "team:manage",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::ProjectView,
            Permission::ProjectCreate,
            Permission::ProjectEdit,
            Permission::ProjectDelete,
            Permission::TaskView,
            Permission::TaskCreate,
            Permission::TaskEdit,
            Permission::TaskDelete,
            Permission::UserView,
            Permission::UserCreate,
            Permission::UserEdit,
            Permission::UserDelete,
            Permission::UserManage,
            Permission::PermissionView,
            Permission::PermissionChange,
            Permission::RoleView,
            Permission::RoleChange,
            Permission::SystemAdmin,
            Permission::TeamView,
            Permission::TeamManage,
        ];

        ALL
    }

    /// Returns the resource half of the wire value.
    #[must_use]
    pub fn resource(&self) -> &'static str {
        self.as_str()
            .split_once(':')
            .map_or(self.as_str(), |(resource, _)| resource)
    }

    /// Returns the action half of the wire value.
    #[must_use]
    pub fn action(&self) -> &'static str {
        self.as_str()
            .split_once(':')
            .map_or("", |(_, action)| action)
    }

    /// Returns a human-readable label for permission screens.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::ProjectView => "View projects",
            Self::ProjectCreate => "Create projects",
            Self::ProjectEdit => "Edit projects",
            Self::ProjectDelete => "Delete projects",
            Self::TaskView => "View tasks",
            Self::TaskCreate => "Create tasks",
            Self::TaskEdit => "Edit tasks",
            Self::TaskDelete => "Delete tasks",
            Self::UserView => "View users",
            Self::UserCreate => "Create users",
            Self::UserEdit => "Edit users",
            Self::UserDelete => "Delete users",
            Self::UserManage => "Manage users",
            Self::PermissionView => "View permissions",
            Self::PermissionChange => "Change permissions",
            Self::RoleView => "View roles",
            Self::RoleChange => "Change roles",
            Self::SystemAdmin => "System administration",
            Self::TeamView => "View teams",
            Self::TeamManage => "Manage teams",
        }
    }

    /// Returns the category this permission is grouped under.
    #[must_use]
    pub fn category(&self) -> PermissionCategory {
        match self {
            Self::ProjectView | Self::ProjectCreate | Self::ProjectEdit | Self::ProjectDelete => {
                PermissionCategory::Project
            }
            Self::TaskView | Self::TaskCreate | Self::TaskEdit | Self::TaskDelete => {
                PermissionCategory::Task
            }
            Self::UserView
            | Self::UserCreate
            | Self::UserEdit
            | Self::UserDelete
            | Self::UserManage => PermissionCategory::User,
            Self::PermissionView
            | Self::PermissionChange
            | Self::RoleView
            | Self::RoleChange
            | Self::SystemAdmin
            | Self::TeamView
            | Self::TeamManage => PermissionCategory::System,
        }
    }

    /// Parses a transport value into a permission.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|permission| permission.as_str() == value)
            .copied()
            .ok_or_else(|| AppError::Validation(format!("unknown permission value '{value}'")))
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::from_str(value.as_str()).map_err(serde::de::Error::custom)
    }
}

/// Groups used to lay out permission management screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionCategory {
    /// Project permissions.
    Project,
    /// Task permissions.
    Task,
    /// User management permissions.
    User,
    /// System, team, role and permission administration.
    System,
}

impl PermissionCategory {
    /// Returns all categories in display order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[Self::Project, Self::Task, Self::User, Self::System]
    }

    /// Returns the display label for the category.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Project => "Project management",
            Self::Task => "Task management",
            Self::User => "User management",
            Self::System => "System administration",
        }
    }

    /// Returns the permissions in this category, in catalog order.
    #[must_use]
    pub fn permissions(&self) -> Vec<Permission> {
        Permission::all()
            .iter()
            .copied()
            .filter(|permission| permission.category() == *self)
            .collect()
    }
}

/// Permissions granted to a role: either everything or an explicit set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionSet {
    /// The `*` wildcard.
    All,
    /// An explicit set of permissions.
    Only(BTreeSet<Permission>),
}

impl PermissionSet {
    /// Builds an explicit permission set.
    #[must_use]
    pub fn only(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self::Only(permissions.into_iter().collect())
    }

    /// Returns whether the set is the wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Returns whether the set grants the given wire value.
    ///
    /// The wildcard grants every value. An explicit set matches by exact
    /// string equality, so `*` is never granted by an explicit set.
    #[must_use]
    pub fn contains(&self, permission: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(permissions) => permissions
                .iter()
                .any(|granted| granted.as_str() == permission),
        }
    }

    /// Returns the entries as wire strings, `["*"]` for the wildcard.
    #[must_use]
    pub fn entries(&self) -> Vec<&'static str> {
        match self {
            Self::All => vec![WILDCARD_PERMISSION],
            Self::Only(permissions) => permissions.iter().map(Permission::as_str).collect(),
        }
    }

    /// Returns the concrete permissions, expanding the wildcard to the catalog.
    #[must_use]
    pub fn expand(&self) -> Vec<Permission> {
        match self {
            Self::All => Permission::all().to_vec(),
            Self::Only(permissions) => permissions.iter().copied().collect(),
        }
    }
}

impl Serialize for PermissionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = self.entries();
        let mut sequence = serializer.serialize_seq(Some(entries.len()))?;
        for entry in entries {
            sequence.serialize_element(entry)?;
        }
        sequence.end()
    }
}

impl<'de> Deserialize<'de> for PermissionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<String>::deserialize(deserializer)?;
        if entries.iter().any(|entry| entry == WILDCARD_PERMISSION) {
            return Ok(Self::All);
        }

        entries
            .iter()
            .map(|entry| Permission::from_str(entry.as_str()))
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self::Only)
            .map_err(serde::de::Error::custom)
    }
}
