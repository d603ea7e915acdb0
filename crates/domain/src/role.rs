//! Roles and the canonical role configuration table.

use std::str::FromStr;
use std::sync::LazyLock;

use projecttracker_core::AppError;
use serde::{Deserialize, Serialize};

use crate::security::{Permission, PermissionSet};

/// Role assigned to a user by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Superuser with unrestricted access.
    Admin,
    /// Manages projects, tasks and team members.
    Manager,
    /// Manages projects, tasks and team members within projects.
    #[serde(alias = "PROJECT_MANAGER")]
    ProjectManager,
    /// Works on project tasks.
    Developer,
    /// Works on project tasks.
    Designer,
    /// Validates task work.
    Tester,
    /// Read-only consumer; also the fallback for unknown roles.
    User,
    /// Read-only consumer scoped to projects.
    #[serde(alias = "PROJECT_USER")]
    ProjectUser,
}

impl Role {
    /// Role applied when a role identifier is missing or unrecognized.
    pub const FALLBACK: Self = Self::User;

    /// Returns the canonical identifier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::ProjectManager => "project_manager",
            Self::Developer => "developer",
            Self::Designer => "designer",
            Self::Tester => "tester",
            Self::User => "user",
            Self::ProjectUser => "project_user",
        }
    }

    /// Returns all roles in table order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Role] = &[
            Role::Admin,
            Role::Manager,
            Role::ProjectManager,
            Role::Developer,
            Role::Designer,
            Role::Tester,
            Role::User,
            Role::ProjectUser,
        ];

        ALL
    }

    /// Parses an identifier exactly as given, returning `None` when unknown.
    ///
    /// `PROJECT_MANAGER` and `PROJECT_USER` are accepted as the backend's
    /// legacy spellings. No other case folding is applied.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "manager" => Some(Self::Manager),
            "project_manager" | "PROJECT_MANAGER" => Some(Self::ProjectManager),
            "developer" => Some(Self::Developer),
            "designer" => Some(Self::Designer),
            "tester" => Some(Self::Tester),
            "user" => Some(Self::User),
            "project_user" | "PROJECT_USER" => Some(Self::ProjectUser),
            _ => None,
        }
    }

    /// Resolves an optional identifier, falling back to [`Role::FALLBACK`].
    #[must_use]
    pub fn resolve(value: Option<&str>) -> Self {
        value.and_then(Self::parse).unwrap_or(Self::FALLBACK)
    }

    /// Returns the position of the role in the management hierarchy.
    ///
    /// Higher levels may act on users at the same or a lower level.
    #[must_use]
    pub fn hierarchy_level(&self) -> u8 {
        match self {
            Self::Admin => 4,
            Self::Manager | Self::ProjectManager => 3,
            Self::Developer | Self::Designer | Self::Tester => 2,
            Self::User | Self::ProjectUser => 1,
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
            .ok_or_else(|| AppError::Validation(format!("unknown role value '{value}'")))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Display metadata and permissions for one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleConfig {
    /// Display name.
    pub name: &'static str,
    /// Short description.
    pub description: &'static str,
    /// Granted permissions.
    pub permissions: PermissionSet,
    /// Color token used for badges.
    pub color: &'static str,
    /// Icon token used for badges.
    pub icon: &'static str,
}

/// Role entry offered by role pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleOption {
    /// Canonical role identifier.
    pub value: Role,
    /// Display name.
    pub label: &'static str,
    /// Short description.
    pub description: &'static str,
    /// Color token.
    pub color: &'static str,
    /// Icon token.
    pub icon: &'static str,
}

const MANAGEMENT_PERMISSIONS: &[Permission] = &[
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
];

const CONTRIBUTOR_PERMISSIONS: &[Permission] = &[
    Permission::ProjectView,
    Permission::TaskView,
    Permission::TaskCreate,
    Permission::TaskEdit,
];

const TESTER_PERMISSIONS: &[Permission] = &[
    Permission::ProjectView,
    Permission::TaskView,
    Permission::TaskEdit,
];

const VIEWER_PERMISSIONS: &[Permission] = &[Permission::ProjectView, Permission::TaskView];

static ADMIN: LazyLock<RoleConfig> = LazyLock::new(|| build_role_config(Role::Admin));
static MANAGER: LazyLock<RoleConfig> = LazyLock::new(|| build_role_config(Role::Manager));
static PROJECT_MANAGER: LazyLock<RoleConfig> =
    LazyLock::new(|| build_role_config(Role::ProjectManager));
static DEVELOPER: LazyLock<RoleConfig> = LazyLock::new(|| build_role_config(Role::Developer));
static DESIGNER: LazyLock<RoleConfig> = LazyLock::new(|| build_role_config(Role::Designer));
static TESTER: LazyLock<RoleConfig> = LazyLock::new(|| build_role_config(Role::Tester));
static USER: LazyLock<RoleConfig> = LazyLock::new(|| build_role_config(Role::User));
static PROJECT_USER: LazyLock<RoleConfig> = LazyLock::new(|| build_role_config(Role::ProjectUser));

static ROLE_TABLE: LazyLock<Vec<(Role, &'static RoleConfig)>> = LazyLock::new(|| {
    Role::all()
        .iter()
        .map(|role| (*role, role.config()))
        .collect()
});

fn build_role_config(role: Role) -> RoleConfig {
    let explicit = |permissions: &[Permission]| PermissionSet::only(permissions.iter().copied());

    match role {
        Role::Admin => RoleConfig {
            name: "Administrator",
            description: "Full access to the system",
            permissions: PermissionSet::All,
            color: "#ef4444",
            icon: "admin_panel_settings",
        },
        Role::Manager => RoleConfig {
            name: "Manager",
            description: "Manages projects and teams",
            permissions: explicit(MANAGEMENT_PERMISSIONS),
            color: "#6366f1",
            icon: "manage_accounts",
        },
        Role::ProjectManager => RoleConfig {
            name: "Project Manager",
            description: "Full project management",
            permissions: explicit(MANAGEMENT_PERMISSIONS),
            color: "#6366f1",
            icon: "manage_accounts",
        },
        Role::Developer => RoleConfig {
            name: "Developer",
            description: "Development and maintenance",
            permissions: explicit(CONTRIBUTOR_PERMISSIONS),
            color: "#10b981",
            icon: "code",
        },
        Role::Designer => RoleConfig {
            name: "Designer",
            description: "Design and user interface",
            permissions: explicit(CONTRIBUTOR_PERMISSIONS),
            color: "#f59e0b",
            icon: "palette",
        },
        Role::Tester => RoleConfig {
            name: "Tester",
            description: "Testing and validation",
            permissions: explicit(TESTER_PERMISSIONS),
            color: "#8b5cf6",
            icon: "bug_report",
        },
        Role::User => RoleConfig {
            name: "User",
            description: "Browses projects and tasks",
            permissions: explicit(VIEWER_PERMISSIONS),
            color: "#6b7280",
            icon: "person",
        },
        Role::ProjectUser => RoleConfig {
            name: "Project User",
            description: "Browses projects",
            permissions: explicit(VIEWER_PERMISSIONS),
            color: "#6b7280",
            icon: "person",
        },
    }
}

/// Returns the canonical role table in role order.
#[must_use]
pub fn role_table() -> &'static [(Role, &'static RoleConfig)] {
    ROLE_TABLE.as_slice()
}

impl Role {
    /// Returns the static configuration for this role.
    #[must_use]
    pub fn config(&self) -> &'static RoleConfig {
        let config = match self {
            Self::Admin => &ADMIN,
            Self::Manager => &MANAGER,
            Self::ProjectManager => &PROJECT_MANAGER,
            Self::Developer => &DEVELOPER,
            Self::Designer => &DESIGNER,
            Self::Tester => &TESTER,
            Self::User => &USER,
            Self::ProjectUser => &PROJECT_USER,
        };
        LazyLock::force(config)
    }
}
