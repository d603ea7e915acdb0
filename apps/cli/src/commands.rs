use clap::{Parser, Subcommand};
use projecttracker_application::{
    AccessPolicy, AuthenticatedClient, RegistrationRequest, RouteRequirement, SessionService,
};
use projecttracker_core::{AppError, AppResult};
use projecttracker_domain::{Permission, Role};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "projecttracker", about = "Project Tracker API client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sign in with a username or an email address.
    Login {
        /// Username, or email address when it contains '@'.
        identifier: String,

        /// Account password.
        #[arg(long, env = "PROJECTTRACKER_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and sign in.
    Register {
        /// Login name.
        username: String,

        /// Email address.
        email: String,

        /// Account password.
        #[arg(long, env = "PROJECTTRACKER_PASSWORD", hide_env_values = true)]
        password: String,

        /// Given name.
        #[arg(long)]
        first_name: Option<String>,

        /// Family name.
        #[arg(long)]
        last_name: Option<String>,
    },

    /// Sign out and forget the stored session.
    Logout,

    /// Show the signed-in user and their permissions.
    Whoami,

    /// Send an authenticated GET and print the JSON response.
    Get {
        /// Path relative to the API base URL, e.g. `projects/`.
        path: String,
    },

    /// List roles with their permissions.
    Roles,

    /// Check whether a role identifier grants a permission.
    Check {
        /// Role identifier as the backend sends it.
        role: String,

        /// Permission in `resource:action` form.
        permission: String,
    },

    /// Check whether the signed-in user may enter a route.
    Route {
        /// Permission the route requires.
        #[arg(long)]
        permission: Option<String>,

        /// Role the route requires.
        #[arg(long)]
        role: Option<Role>,

        /// Roles of which the user needs one.
        #[arg(long = "any-role", value_delimiter = ',')]
        any_role: Vec<Role>,
    },
}

pub struct CommandContext {
    pub client: AuthenticatedClient,
    pub sessions: SessionService,
    pub policy: AccessPolicy,
}

pub async fn run(command: Command, context: &CommandContext) -> AppResult<()> {
    match command {
        Command::Login {
            identifier,
            password,
        } => {
            let user = context
                .sessions
                .login(identifier.as_str(), password.as_str())
                .await?;
            println!("Signed in as {} ({})", user.display_name(), user.resolved_role());
        }
        Command::Register {
            username,
            email,
            password,
            first_name,
            last_name,
        } => {
            let request = RegistrationRequest {
                username,
                email,
                password_confirm: password.clone(),
                password,
                first_name,
                last_name,
            };
            match context.sessions.register(&request).await? {
                Some(user) => println!("Registered and signed in as {}", user.display_name()),
                None => println!("Registered; sign in with `projecttracker login`"),
            }
        }
        Command::Logout => {
            context.sessions.logout().await?;
            println!("Signed out");
        }
        Command::Whoami => {
            let user = context
                .sessions
                .current_user()
                .await?
                .ok_or_else(|| AppError::Unauthorized("not signed in".to_owned()))?;
            let resolver = context.policy.resolver();
            let role = resolver.role_config(user.role_str());

            println!("{} <{}>", user.display_name(), user.email.as_deref().unwrap_or("-"));
            println!("role: {} ({})", role.name, user.resolved_role());
            if user.is_super_user() {
                println!("superuser: every permission granted");
            }
            for permission in resolver.effective_permissions(user.role_str()) {
                println!("  {}", permission.as_str());
            }
        }
        Command::Get { path } => {
            let body: Value = context.client.get_json(path.as_str()).await?;
            println!("{}", pretty(&body)?);
        }
        Command::Roles => {
            let resolver = context.policy.resolver();
            for option in resolver.available_roles() {
                let permissions = resolver.permissions(Some(option.value.as_str()));
                let entries = if permissions.is_wildcard() {
                    "*".to_owned()
                } else {
                    permissions.entries().join(", ")
                };
                println!("{:<16} {:<16} {entries}", option.value.as_str(), option.label);
            }
        }
        Command::Check { role, permission } => {
            if Permission::from_transport(permission.as_str()).is_err() {
                println!("note: '{permission}' is not a known permission");
            }
            let granted = context
                .policy
                .resolver()
                .has_permission(Some(role.as_str()), permission.as_str());
            println!("{}", if granted { "granted" } else { "denied" });
        }
        Command::Route {
            permission,
            role,
            any_role,
        } => {
            let requirement = RouteRequirement {
                required_permission: permission,
                required_role: role,
                required_any_role: any_role,
            };
            let user = context.sessions.current_user().await?;
            println!(
                "{:?}",
                context.policy.authorize_route(user.as_ref(), &requirement)
            );
        }
    }

    Ok(())
}

fn pretty(body: &Value) -> AppResult<String> {
    serde_json::to_string_pretty(body)
        .map_err(|error| AppError::Internal(format!("failed to render response: {error}")))
}
