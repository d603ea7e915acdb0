//! Application services and ports.

#![forbid(unsafe_code)]

mod access_policy;
mod authenticated_client;
mod client_config;
mod session_ports;
mod session_service;
#[cfg(test)]
mod test_support;
mod token_store;

pub use access_policy::{AccessPolicy, RouteDecision, RouteRequirement, UserAction};
pub use authenticated_client::{AuthenticatedClient, ClientState};
pub use client_config::ClientConfig;
pub use session_ports::{ApiRequest, ApiResponse, HttpTransport, KeyValueStorage, Navigator};
pub use session_service::{RegistrationRequest, SessionService};
pub use token_store::TokenStore;
