//! Core library for portal-session.
//!
//! Client-side session handling for a static multi-page school portal:
//! a role-tagged token kept in key-value storage, role-based landing
//! pages, page guards and logout.
//!
//! - [`auth`]: the token, the `SessionStore` façade and the login form
//! - [`storage`]: the key-value storage tiers
//! - [`routes`]: role to landing page resolution
//! - [`navigation`]: where redirects go
//! - [`config`]: site configuration

pub mod auth;
pub mod config;
pub mod navigation;
pub mod routes;
pub mod storage;

pub use auth::{
    GuardOutcome, LoginForm, RedirectReason, Role, RolePolicy, SessionState, SessionStore, Token,
    TokenError,
};
pub use config::SiteConfig;
pub use navigation::{HistoryNavigator, Navigator};
pub use routes::RouteTable;
pub use storage::{FileStorage, KeyValueStore, MemoryStorage, StorageError};
