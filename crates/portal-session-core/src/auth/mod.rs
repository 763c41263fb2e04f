//! Authentication module for the portal's client-side session.
//!
//! This module provides:
//! - `Token`: the stored logged-in record and the `Role` set
//! - `SessionStore`: token persistence over two storage tiers, role
//!   routing, page guards and logout
//! - `LoginForm`: the login page's pending role selection and submit
//!
//! The token is a convenience flag, not a credential: anyone can write one
//! into their own browser storage.

pub mod login;
pub mod session;
pub mod token;

pub use login::LoginForm;
pub use session::{GuardOutcome, RedirectReason, RolePolicy, SessionState, SessionStore};
pub use token::{Role, Token, TokenError, UnknownRole};
