use tracing::{debug, info};

use super::session::{RolePolicy, SessionStore};
use super::token::{Role, Token};
use crate::navigation::Navigator;

/// Login page state: the role picked in the role selector, held in memory
/// until the form is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    selected: String,
    default: Role,
    policy: RolePolicy,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginForm {
    pub fn new() -> Self {
        Self::starting_with(Role::default())
    }

    /// Form with `role` preselected and used as the fallback on submit
    pub fn starting_with(role: Role) -> Self {
        Self {
            selected: role.as_str().to_string(),
            default: role,
            policy: RolePolicy::default(),
        }
    }

    /// Form bound to a store, sharing its role policy
    pub fn for_store(store: &SessionStore, default_role: Role) -> Self {
        Self::starting_with(default_role).with_policy(store.policy())
    }

    pub fn with_policy(mut self, policy: RolePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn selected_role(&self) -> &str {
        &self.selected
    }

    pub fn default_role(&self) -> Role {
        self.default
    }

    /// Change the pending role. Empty values keep the current selection,
    /// as do unknown values under the strict policy.
    pub fn select_role(&mut self, role: &str) {
        if role.is_empty() {
            return;
        }
        if self.policy == RolePolicy::Strict && role.parse::<Role>().is_err() {
            debug!(role, "Ignoring unknown role selection");
            return;
        }
        self.selected = role.to_string();
    }

    /// Store a token for the selected role and go to its landing page
    pub fn submit(&mut self, store: &SessionStore, nav: &mut impl Navigator) -> Token {
        if self.selected.is_empty() {
            self.selected = self.default.as_str().to_string();
        }

        let token = Token::new(self.selected.clone());
        store.write_token(&token);
        info!(role = %token.role, "Logged in");

        nav.navigate(&store.resolve_home(Some(&token.role)));
        token
    }
}
