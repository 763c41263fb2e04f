use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::token::{Role, Token};
use crate::navigation::Navigator;
use crate::routes::RouteTable;
use crate::storage::KeyValueStore;

/// Storage key holding the token
pub const STORAGE_KEY: &str = "mysite_auth";

/// What to do with a stored role outside the known set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RolePolicy {
    /// Unknown roles stay logged in and route to the default page
    #[default]
    Lenient,
    /// Unknown roles fail every guard
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn(Token),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectReason {
    NotLoggedIn,
    RoleMismatch { required: Role, actual: String },
    UnknownRole(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Allowed(Token),
    Redirected { to: String, reason: RedirectReason },
}

impl GuardOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardOutcome::Allowed(_))
    }
}

/// Session handling for one browsing context.
///
/// Reads come from the session tier only. Writes go to the session tier
/// and fall back to the persistent tier. Storage failures never reach the
/// caller: a failed read is "logged out", a failed write is dropped.
pub struct SessionStore {
    key: String,
    session: Box<dyn KeyValueStore>,
    persistent: Box<dyn KeyValueStore>,
    routes: RouteTable,
    policy: RolePolicy,
}

impl SessionStore {
    pub fn new(
        session: impl KeyValueStore + 'static,
        persistent: impl KeyValueStore + 'static,
        routes: RouteTable,
    ) -> Self {
        Self {
            key: STORAGE_KEY.to_string(),
            session: Box::new(session),
            persistent: Box::new(persistent),
            routes,
            policy: RolePolicy::default(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_policy(mut self, policy: RolePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn policy(&self) -> RolePolicy {
        self.policy
    }

    pub fn session_tier(&self) -> &dyn KeyValueStore {
        self.session.as_ref()
    }

    pub fn persistent_tier(&self) -> &dyn KeyValueStore {
        self.persistent.as_ref()
    }

    /// Stored token, or `None` when absent, unreadable or malformed
    pub fn read_token(&self) -> Option<Token> {
        let raw = match self.session.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                debug!(error = %e, "Session storage read failed");
                return None;
            }
        };
        match Token::decode(&raw) {
            Ok(token) => Some(token),
            Err(e) => {
                debug!(error = %e, "Ignoring stored token");
                None
            }
        }
    }

    /// Best-effort write. Failure of both tiers is not reported.
    pub fn write_token(&self, token: &Token) {
        let encoded = match token.encode() {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(error = %e, "Failed to encode token");
                return;
            }
        };
        let Err(e) = self.session.set_item(&self.key, &encoded) else {
            return;
        };
        debug!(error = %e, "Session storage write failed, using persistent storage");
        if let Err(e) = self.persistent.set_item(&self.key, &encoded) {
            warn!(error = %e, "Failed to store token in any storage tier");
        }
    }

    /// Best-effort removal from both tiers
    pub fn remove_token(&self) {
        if let Err(e) = self.session.remove_item(&self.key) {
            debug!(error = %e, "Session storage remove failed");
        }
        if let Err(e) = self.persistent.remove_item(&self.key) {
            debug!(error = %e, "Persistent storage remove failed");
        }
    }

    pub fn is_logged(&self) -> bool {
        self.read_token().map(|t| t.logged).unwrap_or(false)
    }

    pub fn state(&self) -> SessionState {
        match self.read_token() {
            Some(token) if token.logged => SessionState::LoggedIn(token),
            _ => SessionState::LoggedOut,
        }
    }

    /// Landing page for a role string; default page for anything unknown
    pub fn resolve_home(&self, role: Option<&str>) -> String {
        self.routes.resolve(role)
    }

    /// Landing page of whoever is logged in
    pub fn current_home(&self) -> String {
        match self.state() {
            SessionState::LoggedIn(token) => self.resolve_home(Some(&token.role)),
            SessionState::LoggedOut => self.routes.default_path(),
        }
    }

    pub fn navigate_home(&self, nav: &mut impl Navigator) {
        nav.navigate(&self.current_home());
    }

    /// Page load check. Redirects to the login page when nobody is logged
    /// in or, with `required`, when the token carries another role. The
    /// stored token is left as it is either way.
    pub fn guard_page(&self, nav: &mut impl Navigator, required: Option<Role>) -> GuardOutcome {
        let token = match self.state() {
            SessionState::LoggedIn(token) => token,
            SessionState::LoggedOut => return self.redirect(nav, RedirectReason::NotLoggedIn),
        };

        if self.policy == RolePolicy::Strict && token.role().is_none() {
            return self.redirect(nav, RedirectReason::UnknownRole(token.role));
        }

        match required {
            Some(required) if token.role != required.as_str() => self.redirect(
                nav,
                RedirectReason::RoleMismatch {
                    required,
                    actual: token.role,
                },
            ),
            _ => GuardOutcome::Allowed(token),
        }
    }

    /// Clear the token and go to the login page
    pub fn logout(&self, nav: &mut impl Navigator) {
        self.remove_token();
        info!("Logged out");
        nav.navigate(&self.routes.login_path());
    }

    fn redirect(&self, nav: &mut impl Navigator, reason: RedirectReason) -> GuardOutcome {
        let to = self.routes.login_path();
        debug!(?reason, %to, "Guard redirect");
        nav.navigate(&to);
        GuardOutcome::Redirected { to, reason }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::navigation::HistoryNavigator;
    use crate::storage::MemoryStorage;

    fn store() -> (SessionStore, Rc<MemoryStorage>, Rc<MemoryStorage>) {
        let session = Rc::new(MemoryStorage::new());
        let persistent = Rc::new(MemoryStorage::new());
        let store = SessionStore::new(session.clone(), persistent.clone(), RouteTable::default());
        (store, session, persistent)
    }

    // -------------------------------------------------------------------------
    // Token storage
    // -------------------------------------------------------------------------

    #[test]
    fn test_write_then_read() {
        let (store, session, persistent) = store();
        let token = Token::new("docente");
        store.write_token(&token);

        assert!(store.is_logged());
        assert_eq!(store.read_token(), Some(token));
        assert!(session.get_item(STORAGE_KEY).unwrap().is_some());
        assert!(persistent.is_empty());
    }

    #[test]
    fn test_read_empty_is_none() {
        let (store, _, _) = store();
        assert_eq!(store.read_token(), None);
        assert!(!store.is_logged());
        assert_eq!(store.state(), SessionState::LoggedOut);
    }

    #[test]
    fn test_read_corrupt_is_none() {
        let (store, session, _) = store();
        for raw in ["not json", "null", "{}", r#"{"logged":true,"role":"admin"}"#, "42"] {
            session.set_item(STORAGE_KEY, raw).unwrap();
            assert_eq!(store.read_token(), None, "stored value {raw:?}");
            assert!(!store.is_logged());
        }
    }

    #[test]
    fn test_logged_false_is_not_logged() {
        let (store, session, _) = store();
        session
            .set_item(STORAGE_KEY, r#"{"logged":false,"role":"admin","time":1}"#)
            .unwrap();
        assert!(store.read_token().is_some());
        assert!(!store.is_logged());
        assert_eq!(store.state(), SessionState::LoggedOut);
    }

    #[test]
    fn test_write_falls_back_to_persistent() {
        let persistent = Rc::new(MemoryStorage::new());
        let store = SessionStore::new(
            MemoryStorage::unavailable(),
            persistent.clone(),
            RouteTable::default(),
        );
        store.write_token(&Token::new("admin"));

        let raw = persistent.get_item(STORAGE_KEY).unwrap().unwrap();
        assert_eq!(Token::decode(&raw).unwrap().role, "admin");
        // Reads only look at the session tier
        assert!(!store.is_logged());
    }

    #[test]
    fn test_write_falls_back_on_quota() {
        let persistent = Rc::new(MemoryStorage::new());
        let store = SessionStore::new(
            MemoryStorage::new().with_quota(4),
            persistent.clone(),
            RouteTable::default(),
        );
        store.write_token(&Token::new("admin"));
        assert!(persistent.get_item(STORAGE_KEY).unwrap().is_some());
    }

    #[test]
    fn test_write_failure_everywhere_is_silent() {
        let store = SessionStore::new(
            MemoryStorage::unavailable(),
            MemoryStorage::unavailable(),
            RouteTable::default(),
        );
        store.write_token(&Token::new("admin"));
        store.remove_token();
        assert_eq!(store.read_token(), None);
        assert!(!store.is_logged());
    }

    #[test]
    fn test_remove_clears_both_tiers() {
        let (store, session, persistent) = store();
        store.write_token(&Token::new("docente"));
        persistent
            .set_item(STORAGE_KEY, &Token::new("admin").encode().unwrap())
            .unwrap();

        store.remove_token();
        assert!(!store.is_logged());
        assert!(session.is_empty());
        assert!(persistent.is_empty());
    }

    #[test]
    fn test_remove_continues_past_failed_tier() {
        let persistent = Rc::new(MemoryStorage::new());
        persistent.set_item(STORAGE_KEY, "x").unwrap();
        let store = SessionStore::new(
            MemoryStorage::unavailable(),
            persistent.clone(),
            RouteTable::default(),
        );
        store.remove_token();
        assert!(persistent.is_empty());
    }

    #[test]
    fn test_custom_key() {
        let session = Rc::new(MemoryStorage::new());
        let store = SessionStore::new(session.clone(), MemoryStorage::new(), RouteTable::default())
            .with_key("portal_auth");
        store.write_token(&Token::new("admin"));
        assert!(session.get_item("portal_auth").unwrap().is_some());
        assert!(session.get_item(STORAGE_KEY).unwrap().is_none());
    }

    // -------------------------------------------------------------------------
    // Routing
    // -------------------------------------------------------------------------

    #[test]
    fn test_resolve_home() {
        let (store, _, _) = store();
        assert_eq!(store.resolve_home(Some("coordinador")), "../../pages/coordinador/coordinador.html");
        assert_eq!(store.resolve_home(Some("nobody")), "../../index.html");
        assert_eq!(store.resolve_home(None), "../../index.html");
    }

    #[test]
    fn test_current_home() {
        let (store, _, _) = store();
        assert_eq!(store.current_home(), "../../index.html");

        store.write_token(&Token::new("psicologo"));
        assert_eq!(store.current_home(), "../../pages/psicologo/psicologo.html");

        let mut nav = HistoryNavigator::new();
        store.navigate_home(&mut nav);
        assert_eq!(nav.current(), Some("../../pages/psicologo/psicologo.html"));
    }

    // -------------------------------------------------------------------------
    // Guards
    // -------------------------------------------------------------------------

    #[test]
    fn test_guard_without_token_redirects() {
        let (store, _, _) = store();
        let mut nav = HistoryNavigator::new();

        let outcome = store.guard_page(&mut nav, None);
        assert_eq!(
            outcome,
            GuardOutcome::Redirected {
                to: "../../index.html".to_string(),
                reason: RedirectReason::NotLoggedIn,
            }
        );
        assert_eq!(nav.current(), Some("../../index.html"));

        let mut nav = HistoryNavigator::new();
        assert!(!store.guard_page(&mut nav, Some(Role::Admin)).is_allowed());
        assert_eq!(nav.len(), 1);
    }

    #[test]
    fn test_guard_logged_false_redirects() {
        let (store, session, _) = store();
        session
            .set_item(STORAGE_KEY, r#"{"logged":false,"role":"docente","time":1}"#)
            .unwrap();
        let mut nav = HistoryNavigator::new();

        let outcome = store.guard_page(&mut nav, Some(Role::Docente));
        assert_eq!(
            outcome,
            GuardOutcome::Redirected {
                to: "../../index.html".to_string(),
                reason: RedirectReason::NotLoggedIn,
            }
        );
        assert_eq!(nav.current(), Some("../../index.html"));
        // Token stays as it was
        assert_eq!(store.read_token().map(|t| t.role), Some("docente".to_string()));
    }

    #[test]
    fn test_guard_allows_any_logged_role() {
        let (store, _, _) = store();
        store.write_token(&Token::new("estudiante"));
        let mut nav = HistoryNavigator::new();

        assert!(store.guard_page(&mut nav, None).is_allowed());
        assert!(store.guard_page(&mut nav, Some(Role::Estudiante)).is_allowed());
        assert!(nav.is_empty());
    }

    #[test]
    fn test_guard_role_mismatch_keeps_token() {
        let (store, _, _) = store();
        let token = Token::new("docente");
        store.write_token(&token);
        let mut nav = HistoryNavigator::new();

        let outcome = store.guard_page(&mut nav, Some(Role::Admin));
        assert_eq!(
            outcome,
            GuardOutcome::Redirected {
                to: "../../index.html".to_string(),
                reason: RedirectReason::RoleMismatch {
                    required: Role::Admin,
                    actual: "docente".to_string(),
                },
            }
        );
        assert_eq!(nav.current(), Some("../../index.html"));
        assert_eq!(store.read_token(), Some(token));
        assert!(store.is_logged());
    }

    #[test]
    fn test_guard_unknown_role_lenient() {
        let (store, _, _) = store();
        store.write_token(&Token::new("rector"));
        let mut nav = HistoryNavigator::new();

        assert!(store.guard_page(&mut nav, None).is_allowed());
        assert!(!store.guard_page(&mut nav, Some(Role::Admin)).is_allowed());
        assert_eq!(store.current_home(), "../../index.html");
    }

    #[test]
    fn test_guard_unknown_role_strict() {
        let (store, _, _) = store();
        let store = store.with_policy(RolePolicy::Strict);
        store.write_token(&Token::new("rector"));
        let mut nav = HistoryNavigator::new();

        let outcome = store.guard_page(&mut nav, None);
        assert_eq!(
            outcome,
            GuardOutcome::Redirected {
                to: "../../index.html".to_string(),
                reason: RedirectReason::UnknownRole("rector".to_string()),
            }
        );
        // Known roles are unaffected
        store.write_token(&Token::new("admin"));
        assert!(store.guard_page(&mut nav, Some(Role::Admin)).is_allowed());
    }

    #[test]
    fn test_logout() {
        let (store, _, _) = store();
        store.write_token(&Token::new("admin"));
        let mut nav = HistoryNavigator::starting_at("../../pages/admin/admin.html");

        store.logout(&mut nav);
        assert!(!store.is_logged());
        assert_eq!(nav.current(), Some("../../index.html"));
    }

    #[test]
    fn test_logout_when_logged_out() {
        let (store, _, _) = store();
        let mut nav = HistoryNavigator::new();
        store.logout(&mut nav);
        assert!(!store.is_logged());
        assert_eq!(nav.current(), Some("../../index.html"));
    }
}
