//! Role to landing page resolution.
//!
//! Every page of the portal lives under `pages/<role>/<role>.html`, and the
//! login page is `index.html` at the site root. A `RouteTable` turns those
//! into locations relative to wherever the caller sits, via a single base
//! path: `"../../"` for a page two directories down, `""` for the root
//! itself, or `"/"` for absolute paths.

use std::collections::HashMap;

use crate::auth::Role;

/// Default login / landing page name
pub const LOGIN_PAGE: &str = "index.html";

/// Default directory holding the role pages
pub const PAGES_DIR: &str = "pages";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    base: String,
    login_page: String,
    homes: HashMap<Role, String>,
}

impl RouteTable {
    /// Standard layout under `base`
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_layout(base, PAGES_DIR, LOGIN_PAGE)
    }

    /// Layout with a custom pages directory and login page
    pub fn with_layout(base: impl Into<String>, pages_dir: &str, login_page: &str) -> Self {
        let base = normalize_base(base.into());
        let pages_dir = pages_dir.trim_matches('/');
        let homes = Role::ALL
            .into_iter()
            .map(|role| {
                let path = if pages_dir.is_empty() {
                    format!("{base}{role}/{role}.html")
                } else {
                    format!("{base}{pages_dir}/{role}/{role}.html")
                };
                (role, path)
            })
            .collect();
        Self {
            base,
            login_page: login_page.trim_start_matches('/').to_string(),
            homes,
        }
    }

    /// Table for a page `levels` directories below the site root
    pub fn at_depth(levels: usize) -> Self {
        Self::new("../".repeat(levels))
    }

    /// Table with paths absolute from `root`
    pub fn rooted(root: &str) -> Self {
        let root = if root.starts_with('/') {
            root.to_string()
        } else {
            format!("/{root}")
        };
        Self::new(root)
    }

    /// Replace the landing page of one role
    pub fn with_home(mut self, role: Role, path: impl Into<String>) -> Self {
        self.homes.insert(role, path.into());
        self
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Landing page for a known role
    pub fn home(&self, role: Role) -> &str {
        // Every role is inserted at construction
        self.homes.get(&role).map(String::as_str).unwrap_or_default()
    }

    /// Landing page for a raw role string. Exact lookup; anything else,
    /// including no role at all, goes to the default page.
    pub fn resolve(&self, role: Option<&str>) -> String {
        role.and_then(|r| r.parse::<Role>().ok())
            .map(|r| self.home(r).to_string())
            .unwrap_or_else(|| self.default_path())
    }

    /// Bare file name of a role page, for links between pages in the
    /// same directory
    pub fn filename(role: Role) -> String {
        format!("{role}.html")
    }

    pub fn login_path(&self) -> String {
        format!("{}{}", self.base, self.login_page)
    }

    /// Where unknown or missing roles are sent
    pub fn default_path(&self) -> String {
        self.login_path()
    }

    /// All role routes in `Role::ALL` order
    pub fn entries(&self) -> impl Iterator<Item = (Role, &str)> + '_ {
        Role::ALL.into_iter().map(move |role| (role, self.home(role)))
    }
}

impl Default for RouteTable {
    /// Role pages sit two levels below the site root
    fn default() -> Self {
        Self::at_depth(2)
    }
}

fn normalize_base(base: String) -> String {
    if base.is_empty() || base.ends_with('/') {
        base
    } else {
        format!("{base}/")
    }
}
