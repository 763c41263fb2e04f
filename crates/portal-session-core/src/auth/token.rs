use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Portal roles. Each one has its own landing page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum Role {
    #[default]
    Estudiante,
    Docente,
    Psicologo,
    Coordinador,
    Admin,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Estudiante,
        Role::Docente,
        Role::Psicologo,
        Role::Coordinador,
        Role::Admin,
    ];

    /// Name used in storage, routes and `data-role` attributes
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Estudiante => "estudiante",
            Role::Docente => "docente",
            Role::Psicologo => "psicologo",
            Role::Coordinador => "coordinador",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown role: {0:?}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Exact match on the wire name. No trimming, no case folding.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("No token stored")]
    Empty,

    #[error("Malformed token: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The logged-in record kept in storage.
///
/// `role` is a free string: nothing stops an unrecognised role from being
/// written. It is only interpreted when routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Token {
    pub logged: bool,
    pub role: String,
    /// Creation time, epoch milliseconds
    pub time: i64,
}

impl Token {
    /// A logged-in token for `role`, stamped now
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            logged: true,
            role: role.into(),
            time: Utc::now().timestamp_millis(),
        }
    }

    pub fn for_role(role: Role) -> Self {
        Self::new(role.as_str())
    }

    /// The role if it is one of the known ones
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.time).single()
    }

    /// Time since the token was created. Zero if the clock went backwards.
    pub fn age(&self) -> Duration {
        self.created_at()
            .map(|created| (Utc::now() - created).max(Duration::zero()))
            .unwrap_or_else(Duration::zero)
    }

    pub fn encode(&self) -> Result<String, TokenError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a stored value. All three fields must be present; the JSON
    /// literal `null` and blank values count as no token.
    pub fn decode(raw: &str) -> Result<Self, TokenError> {
        if raw.trim().is_empty() {
            return Err(TokenError::Empty);
        }
        let parsed: Option<Token> = serde_json::from_str(raw)?;
        parsed.ok_or(TokenError::Empty)
    }
}
