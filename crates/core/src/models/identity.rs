use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Roles understood by the scheduler. Anything else the identity service
/// reports is dropped when the claim set is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Doctor,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Doctor => "doctor",
            Role::User => "user",
        }
    }

    /// Parses role names leniently, ignoring names outside the enumeration.
    pub fn parse_claims<I, S>(names: I) -> BTreeSet<Role>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|name| name.as_ref().parse().ok())
            .collect()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "doctor" => Ok(Role::Doctor),
            "user" => Ok(Role::User),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// Who is calling, as resolved by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub user_id: i64,
    pub roles: BTreeSet<Role>,
}

impl CallerIdentity {
    pub fn new(user_id: i64, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            user_id,
            roles: roles.into_iter().collect(),
        }
    }

    pub fn has_any_role(&self, required: &[Role]) -> bool {
        required.iter().any(|role| self.roles.contains(role))
    }
}

/// Opaque bearer token. Forwarded unmodified to the identity and facility
/// services; never parsed here.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// An authenticated request's caller: the token it presented plus the
/// identity that token resolved to.
#[derive(Debug, Clone)]
pub struct Caller {
    pub credential: Credential,
    pub identity: CallerIdentity,
}
