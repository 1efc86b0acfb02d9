//! Identifier types used throughout the Siteboard core.
//!
//! Identities come from the host environment as opaque strings; the
//! newtypes keep user, tenant, and scope values from being mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of the signed-in user, as reported by the host environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a user ID from a host-provided identity string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identity of the tenant the user is operating in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a tenant ID from a host-provided identity string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A cache and storage partition key: one user identity within one tenant.
///
/// Every cache entry and every persisted blob is keyed by a scope so that
/// no state leaks across accounts when several identities share a runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    /// The signed-in user.
    pub user: UserId,
    /// The tenant the user is operating in.
    pub tenant: TenantId,
}

impl Scope {
    /// Creates a scope from a user and tenant identity.
    #[must_use]
    pub fn new(user: impl Into<UserId>, tenant: impl Into<TenantId>) -> Self {
        Self {
            user: user.into(),
            tenant: tenant.into(),
        }
    }

    /// Returns the storage namespace prefix for this scope.
    ///
    /// Keys written through the store adapter are prefixed with this value,
    /// so two scopes never read each other's blobs.
    #[must_use]
    pub fn namespace(&self) -> String {
        format!("u:{}|t:{}", self.user, self.tenant)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.namespace())
    }
}
