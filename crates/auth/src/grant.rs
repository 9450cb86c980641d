use std::str::FromStr;

use serde::{Deserialize, Serialize};

use scholaris_core::{DomainError, validate_identifier};

use crate::permissions::PermissionSlug;

/// A permission pattern assigned to a role.
///
/// Textual form: `"module.action"`, `"module.*"` or `"*"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Grant {
    /// A single permission.
    Exact(PermissionSlug),
    /// Every permission whose module equals the given name.
    ModuleWildcard(String),
    /// The whole catalog.
    AllAccess,
}

impl Grant {
    pub fn exact(slug: PermissionSlug) -> Self {
        Grant::Exact(slug)
    }

    pub fn module(module: impl Into<String>) -> Self {
        Grant::ModuleWildcard(module.into())
    }

    pub fn parse(value: &str) -> Result<Self, DomainError> {
        if value == "*" {
            return Ok(Grant::AllAccess);
        }
        if let Some(module) = value.strip_suffix(".*") {
            validate_identifier("module", module)?;
            return Ok(Grant::ModuleWildcard(module.to_string()));
        }
        Ok(Grant::Exact(PermissionSlug::parse(value)?))
    }

    /// Whether this grant covers `slug`.
    pub fn matches(&self, slug: &PermissionSlug) -> bool {
        match self {
            Grant::AllAccess => true,
            Grant::ModuleWildcard(module) => slug.module() == module,
            Grant::Exact(exact) => exact == slug,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        !matches!(self, Grant::Exact(_))
    }
}

impl core::fmt::Display for Grant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Grant::AllAccess => f.write_str("*"),
            Grant::ModuleWildcard(module) => write!(f, "{module}.*"),
            Grant::Exact(slug) => f.write_str(slug.as_str()),
        }
    }
}

impl FromStr for Grant {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Grant {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Grant> for String {
    fn from(value: Grant) -> Self {
        value.to_string()
    }
}

/// Drop repeated grants, keeping the first occurrence.
pub(crate) fn dedup_grants(grants: impl IntoIterator<Item = Grant>) -> Vec<Grant> {
    let mut out: Vec<Grant> = Vec::new();
    for grant in grants {
        if !out.contains(&grant) {
            out.push(grant);
        }
    }
    out
}
