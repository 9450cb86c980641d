use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::grant::{Grant, dedup_grants};

/// Role identifier used for RBAC.
///
/// Roles are opaque slugs at this layer (`"super_admin"`, `"teacher"`); the
/// registry maps them to grants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(Cow<'static, str>);

impl RoleId {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RoleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.pad(&self.0)
    }
}

/// Role definition with its grant patterns and navigation modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDefinition {
    pub id: RoleId,
    pub display_name: String,
    pub description: Option<String>,
    /// Ordered, duplicate-free grant patterns.
    pub grants: Vec<Grant>,
    /// Coarse navigation signal; never consulted for authorization.
    pub accessible_modules: BTreeSet<String>,
    /// Baseline roles: cannot be removed or have their grants edited.
    pub is_system: bool,
}

impl RoleDefinition {
    pub fn new(id: RoleId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            description: None,
            grants: Vec::new(),
            accessible_modules: BTreeSet::new(),
            is_system: false,
        }
    }

    pub fn system(mut self) -> Self {
        self.is_system = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_grants(mut self, grants: impl IntoIterator<Item = Grant>) -> Self {
        self.grants = dedup_grants(grants);
        self
    }

    pub fn with_accessible_modules<S: Into<String>>(mut self, modules: impl IntoIterator<Item = S>) -> Self {
        self.accessible_modules = modules.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_all_access(&self) -> bool {
        self.grants.contains(&Grant::AllAccess)
    }
}
