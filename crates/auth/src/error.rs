//! Error taxonomy for configuration and decision failures.

use thiserror::Error;

use scholaris_core::{DomainError, OrganizationId};

use crate::policy::{AdminAction, DenyReason};
use crate::roles::RoleId;

/// Configuration failures. Raised while building the catalog or a registry
/// snapshot; at startup these are fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error("duplicate module '{0}'")]
    DuplicateModule(String),

    #[error("duplicate permission '{0}'")]
    DuplicatePermission(String),

    #[error("duplicate role '{0}'")]
    DuplicateRole(RoleId),

    #[error("role '{role}' references unknown permission '{slug}'")]
    UnknownPermission { role: RoleId, slug: String },

    #[error("role '{role}' references unknown module '{module}'")]
    UnknownModule { role: RoleId, module: String },

    #[error("administrative action {action} needs permission '{slug}', which is not in the catalog")]
    UnknownPolicyPermission { action: AdminAction, slug: String },

    #[error("policy names unknown role '{0}'")]
    UnknownPolicyRole(RoleId),

    #[error("global role '{0}' is not defined")]
    MissingGlobalRole(RoleId),

    #[error("global role '{0}' must be a system role")]
    GlobalRoleNotSystem(RoleId),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{slug}'")]
    PermissionDenied { slug: String },

    #[error(
        "forbidden: actor scope {} cannot reach resource scope {}",
        display_scope(.actor_org),
        display_scope(.resource_org)
    )]
    ScopeDenied {
        actor_org: Option<OrganizationId>,
        resource_org: Option<OrganizationId>,
    },

    #[error("forbidden: {action} denied ({reason})")]
    CapabilityDenied { action: AdminAction, reason: DenyReason },

    #[error("unknown role '{role}'")]
    UnknownRole { role: RoleId },

    #[error("role '{role}' is a system role and cannot be modified")]
    SystemRoleImmutable { role: RoleId },

    #[error("role '{role}' already exists")]
    RoleExists { role: RoleId },

    #[error("role registry unavailable (lock poisoned)")]
    RegistryUnavailable,

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl AuthzError {
    /// Expected, per-request denials (as opposed to misconfiguration).
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            AuthzError::PermissionDenied { .. }
                | AuthzError::ScopeDenied { .. }
                | AuthzError::CapabilityDenied { .. }
        )
    }
}

fn display_scope(scope: &Option<OrganizationId>) -> String {
    match scope {
        Some(org) => org.to_string(),
        None => "<none>".to_string(),
    }
}
