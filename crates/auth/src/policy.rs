//! Actor-vs-actor rules for sensitive account-management actions.
//!
//! These depend on the relationship between two principals, so they cannot be
//! expressed as flat permission strings. Evaluation order:
//!
//! 1. self guard: nobody deletes, re-roles, re-statuses or impersonates itself
//! 2. tier guard: only the global role may act on a global-role account
//! 3. global peer deletion: denied unless explicitly configured
//! 4. resend invitation: only for unverified targets and eligible roles
//! 5. base case: `"<module>.<action>"` permission plus scope over the target

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use scholaris_core::DomainError;

use crate::actor::{Actor, TargetAccount};
use crate::engine::AuthorizationEngine;
use crate::error::{AuthzError, ConfigError};
use crate::permissions::PermissionSlug;
use crate::registry::RegistrySnapshot;
use crate::roles::RoleId;
use crate::scope::ScopeResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    Delete,
    Edit,
    ChangeRole,
    ChangeStatus,
    ResetPassword,
    ResendInvitation,
    Impersonate,
}

impl AdminAction {
    pub const ALL: [AdminAction; 7] = [
        AdminAction::Delete,
        AdminAction::Edit,
        AdminAction::ChangeRole,
        AdminAction::ChangeStatus,
        AdminAction::ResetPassword,
        AdminAction::ResendInvitation,
        AdminAction::Impersonate,
    ];

    /// Action name used in the base-case permission slug.
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminAction::Delete => "delete",
            AdminAction::Edit => "edit",
            AdminAction::ChangeRole => "change_role",
            AdminAction::ChangeStatus => "change_status",
            AdminAction::ResetPassword => "reset_password",
            AdminAction::ResendInvitation => "resend_invitation",
            AdminAction::Impersonate => "impersonate",
        }
    }

    /// Actions that always deny an actor acting on itself.
    pub fn is_identity_sensitive(&self) -> bool {
        matches!(
            self,
            AdminAction::Delete | AdminAction::ChangeRole | AdminAction::ChangeStatus
        )
    }

    fn blocks_self(&self) -> bool {
        self.is_identity_sensitive() || *self == AdminAction::Impersonate
    }

    /// Wider than the four identity-changing actions: editing or impersonating
    /// a global-role account is as sensitive as resetting its password.
    /// Only resending an invitation grants nothing over the target.
    fn is_tier_guarded(&self) -> bool {
        !matches!(self, AdminAction::ResendInvitation)
    }
}

impl core::fmt::Display for AdminAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AdminAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown administrative action '{s}'")))
    }
}

/// Reviewable knobs for the open policy questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Module whose permissions gate the base case (`"user.delete"`, ...).
    pub target_module: String,
    /// Whether a global actor may delete another global actor.
    pub allow_global_peer_deletion: bool,
    /// Roles besides the global role that may resend invitations.
    pub resend_invitation_roles: BTreeSet<RoleId>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            target_module: "user".to_string(),
            allow_global_peer_deletion: false,
            resend_invitation_roles: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DenyReason {
    SelfAction,
    TierGuard,
    GlobalPeerDeletion,
    AlreadyVerified,
    NotEligible,
    MissingPermission { slug: String },
    OutOfScope,
}

impl core::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DenyReason::SelfAction => f.write_str("actor cannot perform this action on itself"),
            DenyReason::TierGuard => f.write_str("target holds the global role"),
            DenyReason::GlobalPeerDeletion => f.write_str("global accounts cannot delete each other"),
            DenyReason::AlreadyVerified => f.write_str("target has already verified its email"),
            DenyReason::NotEligible => f.write_str("role may not resend invitations"),
            DenyReason::MissingPermission { slug } => write!(f, "missing permission '{slug}'"),
            DenyReason::OutOfScope => f.write_str("target is outside the actor's scope"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyDecision {
    Allow,
    Deny(DenyReason),
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PolicyDecision::Allow)
    }
}

#[derive(Debug, Clone)]
pub struct CapabilityPolicy {
    engine: AuthorizationEngine,
    scope: ScopeResolver,
    config: PolicyConfig,
}

impl CapabilityPolicy {
    pub fn new(engine: AuthorizationEngine) -> Result<Self, AuthzError> {
        Self::with_config(engine, PolicyConfig::default())
    }

    /// Fails with [`ConfigError`] when an administrative action has no
    /// `"<target_module>.<action>"` permission in the catalog, or when a
    /// resend-invitation role is not registered.
    pub fn with_config(engine: AuthorizationEngine, config: PolicyConfig) -> Result<Self, AuthzError> {
        let snapshot = engine.registry().snapshot()?;
        validate_config(&snapshot, &config)?;
        Ok(Self {
            engine,
            scope: ScopeResolver::new(),
            config,
        })
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Decide whether `actor` may perform `action` on `target`.
    ///
    /// Both roles must exist in the registry; otherwise this fails with
    /// [`AuthzError::UnknownRole`] rather than denying.
    pub fn evaluate(
        &self,
        actor: &Actor,
        target: &TargetAccount,
        action: AdminAction,
    ) -> Result<PolicyDecision, AuthzError> {
        let snapshot = self.engine.registry().snapshot()?;
        snapshot.role(&actor.role)?;
        snapshot.role(&target.actor.role)?;

        let actor_global = snapshot.is_global(&actor.role);
        let target_global = snapshot.is_global(&target.actor.role);

        let decision = if actor.id == target.actor.id && action.blocks_self() {
            PolicyDecision::Deny(DenyReason::SelfAction)
        } else if action.is_tier_guarded() && target_global && !actor_global {
            PolicyDecision::Deny(DenyReason::TierGuard)
        } else if action == AdminAction::Delete
            && target_global
            && actor_global
            && !self.config.allow_global_peer_deletion
        {
            PolicyDecision::Deny(DenyReason::GlobalPeerDeletion)
        } else if action == AdminAction::ResendInvitation && target.is_verified() {
            PolicyDecision::Deny(DenyReason::AlreadyVerified)
        } else if action == AdminAction::ResendInvitation
            && !actor_global
            && !self.config.resend_invitation_roles.contains(&actor.role)
        {
            PolicyDecision::Deny(DenyReason::NotEligible)
        } else {
            self.base_case(&snapshot, actor, target, action)?
        };

        if let PolicyDecision::Deny(reason) = &decision {
            tracing::debug!(
                actor = %actor.id,
                role = %actor.role,
                target = %target.actor.id,
                %action,
                %reason,
                "administrative action denied"
            );
        }

        Ok(decision)
    }

    /// Like [`CapabilityPolicy::evaluate`], but a deny becomes
    /// [`AuthzError::CapabilityDenied`].
    pub fn enforce(&self, actor: &Actor, target: &TargetAccount, action: AdminAction) -> Result<(), AuthzError> {
        match self.evaluate(actor, target, action)? {
            PolicyDecision::Allow => Ok(()),
            PolicyDecision::Deny(reason) => Err(AuthzError::CapabilityDenied { action, reason }),
        }
    }

    fn base_case(
        &self,
        snapshot: &RegistrySnapshot,
        actor: &Actor,
        target: &TargetAccount,
        action: AdminAction,
    ) -> Result<PolicyDecision, AuthzError> {
        let slug = PermissionSlug::of(&self.config.target_module, action.as_str());
        if !snapshot.role(&actor.role)?.holds(slug.as_str()) {
            return Ok(PolicyDecision::Deny(DenyReason::MissingPermission {
                slug: slug.to_string(),
            }));
        }
        if !self.scope.decide(actor, target, action.as_str()).is_allowed() {
            return Ok(PolicyDecision::Deny(DenyReason::OutOfScope));
        }
        Ok(PolicyDecision::Allow)
    }
}

fn validate_config(snapshot: &RegistrySnapshot, config: &PolicyConfig) -> Result<(), ConfigError> {
    for action in AdminAction::ALL {
        let slug = PermissionSlug::of(&config.target_module, action.as_str());
        if !snapshot.catalog().exists(slug.as_str()) {
            return Err(ConfigError::UnknownPolicyPermission {
                action,
                slug: slug.to_string(),
            });
        }
    }
    if let Some(role) = config
        .resend_invitation_roles
        .iter()
        .find(|role| snapshot.role(role).is_err())
    {
        return Err(ConfigError::UnknownPolicyRole(role.clone()));
    }
    Ok(())
}
