//! Instance-level access: tenant boundary, ownership and relationship links.
//!
//! Rules, first match wins:
//! 1. unscoped actor
//! 2. resource organization equals the actor's organization
//! 3. actor owns the resource, or the resource is about one of the actor's
//!    relationship subjects
//!
//! Anything else is denied.

use serde::Serialize;

use crate::actor::Actor;
use crate::error::AuthzError;
use crate::resource::ScopedResource;

/// Which rule admitted the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeGrant {
    Global,
    Organization,
    Owner,
    Relationship,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeDecision {
    Allow(ScopeGrant),
    Deny,
}

impl ScopeDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, ScopeDecision::Allow(_))
    }
}

/// Stateless resolver; share freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeResolver;

impl ScopeResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn decide<R: ScopedResource + ?Sized>(&self, actor: &Actor, resource: &R, action: &str) -> ScopeDecision {
        let decision = Self::evaluate(actor, resource);
        tracing::trace!(
            actor = %actor.id,
            role = %actor.role,
            action,
            ?decision,
            "scope decision"
        );
        decision
    }

    /// Like [`ScopeResolver::decide`], but a deny becomes
    /// [`AuthzError::ScopeDenied`].
    pub fn enforce<R: ScopedResource + ?Sized>(
        &self,
        actor: &Actor,
        resource: &R,
        action: &str,
    ) -> Result<ScopeGrant, AuthzError> {
        match self.decide(actor, resource, action) {
            ScopeDecision::Allow(grant) => Ok(grant),
            ScopeDecision::Deny => Err(AuthzError::ScopeDenied {
                actor_org: actor.organization_scope,
                resource_org: resource.organization_scope(),
            }),
        }
    }

    fn evaluate<R: ScopedResource + ?Sized>(actor: &Actor, resource: &R) -> ScopeDecision {
        let Some(actor_org) = actor.organization_scope else {
            return ScopeDecision::Allow(ScopeGrant::Global);
        };

        if resource.organization_scope() == Some(actor_org) {
            return ScopeDecision::Allow(ScopeGrant::Organization);
        }

        if resource.owner_id() == Some(actor.id) {
            return ScopeDecision::Allow(ScopeGrant::Owner);
        }

        if resource
            .relationship_subject_id()
            .is_some_and(|subject| actor.relationship_subjects.contains(&subject))
        {
            return ScopeDecision::Allow(ScopeGrant::Relationship);
        }

        ScopeDecision::Deny
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceScope;
    use crate::roles::RoleId;
    use scholaris_core::{ActorId, OrganizationId};

    fn org(n: u128) -> OrganizationId {
        OrganizationId::from_u128(n)
    }

    fn admin_of(n: u128) -> Actor {
        Actor::new(ActorId::from_u128(100), RoleId::new("school_admin")).in_organization(org(n))
    }

    #[test]
    fn unscoped_actor_reaches_everything() {
        let actor = Actor::new(ActorId::from_u128(1), RoleId::new("super_admin"));
        let resolver = ScopeResolver::new();
        assert_eq!(
            resolver.decide(&actor, &ResourceScope::default(), "view"),
            ScopeDecision::Allow(ScopeGrant::Global)
        );
        assert_eq!(
            resolver.decide(&actor, &ResourceScope::in_organization(org(7)), "delete"),
            ScopeDecision::Allow(ScopeGrant::Global)
        );
    }

    #[test]
    fn tenant_boundary_is_enforced() {
        let resolver = ScopeResolver::new();
        let admin = admin_of(5);
        assert_eq!(
            resolver.decide(&admin, &ResourceScope::in_organization(org(5)), "view"),
            ScopeDecision::Allow(ScopeGrant::Organization)
        );
        assert_eq!(
            resolver.decide(&admin, &ResourceScope::in_organization(org(7)), "view"),
            ScopeDecision::Deny
        );
    }

    #[test]
    fn unscoped_resource_never_matches_organization_rule() {
        let resolver = ScopeResolver::new();
        assert_eq!(
            resolver.decide(&admin_of(5), &ResourceScope::default(), "view"),
            ScopeDecision::Deny
        );
    }

    #[test]
    fn owner_and_guardian_reach_across_organizations() {
        let resolver = ScopeResolver::new();
        let child = ActorId::from_u128(30);
        let guardian = Actor::new(ActorId::from_u128(20), RoleId::new("parent"))
            .in_organization(org(1))
            .with_relationship_subjects([child]);

        let own = ResourceScope::in_organization(org(5)).owned_by(guardian.id);
        assert_eq!(resolver.decide(&guardian, &own, "view"), ScopeDecision::Allow(ScopeGrant::Owner));

        let report_card = ResourceScope::in_organization(org(5)).about(child);
        assert_eq!(
            resolver.decide(&guardian, &report_card, "view"),
            ScopeDecision::Allow(ScopeGrant::Relationship)
        );

        let stranger = ResourceScope::in_organization(org(5)).about(ActorId::from_u128(31));
        assert_eq!(resolver.decide(&guardian, &stranger, "view"), ScopeDecision::Deny);
    }

    #[test]
    fn enforce_reports_both_organizations() {
        let err = ScopeResolver::new()
            .enforce(&admin_of(5), &ResourceScope::in_organization(org(7)), "edit")
            .unwrap_err();
        assert_eq!(
            err,
            AuthzError::ScopeDenied {
                actor_org: Some(org(5)),
                resource_org: Some(org(7)),
            }
        );
    }
}
