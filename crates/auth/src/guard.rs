//! Single entry point that combines role permissions, instance scope and the
//! administrative capability policy.

use std::sync::Arc;

use crate::actor::{Actor, TargetAccount};
use crate::audit::{AuditSink, DecisionOutcome, DecisionRecord, DecisionSubject, TracingAuditSink};
use crate::engine::AuthorizationEngine;
use crate::error::AuthzError;
use crate::policy::{AdminAction, CapabilityPolicy, PolicyConfig};
use crate::registry::RoleRegistry;
use crate::resource::ScopedResource;
use crate::scope::{ScopeGrant, ScopeResolver};

#[derive(Clone)]
pub struct AccessGuard {
    engine: AuthorizationEngine,
    scope: ScopeResolver,
    policy: CapabilityPolicy,
    audit: Arc<dyn AuditSink>,
}

impl core::fmt::Debug for AccessGuard {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccessGuard")
            .field("engine", &self.engine)
            .field("policy", &self.policy.config())
            .finish_non_exhaustive()
    }
}

impl AccessGuard {
    pub fn new(registry: Arc<RoleRegistry>) -> Result<Self, AuthzError> {
        Self::with_policy(registry, PolicyConfig::default())
    }

    /// Fails when `config` does not fit the registry's catalog.
    pub fn with_policy(registry: Arc<RoleRegistry>, config: PolicyConfig) -> Result<Self, AuthzError> {
        let engine = AuthorizationEngine::new(registry);
        Ok(Self {
            policy: CapabilityPolicy::with_config(engine.clone(), config)?,
            engine,
            scope: ScopeResolver::new(),
            audit: Arc::new(TracingAuditSink),
        })
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    pub fn engine(&self) -> &AuthorizationEngine {
        &self.engine
    }

    pub fn scope(&self) -> &ScopeResolver {
        &self.scope
    }

    pub fn policy(&self) -> &CapabilityPolicy {
        &self.policy
    }

    /// Permission-only check (list pages, create forms).
    pub fn check_permission(&self, actor: &Actor, slug: &str) -> Result<(), AuthzError> {
        let result = self.engine.authorize(actor, slug);
        let outcome = match &result {
            Ok(()) => DecisionOutcome::Allowed,
            Err(AuthzError::PermissionDenied { .. }) => DecisionOutcome::PermissionDenied,
            Err(err) => return Err(fail(actor, err.clone())),
        };
        self.emit(actor, DecisionSubject::Permission { slug: slug.to_string() }, outcome);
        result
    }

    /// Operation on a specific resource instance: the role must hold `slug`
    /// and the scope resolver must admit the actor.
    pub fn check<R: ScopedResource + ?Sized>(
        &self,
        actor: &Actor,
        slug: &str,
        resource: &R,
    ) -> Result<ScopeGrant, AuthzError> {
        let result = self.engine.authorize(actor, slug).and_then(|()| {
            let action = slug.split_once('.').map(|(_, action)| action).unwrap_or(slug);
            self.scope.enforce(actor, resource, action)
        });

        let (outcome, scope) = match &result {
            Ok(grant) => (DecisionOutcome::Allowed, Some(*grant)),
            Err(AuthzError::PermissionDenied { .. }) => (DecisionOutcome::PermissionDenied, None),
            Err(AuthzError::ScopeDenied { .. }) => (DecisionOutcome::ScopeDenied, None),
            Err(err) => return Err(fail(actor, err.clone())),
        };
        self.emit(
            actor,
            DecisionSubject::Resource {
                slug: slug.to_string(),
                scope,
            },
            outcome,
        );
        result
    }

    /// Sensitive account-management action; supersedes the generic checks.
    pub fn check_admin_action(
        &self,
        actor: &Actor,
        target: &TargetAccount,
        action: AdminAction,
    ) -> Result<(), AuthzError> {
        let result = self.policy.enforce(actor, target, action);
        let outcome = match &result {
            Ok(()) => DecisionOutcome::Allowed,
            Err(AuthzError::CapabilityDenied { reason, .. }) => DecisionOutcome::CapabilityDenied {
                reason: reason.clone(),
            },
            Err(err) => return Err(fail(actor, err.clone())),
        };
        self.emit(
            actor,
            DecisionSubject::AdminAction {
                action,
                target: target.actor.id,
            },
            outcome,
        );
        result
    }

    fn emit(&self, actor: &Actor, subject: DecisionSubject, outcome: DecisionOutcome) {
        self.audit.record(&DecisionRecord::new(actor, subject, outcome));
    }
}

/// Misconfiguration surfaces loudly; it is never recorded as a routine denial.
fn fail(actor: &Actor, err: AuthzError) -> AuthzError {
    tracing::error!(actor = %actor.id, role = %actor.role, error = %err, "authorization failed");
    err
}
