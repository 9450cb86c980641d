//! Decision records handed to an external audit collaborator.
//!
//! The engine only emits; spotting sustained denial patterns is the
//! collaborator's job.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use scholaris_core::{ActorId, OrganizationId};

use crate::actor::Actor;
use crate::policy::{AdminAction, DenyReason};
use crate::roles::RoleId;
use crate::scope::ScopeGrant;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DecisionSubject {
    Permission { slug: String },
    Resource { slug: String, scope: Option<ScopeGrant> },
    AdminAction { action: AdminAction, target: ActorId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Allowed,
    PermissionDenied,
    ScopeDenied,
    CapabilityDenied { reason: DenyReason },
}

#[derive(Debug, Clone, Serialize)]
pub struct DecisionRecord {
    pub actor_id: ActorId,
    pub role: RoleId,
    pub organization_scope: Option<OrganizationId>,
    pub subject: DecisionSubject,
    pub outcome: DecisionOutcome,
    pub recorded_at: DateTime<Utc>,
}

impl DecisionRecord {
    pub fn new(actor: &Actor, subject: DecisionSubject, outcome: DecisionOutcome) -> Self {
        Self {
            actor_id: actor.id,
            role: actor.role.clone(),
            organization_scope: actor.organization_scope,
            subject,
            outcome,
            recorded_at: Utc::now(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.outcome == DecisionOutcome::Allowed
    }
}

pub trait AuditSink: Send + Sync {
    fn record(&self, record: &DecisionRecord);
}

/// Emits each decision as a structured `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: &DecisionRecord) {
        if record.is_allowed() {
            tracing::trace!(
                target: "scholaris::audit",
                actor = %record.actor_id,
                role = %record.role,
                subject = ?record.subject,
                "access allowed"
            );
        } else {
            tracing::debug!(
                target: "scholaris::audit",
                actor = %record.actor_id,
                role = %record.role,
                subject = ?record.subject,
                outcome = ?record.outcome,
                "access denied"
            );
        }
    }
}

/// Keeps every record in memory. Intended for tests/dev.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<DecisionRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<DecisionRecord> {
        self.lock().clone()
    }

    /// Records stay readable after a writer panicked mid-push.
    fn lock(&self) -> MutexGuard<'_, Vec<DecisionRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn denials(&self) -> usize {
        self.records().iter().filter(|r| !r.is_allowed()).count()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: &DecisionRecord) {
        self.lock().push(record.clone());
    }
}
