use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scholaris_core::{ActorId, OrganizationId};

use crate::resource::ScopedResource;
use crate::roles::RoleId;

/// A fully resolved actor for authorization decisions.
///
/// Built per request by the session layer; the engine never fetches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub role: RoleId,
    /// `None` means unscoped (global).
    pub organization_scope: Option<OrganizationId>,
    /// Ids this actor may act on by relationship (e.g. a guardian's dependents).
    #[serde(default)]
    pub relationship_subjects: BTreeSet<ActorId>,
}

impl Actor {
    /// An unscoped actor.
    pub fn new(id: ActorId, role: RoleId) -> Self {
        Self {
            id,
            role,
            organization_scope: None,
            relationship_subjects: BTreeSet::new(),
        }
    }

    pub fn in_organization(mut self, organization: OrganizationId) -> Self {
        self.organization_scope = Some(organization);
        self
    }

    pub fn with_relationship_subjects(mut self, subjects: impl IntoIterator<Item = ActorId>) -> Self {
        self.relationship_subjects.extend(subjects);
        self
    }

    pub fn is_unscoped(&self) -> bool {
        self.organization_scope.is_none()
    }
}

/// A user account that is the *target* of an administrative action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetAccount {
    pub actor: Actor,
    pub email_verified_at: Option<DateTime<Utc>>,
}

impl TargetAccount {
    pub fn new(actor: Actor) -> Self {
        Self {
            actor,
            email_verified_at: None,
        }
    }

    pub fn verified_at(mut self, at: DateTime<Utc>) -> Self {
        self.email_verified_at = Some(at);
        self
    }

    pub fn is_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }
}

/// An account is owned by itself and is the relationship subject for its
/// guardians.
impl ScopedResource for TargetAccount {
    fn organization_scope(&self) -> Option<OrganizationId> {
        self.actor.organization_scope
    }

    fn owner_id(&self) -> Option<ActorId> {
        Some(self.actor.id)
    }

    fn relationship_subject_id(&self) -> Option<ActorId> {
        Some(self.actor.id)
    }
}
