use serde::{Deserialize, Serialize};

use scholaris_core::{ActorId, OrganizationId};

/// Anything an actor may act on, as seen by the scope resolver.
///
/// Implemented by data-access snapshots. All three accessors are optional: a
/// resource with none of them set is reachable only by unscoped actors.
pub trait ScopedResource {
    fn organization_scope(&self) -> Option<OrganizationId>;

    fn owner_id(&self) -> Option<ActorId> {
        None
    }

    fn relationship_subject_id(&self) -> Option<ActorId> {
        None
    }
}

impl<T: ScopedResource + ?Sized> ScopedResource for &T {
    fn organization_scope(&self) -> Option<OrganizationId> {
        (**self).organization_scope()
    }

    fn owner_id(&self) -> Option<ActorId> {
        (**self).owner_id()
    }

    fn relationship_subject_id(&self) -> Option<ActorId> {
        (**self).relationship_subject_id()
    }
}

/// Plain resource snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceScope {
    pub organization_scope: Option<OrganizationId>,
    pub owner_id: Option<ActorId>,
    pub relationship_subject_id: Option<ActorId>,
}

impl ResourceScope {
    pub fn in_organization(organization: OrganizationId) -> Self {
        Self {
            organization_scope: Some(organization),
            ..Self::default()
        }
    }

    pub fn owned_by(mut self, owner: ActorId) -> Self {
        self.owner_id = Some(owner);
        self
    }

    pub fn about(mut self, subject: ActorId) -> Self {
        self.relationship_subject_id = Some(subject);
        self
    }
}

impl ScopedResource for ResourceScope {
    fn organization_scope(&self) -> Option<OrganizationId> {
        self.organization_scope
    }

    fn owner_id(&self) -> Option<ActorId> {
        self.owner_id
    }

    fn relationship_subject_id(&self) -> Option<ActorId> {
        self.relationship_subject_id
    }
}
