//! Role → grant registry with atomic snapshot replacement.
//!
//! Readers clone an `Arc<RegistrySnapshot>` and decide against it without
//! holding any lock. Writers are serialized, build a complete replacement
//! snapshot off to the side, validate it, and publish it with a single pointer
//! swap, so no reader ever observes a half-edited role.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, RwLock};

use scholaris_core::validate_identifier;

use crate::catalog::PermissionCatalog;
use crate::error::{AuthzError, ConfigError};
use crate::grant::{Grant, dedup_grants};
use crate::permissions::PermissionSlug;
use crate::roles::{RoleDefinition, RoleId};

/// A role together with its memoized effective permission set.
#[derive(Debug)]
pub struct ResolvedRole {
    definition: RoleDefinition,
    effective: Arc<BTreeSet<PermissionSlug>>,
}

impl ResolvedRole {
    pub fn definition(&self) -> &RoleDefinition {
        &self.definition
    }

    pub fn id(&self) -> &RoleId {
        &self.definition.id
    }

    pub fn effective_permissions(&self) -> &Arc<BTreeSet<PermissionSlug>> {
        &self.effective
    }

    pub fn holds(&self, slug: &str) -> bool {
        self.effective.contains(slug)
    }

    /// First grant (in declaration order) that covers `slug`.
    pub fn matching_grant(&self, slug: &PermissionSlug) -> Option<&Grant> {
        if !self.effective.contains(slug.as_str()) {
            return None;
        }
        self.definition.grants.iter().find(|g| g.matches(slug))
    }
}

/// Immutable, fully validated view of the catalog and every role.
#[derive(Debug)]
pub struct RegistrySnapshot {
    catalog: Arc<PermissionCatalog>,
    global_role: RoleId,
    roles: BTreeMap<RoleId, Arc<ResolvedRole>>,
    version: u64,
}

impl RegistrySnapshot {
    pub(crate) fn build(
        catalog: Arc<PermissionCatalog>,
        global_role: RoleId,
        definitions: impl IntoIterator<Item = RoleDefinition>,
        version: u64,
    ) -> Result<Self, ConfigError> {
        let mut roles = BTreeMap::new();

        for mut definition in definitions {
            validate_identifier("role", definition.id.as_str())?;
            if roles.contains_key(&definition.id) {
                return Err(ConfigError::DuplicateRole(definition.id));
            }

            definition.grants = dedup_grants(definition.grants);
            for grant in &definition.grants {
                catalog.validate_grant(&definition.id, grant)?;
            }
            if let Some(module) = definition
                .accessible_modules
                .iter()
                .find(|m| !catalog.has_module(m))
            {
                return Err(ConfigError::UnknownModule {
                    role: definition.id.clone(),
                    module: module.clone(),
                });
            }

            let effective = Arc::new(catalog.expand(&definition.grants));
            roles.insert(
                definition.id.clone(),
                Arc::new(ResolvedRole { definition, effective }),
            );
        }

        match roles.get(&global_role) {
            None => return Err(ConfigError::MissingGlobalRole(global_role)),
            Some(role) if !role.definition.is_system => {
                return Err(ConfigError::GlobalRoleNotSystem(global_role));
            }
            Some(_) => {}
        }

        Ok(Self {
            catalog,
            global_role,
            roles,
            version,
        })
    }

    pub fn catalog(&self) -> &Arc<PermissionCatalog> {
        &self.catalog
    }

    /// The unscoped, all-access role that sits above every tenant.
    pub fn global_role(&self) -> &RoleId {
        &self.global_role
    }

    pub fn is_global(&self, role: &RoleId) -> bool {
        &self.global_role == role
    }

    pub fn role(&self, id: &RoleId) -> Result<&Arc<ResolvedRole>, AuthzError> {
        self.roles
            .get(id)
            .ok_or_else(|| AuthzError::UnknownRole { role: id.clone() })
    }

    pub fn roles(&self) -> impl Iterator<Item = &Arc<ResolvedRole>> {
        self.roles.values()
    }

    /// Monotonic counter bumped by every administrative edit.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Roles whose effective set contains `slug`.
    pub fn roles_granting(&self, slug: &str) -> Vec<RoleId> {
        self.roles
            .values()
            .filter(|r| r.holds(slug))
            .map(|r| r.id().clone())
            .collect()
    }

    fn definitions(&self) -> BTreeMap<RoleId, RoleDefinition> {
        self.roles
            .iter()
            .map(|(id, r)| (id.clone(), r.definition.clone()))
            .collect()
    }
}

/// Shared role registry.
#[derive(Debug)]
pub struct RoleRegistry {
    current: RwLock<Arc<RegistrySnapshot>>,
    writer: Mutex<()>,
}

impl RoleRegistry {
    pub fn new(
        catalog: Arc<PermissionCatalog>,
        global_role: RoleId,
        roles: impl IntoIterator<Item = RoleDefinition>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::from_snapshot(RegistrySnapshot::build(
            catalog,
            global_role,
            roles,
            1,
        )?))
    }

    pub(crate) fn from_snapshot(snapshot: RegistrySnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
            writer: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> Result<Arc<RegistrySnapshot>, AuthzError> {
        self.current
            .read()
            .map(|guard| Arc::clone(&*guard))
            .map_err(|_| AuthzError::RegistryUnavailable)
    }

    pub fn role(&self, id: &RoleId) -> Result<Arc<ResolvedRole>, AuthzError> {
        self.snapshot()?.role(id).cloned()
    }

    /// Union of the role's exact grants, wildcarded modules, and the whole
    /// catalog when it holds all-access.
    pub fn effective_permissions(&self, id: &RoleId) -> Result<Arc<BTreeSet<PermissionSlug>>, AuthzError> {
        Ok(Arc::clone(self.role(id)?.effective_permissions()))
    }

    pub fn accessible_modules(&self, id: &RoleId) -> Result<BTreeSet<String>, AuthzError> {
        Ok(self.role(id)?.definition().accessible_modules.clone())
    }

    /// Replace the grants of a non-system role.
    pub fn update(
        &self,
        id: &RoleId,
        grants: impl IntoIterator<Item = Grant>,
    ) -> Result<Arc<RegistrySnapshot>, AuthzError> {
        let grants = dedup_grants(grants);
        self.mutate("update_grants", id, |roles| {
            let role = editable(roles, id)?;
            role.grants = grants;
            Ok(())
        })
    }

    pub fn set_accessible_modules<S: Into<String>>(
        &self,
        id: &RoleId,
        modules: impl IntoIterator<Item = S>,
    ) -> Result<Arc<RegistrySnapshot>, AuthzError> {
        let modules: BTreeSet<String> = modules.into_iter().map(Into::into).collect();
        self.mutate("set_accessible_modules", id, |roles| {
            editable(roles, id)?.accessible_modules = modules;
            Ok(())
        })
    }

    /// Add a custom role. System roles only come from the startup taxonomy.
    pub fn insert_role(&self, definition: RoleDefinition) -> Result<Arc<RegistrySnapshot>, AuthzError> {
        let id = definition.id.clone();
        self.mutate("insert_role", &id, |roles| {
            if definition.is_system {
                return Err(AuthzError::SystemRoleImmutable { role: definition.id.clone() });
            }
            if roles.contains_key(&definition.id) {
                return Err(AuthzError::RoleExists { role: definition.id.clone() });
            }
            roles.insert(definition.id.clone(), definition);
            Ok(())
        })
    }

    pub fn remove_role(&self, id: &RoleId) -> Result<Arc<RegistrySnapshot>, AuthzError> {
        self.mutate("remove_role", id, |roles| {
            editable(roles, id)?;
            roles.remove(id);
            Ok(())
        })
    }

    fn mutate<F>(&self, operation: &'static str, id: &RoleId, edit: F) -> Result<Arc<RegistrySnapshot>, AuthzError>
    where
        F: FnOnce(&mut BTreeMap<RoleId, RoleDefinition>) -> Result<(), AuthzError>,
    {
        let _writer = self.writer.lock().map_err(|_| AuthzError::RegistryUnavailable)?;

        let current = self.snapshot()?;
        let mut definitions = current.definitions();
        edit(&mut definitions)?;

        let next = Arc::new(RegistrySnapshot::build(
            Arc::clone(&current.catalog),
            current.global_role.clone(),
            definitions.into_values(),
            current.version + 1,
        )?);

        {
            let mut slot = self.current.write().map_err(|_| AuthzError::RegistryUnavailable)?;
            *slot = Arc::clone(&next);
        }

        tracing::info!(role = %id, operation, version = next.version, "role registry snapshot replaced");
        Ok(next)
    }
}

fn editable<'a>(
    roles: &'a mut BTreeMap<RoleId, RoleDefinition>,
    id: &RoleId,
) -> Result<&'a mut RoleDefinition, AuthzError> {
    let role = roles
        .get_mut(id)
        .ok_or_else(|| AuthzError::UnknownRole { role: id.clone() })?;
    if role.is_system {
        return Err(AuthzError::SystemRoleImmutable { role: id.clone() });
    }
    Ok(role)
}
