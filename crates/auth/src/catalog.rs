//! The enumerated set of valid permission slugs.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use scholaris_core::validate_identifier;

use crate::error::ConfigError;
use crate::grant::Grant;
use crate::permissions::{CRUD_ACTIONS, PermissionDefinition, PermissionSlug};
use crate::taxonomy::ModuleSpec;

/// A module and the actions it exposes (CRUD first, then its own extensions).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleDefinition {
    pub name: String,
    pub description: String,
    pub actions: Vec<String>,
}

/// Immutable catalog of every permission the system knows about.
///
/// Built from the declarative module table only; ordered maps keep every
/// enumeration deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PermissionCatalog {
    modules: BTreeMap<String, ModuleDefinition>,
    permissions: BTreeMap<PermissionSlug, PermissionDefinition>,
}

impl PermissionCatalog {
    pub fn from_modules<'a>(
        specs: impl IntoIterator<Item = &'a ModuleSpec>,
    ) -> Result<Self, ConfigError> {
        let mut catalog = Self::default();

        for spec in specs {
            validate_identifier("module", &spec.name)?;
            if catalog.modules.contains_key(&spec.name) {
                return Err(ConfigError::DuplicateModule(spec.name.clone()));
            }

            let mut actions: Vec<String> = CRUD_ACTIONS.iter().map(|a| a.to_string()).collect();
            for extra in &spec.extra_actions {
                validate_identifier("action", extra)?;
                if actions.contains(extra) {
                    return Err(ConfigError::DuplicatePermission(format!(
                        "{}.{}",
                        spec.name, extra
                    )));
                }
                actions.push(extra.clone());
            }

            for action in &actions {
                let def = PermissionDefinition::new(&spec.name, action, &spec.description);
                catalog.permissions.insert(def.slug.clone(), def);
            }

            catalog.modules.insert(
                spec.name.clone(),
                ModuleDefinition {
                    name: spec.name.clone(),
                    description: spec.description.clone(),
                    actions,
                },
            );
        }

        Ok(catalog)
    }

    pub fn all_permissions(&self) -> BTreeSet<PermissionSlug> {
        self.permissions.keys().cloned().collect()
    }

    /// Permissions of `module`; empty for an unknown module.
    pub fn permissions_for_module(&self, module: &str) -> BTreeSet<PermissionSlug> {
        self.modules
            .get(module)
            .map(|m| {
                m.actions
                    .iter()
                    .map(|action| PermissionSlug::of(&m.name, action))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn exists(&self, slug: &str) -> bool {
        self.permissions.contains_key(slug)
    }

    pub fn get(&self, slug: &str) -> Option<&PermissionDefinition> {
        self.permissions.get(slug)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &PermissionDefinition> {
        self.permissions.values()
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleDefinition> {
        self.modules.values()
    }

    pub fn module(&self, name: &str) -> Option<&ModuleDefinition> {
        self.modules.get(name)
    }

    pub fn has_module(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Expand grant patterns into the concrete slugs they cover.
    ///
    /// Exact grants outside the catalog contribute nothing.
    pub fn expand<'a>(&self, grants: impl IntoIterator<Item = &'a Grant>) -> BTreeSet<PermissionSlug> {
        let mut out = BTreeSet::new();
        for grant in grants {
            match grant {
                Grant::AllAccess => return self.all_permissions(),
                Grant::ModuleWildcard(module) => out.extend(self.permissions_for_module(module)),
                Grant::Exact(slug) => {
                    if self.exists(slug.as_str()) {
                        out.insert(slug.clone());
                    }
                }
            }
        }
        out
    }

    /// Check a grant against the catalog on behalf of `role`.
    pub(crate) fn validate_grant(&self, role: &crate::roles::RoleId, grant: &Grant) -> Result<(), ConfigError> {
        match grant {
            Grant::AllAccess => Ok(()),
            Grant::ModuleWildcard(module) if self.has_module(module) => Ok(()),
            Grant::ModuleWildcard(module) => Err(ConfigError::UnknownModule {
                role: role.clone(),
                module: module.clone(),
            }),
            Grant::Exact(slug) if self.exists(slug.as_str()) => Ok(()),
            Grant::Exact(slug) => Err(ConfigError::UnknownPermission {
                role: role.clone(),
                slug: slug.to_string(),
            }),
        }
    }
}
