//! Builds the permission catalog and the seed role registry from the
//! declarative module and role tables.
//!
//! Generation runs once at startup. Any dangling reference (unknown slug,
//! unknown module, missing global role) is returned as a [`ConfigError`] and
//! must abort boot.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::PermissionCatalog;
use crate::error::ConfigError;
use crate::grant::Grant;
use crate::registry::{RegistrySnapshot, RoleRegistry};
use crate::roles::{RoleDefinition, RoleId};

/// One row of the module table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Actions beyond the standard CRUD set.
    #[serde(default)]
    pub extra_actions: Vec<String>,
}

impl ModuleSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            extra_actions: Vec::new(),
        }
    }

    pub fn with_extra_actions<S: Into<String>>(mut self, actions: impl IntoIterator<Item = S>) -> Self {
        self.extra_actions = actions.into_iter().map(Into::into).collect();
        self
    }
}

/// One row of the role table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSpec {
    pub id: RoleId,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub grants: Vec<Grant>,
    #[serde(default)]
    pub accessible_modules: Vec<String>,
    #[serde(default)]
    pub system: bool,
}

impl RoleSpec {
    fn to_definition(&self) -> RoleDefinition {
        let mut definition = RoleDefinition::new(self.id.clone(), self.display_name.clone())
            .with_grants(self.grants.iter().cloned())
            .with_accessible_modules(self.accessible_modules.iter().cloned());
        definition.description = self.description.clone();
        definition.is_system = self.system;
        definition
    }
}

/// Static configuration the whole permission model is generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    /// The unscoped role above every organization.
    pub global_role: RoleId,
    pub modules: Vec<ModuleSpec>,
    #[serde(default)]
    pub roles: Vec<RoleSpec>,
}

/// Validated output of [`TaxonomyGenerator::generate`].
#[derive(Debug)]
pub struct Taxonomy {
    snapshot: RegistrySnapshot,
}

impl Taxonomy {
    pub fn catalog(&self) -> &Arc<PermissionCatalog> {
        self.snapshot.catalog()
    }

    pub fn global_role(&self) -> &RoleId {
        self.snapshot.global_role()
    }

    pub fn roles(&self) -> impl Iterator<Item = &RoleDefinition> {
        self.snapshot.roles().map(|r| r.definition())
    }

    /// Seed a registry from the generated taxonomy.
    pub fn into_registry(self) -> RoleRegistry {
        RoleRegistry::from_snapshot(self.snapshot)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TaxonomyGenerator;

impl TaxonomyGenerator {
    pub fn generate(config: &TaxonomyConfig) -> Result<Taxonomy, ConfigError> {
        let result = Self::build(config);
        match &result {
            Ok(taxonomy) => tracing::info!(
                modules = taxonomy.catalog().modules().count(),
                permissions = taxonomy.catalog().len(),
                roles = taxonomy.roles().count(),
                global_role = %config.global_role,
                "permission taxonomy generated"
            ),
            Err(err) => tracing::error!(error = %err, "permission taxonomy rejected"),
        }
        result
    }

    fn build(config: &TaxonomyConfig) -> Result<Taxonomy, ConfigError> {
        let catalog = Arc::new(PermissionCatalog::from_modules(&config.modules)?);
        let snapshot = RegistrySnapshot::build(
            catalog,
            config.global_role.clone(),
            config.roles.iter().map(RoleSpec::to_definition),
            1,
        )?;
        Ok(Taxonomy { snapshot })
    }
}
