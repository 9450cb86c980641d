//! Subcommand handlers. Each one builds the engine from a loaded
//! [`FileConfig`] and prints to stdout.

use std::sync::Arc;

use anyhow::{Context, Result, bail};

use scholaris_auth::{
    Actor, AdminAction, AuthorizationEngine, CapabilityPolicy, PolicyDecision, RoleId, TargetAccount, Taxonomy,
    TaxonomyGenerator,
};
use scholaris_core::{ActorId, OrganizationId};

use crate::config::FileConfig;

/// Engine pieces assembled from one taxonomy file.
pub struct Workspace {
    pub engine: AuthorizationEngine,
    pub policy: CapabilityPolicy,
}

impl Workspace {
    pub fn build(config: &FileConfig) -> Result<Self> {
        let taxonomy = generate(config)?;
        let engine = AuthorizationEngine::new(Arc::new(taxonomy.into_registry()));
        let policy = CapabilityPolicy::with_config(engine.clone(), config.policy.clone())
            .context("policy does not fit the taxonomy")?;
        Ok(Self { engine, policy })
    }
}

fn generate(config: &FileConfig) -> Result<Taxonomy> {
    TaxonomyGenerator::generate(&config.taxonomy).context("taxonomy is invalid")
}

pub fn validate(config: &FileConfig) -> Result<()> {
    let taxonomy = generate(config)?;
    Workspace::build(config)?;
    println!(
        "ok: {} modules, {} permissions, {} roles (global role: {})",
        taxonomy.catalog().modules().count(),
        taxonomy.catalog().len(),
        taxonomy.roles().count(),
        taxonomy.global_role(),
    );
    Ok(())
}

pub fn permissions(config: &FileConfig, module: Option<&str>, json: bool) -> Result<()> {
    let taxonomy = generate(config)?;
    let catalog = taxonomy.catalog();

    if let Some(module) = module {
        if !catalog.has_module(module) {
            bail!("unknown module '{module}'");
        }
    }

    let definitions: Vec<_> = catalog
        .definitions()
        .filter(|d| module.is_none_or(|m| d.module == m))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&definitions)?);
        return Ok(());
    }
    for definition in definitions {
        println!("{:<36} {:<9} {}", definition.slug, definition.category, definition.display_name);
    }
    Ok(())
}

pub fn roles(config: &FileConfig) -> Result<()> {
    let workspace = Workspace::build(config)?;
    let snapshot = workspace.engine.registry().snapshot()?;

    for role in snapshot.roles() {
        let definition = role.definition();
        let mut flags = Vec::new();
        if snapshot.is_global(role.id()) {
            flags.push("global");
        }
        if definition.is_system {
            flags.push("system");
        }
        println!(
            "{:<16} {:<24} {:>4} permissions  [{}]",
            role.id(),
            definition.display_name,
            role.effective_permissions().len(),
            flags.join(","),
        );
        if !definition.accessible_modules.is_empty() {
            let modules: Vec<&str> = definition.accessible_modules.iter().map(String::as_str).collect();
            println!("{:<16} nav: {}", "", modules.join(", "));
        }
    }
    Ok(())
}

pub fn capabilities(config: &FileConfig, role: RoleId, json: bool) -> Result<()> {
    let workspace = Workspace::build(config)?;
    let actor = Actor::new(ActorId::from_u128(1), role);
    let matrix = workspace.engine.capabilities_for(&actor)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&matrix)?);
        return Ok(());
    }
    for (module, actions) in matrix.as_map() {
        let granted: Vec<&str> = actions
            .iter()
            .filter(|(_, allowed)| **allowed)
            .map(|(action, _)| action.as_str())
            .collect();
        if !granted.is_empty() {
            println!("{module:<20} {}", granted.join(" "));
        }
    }
    Ok(())
}

pub fn explain(config: &FileConfig, role: RoleId, permission: &str) -> Result<()> {
    let workspace = Workspace::build(config)?;
    let actor = Actor::new(ActorId::from_u128(1), role);
    let explanation = workspace.engine.explain(&actor, permission)?;
    println!("{}", serde_json::to_string_pretty(&explanation)?);
    Ok(())
}

/// Parties of a hypothetical administrative action.
pub struct AdminCheck {
    pub action: AdminAction,
    pub actor_role: RoleId,
    pub actor_org: Option<OrganizationId>,
    pub target_role: RoleId,
    pub target_org: Option<OrganizationId>,
    pub target_verified: bool,
    pub same_account: bool,
}

impl AdminCheck {
    fn parties(&self) -> (Actor, TargetAccount) {
        let actor_id = ActorId::from_u128(1);
        let target_id = if self.same_account { actor_id } else { ActorId::from_u128(2) };

        let mut actor = Actor::new(actor_id, self.actor_role.clone());
        actor.organization_scope = self.actor_org;
        let mut target = Actor::new(target_id, self.target_role.clone());
        target.organization_scope = self.target_org;

        let mut account = TargetAccount::new(target);
        if self.target_verified {
            account = account.verified_at(chrono::Utc::now());
        }
        (actor, account)
    }
}

/// Returns whether the action is allowed.
pub fn admin_check(config: &FileConfig, check: &AdminCheck) -> Result<bool> {
    let workspace = Workspace::build(config)?;
    let (actor, target) = check.parties();

    match workspace.policy.evaluate(&actor, &target, check.action)? {
        PolicyDecision::Allow => {
            println!("allow: {} may {} {}", check.actor_role, check.action, check.target_role);
            Ok(true)
        }
        PolicyDecision::Deny(reason) => {
            println!("deny: {reason}");
            Ok(false)
        }
    }
}
