use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;

use scholaris_core::{ActorId, OrganizationId};

use crate::actor::Actor;
use crate::error::AuthzError;
use crate::grant::Grant;
use crate::permissions::PermissionSlug;
use crate::registry::{RegistrySnapshot, ResolvedRole, RoleRegistry};
use crate::roles::RoleId;

/// Role-based permission checks.
///
/// - No IO
/// - No panics
/// - Every call decides against one registry snapshot
#[derive(Debug, Clone)]
pub struct AuthorizationEngine {
    registry: Arc<RoleRegistry>,
}

impl AuthorizationEngine {
    pub fn new(registry: Arc<RoleRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<RoleRegistry> {
        &self.registry
    }

    pub fn has_permission(&self, actor: &Actor, slug: &str) -> Result<bool, AuthzError> {
        let snapshot = self.registry.snapshot()?;
        let role = snapshot.role(&actor.role)?;
        Ok(holds(&snapshot, role, actor, slug))
    }

    /// True as soon as one slug is held; false for an empty list.
    pub fn has_any<I, S>(&self, actor: &Actor, slugs: I) -> Result<bool, AuthzError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let snapshot = self.registry.snapshot()?;
        let role = snapshot.role(&actor.role)?;
        Ok(slugs
            .into_iter()
            .any(|slug| holds(&snapshot, role, actor, slug.as_ref())))
    }

    /// False as soon as one slug is missing; true for an empty list.
    pub fn has_all<I, S>(&self, actor: &Actor, slugs: I) -> Result<bool, AuthzError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let snapshot = self.registry.snapshot()?;
        let role = snapshot.role(&actor.role)?;
        Ok(slugs
            .into_iter()
            .all(|slug| holds(&snapshot, role, actor, slug.as_ref())))
    }

    /// Fail-fast variant of [`AuthorizationEngine::has_permission`].
    pub fn authorize(&self, actor: &Actor, slug: &str) -> Result<(), AuthzError> {
        if self.has_permission(actor, slug)? {
            Ok(())
        } else {
            tracing::debug!(actor = %actor.id, role = %actor.role, permission = slug, "permission denied");
            Err(AuthzError::PermissionDenied {
                slug: slug.to_string(),
            })
        }
    }

    /// Every module/action in the catalog, `true` where the actor's role holds
    /// it. The shape is the same for every role.
    pub fn capabilities_for(&self, actor: &Actor) -> Result<CapabilityMatrix, AuthzError> {
        let snapshot = self.registry.snapshot()?;
        let role = snapshot.role(&actor.role)?;

        let mut matrix: BTreeMap<String, BTreeMap<String, bool>> = BTreeMap::new();
        for module in snapshot.catalog().modules() {
            let actions = module
                .actions
                .iter()
                .map(|action| {
                    let allowed = role.holds(PermissionSlug::of(&module.name, action).as_str());
                    (action.clone(), allowed)
                })
                .collect();
            matrix.insert(module.name.clone(), actions);
        }

        Ok(CapabilityMatrix(matrix))
    }

    /// Navigation/menu signal. Not an authorization decision.
    pub fn accessible_modules(&self, actor: &Actor) -> Result<BTreeSet<String>, AuthzError> {
        self.registry.accessible_modules(&actor.role)
    }

    /// Explain why a permission check would be allowed or denied.
    pub fn explain(&self, actor: &Actor, slug: &str) -> Result<AuthorizationExplanation, AuthzError> {
        let snapshot = self.registry.snapshot()?;
        let role = snapshot.role(&actor.role)?;

        let state = ActorState {
            actor_id: actor.id,
            role: actor.role.clone(),
            organization_scope: actor.organization_scope,
            effective_permission_count: role.effective_permissions().len(),
            has_all_access: role.definition().has_all_access(),
        };

        let Some(definition) = snapshot.catalog().get(slug) else {
            return Ok(AuthorizationExplanation {
                required_permission: slug.to_string(),
                granted: false,
                in_catalog: false,
                matched_grant: None,
                reason: format!("Permission '{slug}' does not exist in the catalog"),
                actor: state,
                denial_reason: Some(DenialReason {
                    kind: DenialKind::UnknownPermission,
                    message: format!("'{slug}' is not a catalog permission"),
                    suggestions: vec![
                        "Check the spelling against the permission catalog (module.action)".to_string(),
                        "Add the action to the module table if it is a new capability".to_string(),
                    ],
                }),
            });
        };

        if let Some(grant) = role.matching_grant(&definition.slug) {
            let reason = match grant {
                Grant::AllAccess => format!("Role '{}' holds all-access '*'", actor.role),
                Grant::ModuleWildcard(module) => {
                    format!("Role '{}' holds module wildcard '{module}.*'", actor.role)
                }
                Grant::Exact(_) => format!("Role '{}' holds '{slug}' explicitly", actor.role),
            };
            return Ok(AuthorizationExplanation {
                required_permission: slug.to_string(),
                granted: true,
                in_catalog: true,
                matched_grant: Some(grant.clone()),
                reason,
                actor: state,
                denial_reason: None,
            });
        }

        let granting_roles = snapshot.roles_granting(slug);
        let mut suggestions = vec![
            format!("Assign a role that grants '{slug}'"),
            format!("Add '{slug}' or '{}.*' to role '{}'", definition.module, actor.role),
        ];
        if !granting_roles.is_empty() {
            let names: Vec<&str> = granting_roles.iter().map(|r| r.as_str()).collect();
            suggestions.insert(0, format!("Roles that grant it: {}", names.join(", ")));
        }

        Ok(AuthorizationExplanation {
            required_permission: slug.to_string(),
            granted: false,
            in_catalog: true,
            matched_grant: None,
            reason: format!("Role '{}' does not grant '{slug}'", actor.role),
            actor: state,
            denial_reason: Some(DenialReason {
                kind: DenialKind::MissingPermission,
                message: format!("Missing required permission: '{slug}'"),
                suggestions,
            }),
        })
    }
}

fn holds(snapshot: &RegistrySnapshot, role: &ResolvedRole, actor: &Actor, slug: &str) -> bool {
    if role.holds(slug) {
        return true;
    }
    if !snapshot.catalog().exists(slug) {
        tracing::debug!(actor = %actor.id, permission = slug, "checked permission is not in the catalog");
    }
    false
}

/// `{module: {action: allowed}}`, total over the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CapabilityMatrix(BTreeMap<String, BTreeMap<String, bool>>);

impl CapabilityMatrix {
    pub fn is_allowed(&self, module: &str, action: &str) -> bool {
        self.0
            .get(module)
            .and_then(|actions| actions.get(action))
            .copied()
            .unwrap_or(false)
    }

    /// Number of module/action entries (equals the catalog size).
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn module(&self, module: &str) -> Option<&BTreeMap<String, bool>> {
        self.0.get(module)
    }

    /// Slugs whose entry is `true`.
    pub fn granted(&self) -> BTreeSet<PermissionSlug> {
        self.0
            .iter()
            .flat_map(|(module, actions)| {
                actions
                    .iter()
                    .filter(|(_, allowed)| **allowed)
                    .map(move |(action, _)| PermissionSlug::of(module, action))
            })
            .collect()
    }

    pub fn as_map(&self) -> &BTreeMap<String, BTreeMap<String, bool>> {
        &self.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of a permission decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub required_permission: String,
    pub granted: bool,
    pub in_catalog: bool,
    /// The grant that covered the permission, when granted.
    pub matched_grant: Option<Grant>,
    pub reason: String,
    pub actor: ActorState,
    pub denial_reason: Option<DenialReason>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActorState {
    pub actor_id: ActorId,
    pub role: RoleId,
    pub organization_scope: Option<OrganizationId>,
    pub effective_permission_count: usize,
    pub has_all_access: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DenialReason {
    pub kind: DenialKind,
    pub message: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    UnknownPermission,
    MissingPermission,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PermissionCatalog;
    use crate::error::ConfigError;
    use crate::taxonomy::ModuleSpec;
    use crate::roles::RoleDefinition;
    use proptest::prelude::*;

    const MODULES: [&str; 3] = ["student", "attendance", "fee"];
    const ACTIONS: [&str; 9] = [
        "view", "create", "edit", "update", "delete", "manage", "promote", "mark", "collect",
    ];

    fn catalog() -> Arc<PermissionCatalog> {
        Arc::new(
            PermissionCatalog::from_modules(&[
                ModuleSpec::new("student", "Students").with_extra_actions(["promote"]),
                ModuleSpec::new("attendance", "Attendance").with_extra_actions(["mark"]),
                ModuleSpec::new("fee", "Fees").with_extra_actions(["collect"]),
            ])
            .unwrap(),
        )
    }

    fn engine_with(grants: Vec<Grant>) -> AuthorizationEngine {
        let registry = RoleRegistry::new(
            catalog(),
            RoleId::new("root"),
            [
                RoleDefinition::new(RoleId::new("root"), "Root").system().with_grants([Grant::AllAccess]),
                RoleDefinition::new(RoleId::new("subject"), "Subject")
                    .with_grants(grants)
                    .with_accessible_modules(["attendance"]),
            ],
        )
        .unwrap();
        AuthorizationEngine::new(Arc::new(registry))
    }

    fn actor(role: &'static str) -> Actor {
        Actor::new(ActorId::from_u128(1), RoleId::new(role))
    }

    fn grant(text: &str) -> Grant {
        Grant::parse(text).unwrap()
    }

    #[test]
    fn exact_grant_holds_only_itself() {
        let engine = engine_with(vec![grant("attendance.mark")]);
        let teacher = actor("subject");
        assert!(engine.has_permission(&teacher, "attendance.mark").unwrap());
        assert!(!engine.has_permission(&teacher, "attendance.delete").unwrap());
    }

    #[test]
    fn module_wildcard_covers_specific_actions() {
        let engine = engine_with(vec![grant("student.*")]);
        assert!(engine.has_permission(&actor("subject"), "student.promote").unwrap());
        assert!(!engine.has_permission(&actor("subject"), "fee.view").unwrap());
    }

    #[test]
    fn unknown_slug_is_simply_not_held() {
        let engine = engine_with(vec![grant("student.*")]);
        assert!(!engine.has_permission(&actor("subject"), "student.teleport").unwrap());
        assert!(!engine.has_permission(&actor("root"), "garbage").unwrap());
    }

    #[test]
    fn unknown_role_fails_hard() {
        let engine = engine_with(vec![]);
        let err = engine.has_permission(&actor("ghost"), "fee.view").unwrap_err();
        assert_eq!(err, AuthzError::UnknownRole { role: RoleId::new("ghost") });
        assert!(engine.authorize(&actor("ghost"), "fee.view").is_err());
    }

    #[test]
    fn any_and_all_combinators() {
        let engine = engine_with(vec![grant("fee.collect"), grant("attendance.*")]);
        let a = actor("subject");
        assert!(engine.has_any(&a, ["fee.refund", "attendance.mark"]).unwrap());
        assert!(!engine.has_any(&a, ["fee.view", "student.view"]).unwrap());
        assert!(engine.has_all(&a, ["fee.collect", "attendance.view"]).unwrap());
        assert!(!engine.has_all(&a, ["fee.collect", "fee.view"]).unwrap());
        assert!(!engine.has_any(&a, Vec::<&str>::new()).unwrap());
        assert!(engine.has_all(&a, Vec::<String>::new()).unwrap());
    }

    #[test]
    fn authorize_raises_permission_denied_with_slug() {
        let engine = engine_with(vec![grant("fee.collect")]);
        assert!(engine.authorize(&actor("subject"), "fee.collect").is_ok());
        assert_eq!(
            engine.authorize(&actor("subject"), "fee.delete").unwrap_err(),
            AuthzError::PermissionDenied { slug: "fee.delete".into() }
        );
    }

    #[test]
    fn capability_matrix_is_total_over_catalog() {
        let engine = engine_with(vec![grant("attendance.mark")]);
        let matrix = engine.capabilities_for(&actor("subject")).unwrap();
        assert_eq!(matrix.len(), catalog().len());
        assert!(matrix.is_allowed("attendance", "mark"));
        assert!(!matrix.is_allowed("attendance", "view"));
        assert_eq!(matrix.module("fee").unwrap().get("collect"), Some(&false));
        assert_eq!(matrix.granted().len(), 1);

        let root = engine.capabilities_for(&actor("root")).unwrap();
        assert_eq!(root.len(), matrix.len());
        assert_eq!(root.granted(), catalog().all_permissions());
    }

    #[test]
    fn capability_matrix_serializes_as_nested_map() {
        let engine = engine_with(vec![grant("fee.collect")]);
        let json = serde_json::to_value(engine.capabilities_for(&actor("subject")).unwrap()).unwrap();
        assert_eq!(json["fee"]["collect"], serde_json::Value::Bool(true));
        assert_eq!(json["fee"]["view"], serde_json::Value::Bool(false));
    }

    #[test]
    fn accessible_modules_come_from_role_not_grants() {
        let engine = engine_with(vec![grant("fee.collect")]);
        let modules = engine.accessible_modules(&actor("subject")).unwrap();
        assert_eq!(modules.into_iter().collect::<Vec<_>>(), vec!["attendance".to_string()]);
    }

    #[test]
    fn explain_names_matching_grant_and_alternatives() {
        let engine = engine_with(vec![grant("student.*")]);

        let granted = engine.explain(&actor("subject"), "student.promote").unwrap();
        assert!(granted.granted);
        assert_eq!(granted.matched_grant, Some(grant("student.*")));

        let denied = engine.explain(&actor("subject"), "fee.collect").unwrap();
        assert!(!denied.granted);
        assert!(denied.in_catalog);
        let reason = denied.denial_reason.unwrap();
        assert_eq!(reason.kind, DenialKind::MissingPermission);
        assert!(reason.suggestions[0].contains("root"));

        let unknown = engine.explain(&actor("root"), "fee.teleport").unwrap();
        assert!(!unknown.granted);
        assert!(!unknown.in_catalog);
        assert_eq!(unknown.denial_reason.unwrap().kind, DenialKind::UnknownPermission);
    }

    fn arb_grant() -> impl Strategy<Value = Grant> {
        prop_oneof![
            1 => Just(Grant::AllAccess),
            3 => prop::sample::select(MODULES.to_vec()).prop_map(|m| Grant::module(m)),
            6 => prop::sample::select(catalog().all_permissions().into_iter().collect::<Vec<_>>())
                .prop_map(Grant::Exact),
        ]
    }

    #[test]
    fn exact_grant_outside_catalog_is_rejected_at_build() {
        let err = RoleRegistry::new(
            catalog(),
            RoleId::new("root"),
            [
                RoleDefinition::new(RoleId::new("root"), "Root").system().with_grants([Grant::AllAccess]),
                RoleDefinition::new(RoleId::new("subject"), "Subject").with_grants([grant("student.mark")]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPermission { .. }));
    }

    /// Straightforward reading of the grant rules, independent of the catalog's
    /// `expand`.
    fn reference_holds(grants: &[Grant], catalog: &PermissionCatalog, module: &str, action: &str) -> bool {
        let slug = format!("{module}.{action}");
        catalog.exists(&slug)
            && grants.iter().any(|g| match g {
                Grant::AllAccess => true,
                Grant::ModuleWildcard(m) => m == module,
                Grant::Exact(s) => s.as_str() == slug,
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: has_permission agrees with a reference expansion for any
        /// module/action pair.
        #[test]
        fn has_permission_matches_reference_expansion(
            grants in prop::collection::vec(arb_grant(), 0..6),
            module in prop::sample::select(MODULES.to_vec()),
            action in prop::sample::select(ACTIONS.to_vec()),
        ) {
            let catalog = catalog();
            let engine = engine_with(grants.clone());
            let slug = format!("{module}.{action}");
            prop_assert_eq!(
                engine.has_permission(&actor("subject"), &slug).unwrap(),
                reference_holds(&grants, &catalog, module, action)
            );
        }

        /// Property: expanding an already expanded set changes nothing.
        #[test]
        fn expansion_is_idempotent(grants in prop::collection::vec(arb_grant(), 0..6)) {
            let catalog = catalog();
            let once = catalog.expand(&grants);
            let as_grants: Vec<Grant> = once.iter().cloned().map(Grant::exact).collect();
            prop_assert_eq!(catalog.expand(&as_grants), once);
        }
    }
}
