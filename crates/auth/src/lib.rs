//! `scholaris-auth` — permission engine for the school-management backend.
//!
//! Role grants, tenant/relationship scope and actor-vs-actor administrative
//! policy. Pure decisions over caller-supplied snapshots: this crate is
//! decoupled from HTTP and storage.

pub mod actor;
pub mod audit;
pub mod catalog;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod grant;
pub mod guard;
pub mod permissions;
pub mod policy;
pub mod registry;
pub mod resource;
pub mod roles;
pub mod scope;
pub mod taxonomy;

pub use actor::{Actor, TargetAccount};
pub use audit::{AuditSink, DecisionOutcome, DecisionRecord, DecisionSubject, MemoryAuditSink, TracingAuditSink};
pub use catalog::{ModuleDefinition, PermissionCatalog};
pub use engine::{AuthorizationEngine, AuthorizationExplanation, CapabilityMatrix};
pub use error::{AuthzError, ConfigError};
pub use grant::Grant;
pub use guard::AccessGuard;
pub use permissions::{CRUD_ACTIONS, Category, PermissionDefinition, PermissionSlug};
pub use policy::{AdminAction, CapabilityPolicy, DenyReason, PolicyConfig, PolicyDecision};
pub use registry::{RegistrySnapshot, ResolvedRole, RoleRegistry};
pub use resource::{ResourceScope, ScopedResource};
pub use roles::{RoleDefinition, RoleId};
pub use scope::{ScopeDecision, ScopeGrant, ScopeResolver};
pub use taxonomy::{ModuleSpec, RoleSpec, Taxonomy, TaxonomyConfig, TaxonomyGenerator};
