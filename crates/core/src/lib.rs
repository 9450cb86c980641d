//! `scholaris-core` — shared building blocks for the school-management backend.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod name;

pub use error::{DomainError, DomainResult};
pub use id::{ActorId, OrganizationId};
pub use name::validate_identifier;
