//! # wirebox-core
//!
//! The service-resolution engine behind the `wirebox` inversion-of-control
//! registry: per-service lazy construction with circular-dependency
//! detection, decorator and contribution aggregation, and the constraint
//! ordering solver shared by both.
//!
//! This crate is the pure core. The declarative binder API
//! (bind/override/decorate/contribute) and the registry builder front door
//! live in the `wirebox` crate.
//!
//! ## Architecture
//!
//! - [`ordering`] - before/after/wildcard constraint solver
//! - [`contribution`] - the three contribution shapes and their aggregation
//! - [`slot`] - lazy, memoized, thread-safe per-service slots
//! - [`registry`] - id- and type-indexed lookup over the slots
//! - [`context`] - construction context and per-call resolution stack
//! - [`error`] - the structural error taxonomy

pub mod context;
pub mod contribution;
pub mod error;
pub mod id;
pub mod locks;
pub mod ordering;
pub mod registry;
pub mod slot;

pub use context::{ResolutionStack, ResolvedContributions, ServiceContext, ServiceValue};
pub use contribution::{
    boxed_key_builder, BoxedKeyBuilder, ContributionKey, ContributionKind, ContributionSet,
    MappedEntry, OrderedEntry, UnorderedEntry,
};
pub use error::{Error, Result, TypeMismatchDetail};
pub use id::{default_service_id, ServiceId, ServiceType};
pub use ordering::{ConstraintItem, WILDCARD};
pub use registry::{ServiceRegistry, SlotSpec};
pub use slot::{
    boxed_builder, boxed_decorator, BoxedBuilder, BoxedDecorator, DecoratorEntry, ServiceSlot,
    SlotDependencies,
};
