//! Construction context and per-call resolution state
//!
//! Every builder, key/value builder, and decorator receives a
//! [`ServiceContext`]: the id and declared type being built, a handle to the
//! registry for nested lookups, and (when the slot declared a contribution
//! kind) the fully resolved collection for this target.
//!
//! The in-progress id chain used for cycle detection is a
//! [`ResolutionStack`]: immutable per-call data, copied and extended on each
//! nested resolution rather than mutated in place, so concurrent top-level
//! resolutions never share mutable state.

use crate::contribution::ContributionKey;
use crate::error::{Error, Result};
use crate::id::{ServiceId, ServiceType};
use crate::registry::ServiceRegistry;
use indexmap::IndexMap;
use std::any::Any;
use std::collections::BTreeMap;
use std::hash::Hash;
use std::sync::Arc;

/// A type-erased, shared service value
pub type ServiceValue = Arc<dyn Any + Send + Sync>;

/// Ordered set of service ids currently under construction on this logical
/// call chain.
#[derive(Debug, Clone, Default)]
pub struct ResolutionStack {
    ids: Vec<ServiceId>,
}

impl ResolutionStack {
    /// An empty stack for a fresh top-level resolution
    pub fn root() -> Self {
        Self::default()
    }

    /// Whether `id` is already under construction on this chain
    pub fn contains(&self, id: &ServiceId) -> bool {
        self.ids.iter().any(|current| current == id)
    }

    /// A new stack with `id` appended; `self` is untouched
    pub fn extended(&self, id: ServiceId) -> Self {
        let mut ids = self.ids.clone();
        ids.push(id);
        Self { ids }
    }

    /// The cycle chain for a reappearing `id`: every id from its first
    /// occurrence through the end of the stack, closed by repeating `id`.
    pub fn chain_through(&self, id: &ServiceId) -> Vec<String> {
        let start = self
            .ids
            .iter()
            .position(|current| current == id)
            .unwrap_or(0);
        let mut chain: Vec<String> = self.ids[start..]
            .iter()
            .map(|current| current.as_str().to_string())
            .collect();
        chain.push(id.as_str().to_string());
        chain
    }
}

/// Contributions resolved for one target service, exposed through the
/// context's typed accessors.
#[derive(Debug)]
pub enum ResolvedContributions {
    /// Values from unordered contributions, in declaration order
    Unordered(Vec<ServiceValue>),
    /// Values from ordered contributions, in solved order
    Ordered(Vec<ServiceValue>),
    /// Key/value pairs from mapped contributions, insertion-ordered
    Mapped(IndexMap<ContributionKey, ServiceValue>),
}

impl ResolvedContributions {
    fn shape(&self) -> &'static str {
        match self {
            Self::Unordered(_) => "unordered",
            Self::Ordered(_) => "ordered",
            Self::Mapped(_) => "mapped",
        }
    }
}

/// Context handed to every builder and decorator while one service is under
/// construction.
pub struct ServiceContext<'a> {
    registry: &'a ServiceRegistry,
    stack: ResolutionStack,
    service_id: ServiceId,
    service_type: ServiceType,
    contributions: Option<ResolvedContributions>,
}

impl<'a> ServiceContext<'a> {
    pub(crate) fn new(
        registry: &'a ServiceRegistry,
        stack: ResolutionStack,
        service_id: ServiceId,
        service_type: ServiceType,
        contributions: Option<ResolvedContributions>,
    ) -> Self {
        Self {
            registry,
            stack,
            service_id,
            service_type,
            contributions,
        }
    }

    /// The id of the service being built
    pub fn service_id(&self) -> &ServiceId {
        &self.service_id
    }

    /// The declared type of the service being built
    pub fn service_type(&self) -> ServiceType {
        self.service_type
    }

    /// Resolve the single service of type `T`, threading this construction's
    /// in-progress chain into the nested lookup.
    pub fn get_by_type<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.registry.resolve_by_type::<T>(&self.stack)
    }

    /// Resolve a service by id as a type-erased value
    pub fn get_by_id(&self, id: &str) -> Result<ServiceValue> {
        self.registry.resolve_by_id(id, &self.stack)
    }

    /// Resolve a service by id, requiring it to be a `T`
    pub fn get_by_id_as<T: Send + Sync + 'static>(&self, id: &str) -> Result<Arc<T>> {
        self.registry.resolve_by_id_as::<T>(id, &self.stack)
    }

    /// Resolve every service of type `T`, keyed by id
    pub fn get_all_by_type<T: Send + Sync + 'static>(&self) -> Result<BTreeMap<ServiceId, Arc<T>>> {
        self.registry.resolve_all_by_type::<T>(&self.stack)
    }

    /// The unordered contributions targeting this service
    pub fn unordered_contributions<V: Send + Sync + 'static>(&self) -> Result<Vec<Arc<V>>> {
        match self.expect_contributions("unordered")? {
            ResolvedContributions::Unordered(values) => values
                .iter()
                .map(|value| self.downcast_value::<V>(value))
                .collect(),
            other => Err(self.wrong_shape("unordered", other)),
        }
    }

    /// The ordered contributions targeting this service, in solved order
    pub fn ordered_contributions<V: Send + Sync + 'static>(&self) -> Result<Vec<Arc<V>>> {
        match self.expect_contributions("ordered")? {
            ResolvedContributions::Ordered(values) => values
                .iter()
                .map(|value| self.downcast_value::<V>(value))
                .collect(),
            other => Err(self.wrong_shape("ordered", other)),
        }
    }

    /// The mapped contributions targeting this service, insertion-ordered
    pub fn mapped_contributions<K, V>(&self) -> Result<IndexMap<K, Arc<V>>>
    where
        K: Clone + Eq + Hash + 'static,
        V: Send + Sync + 'static,
    {
        match self.expect_contributions("mapped")? {
            ResolvedContributions::Mapped(map) => map
                .iter()
                .map(|(key, value)| {
                    let key = key
                        .downcast_ref::<K>()
                        .ok_or_else(|| {
                            Error::type_mismatch(
                                self.service_id.as_str(),
                                std::any::type_name::<K>(),
                            )
                        })?
                        .clone();
                    Ok((key, self.downcast_value::<V>(value)?))
                })
                .collect(),
            other => Err(self.wrong_shape("mapped", other)),
        }
    }

    fn expect_contributions(&self, shape: &str) -> Result<&ResolvedContributions> {
        self.contributions.as_ref().ok_or_else(|| {
            Error::internal(format!(
                "No {shape} contributions declared for serviceId '{}'",
                self.service_id
            ))
        })
    }

    fn wrong_shape(&self, requested: &str, actual: &ResolvedContributions) -> Error {
        Error::internal(format!(
            "Service '{}' has {} contributions, not {requested}",
            self.service_id,
            actual.shape()
        ))
    }

    fn downcast_value<V: Send + Sync + 'static>(&self, value: &ServiceValue) -> Result<Arc<V>> {
        Arc::clone(value)
            .downcast::<V>()
            .map_err(|_| Error::type_mismatch(self.service_id.as_str(), std::any::type_name::<V>()))
    }
}
