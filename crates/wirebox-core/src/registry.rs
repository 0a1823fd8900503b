//! The service registry
//!
//! Maps service ids and declared types to lazy [`ServiceSlot`]s. The id map
//! and type index are populated once during assembly and immutable after;
//! the only post-assembly mutation is each slot's own cached-value cell,
//! guarded by its own lock. Every public entry point starts a fresh
//! [`ResolutionStack`]; nested lookups triggered by builders thread the
//! extended stack through the construction context.

use crate::context::{ResolutionStack, ServiceValue};
use crate::error::{Error, Result};
use crate::id::{ServiceId, ServiceType};
use crate::slot::{DecoratorEntry, ServiceSlot, SlotDependencies};
use std::any::TypeId;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

use crate::contribution::ContributionSet;
use crate::slot::BoxedBuilder;

/// Assembly input for one slot: everything the binder layer resolved for a
/// single service id.
pub struct SlotSpec {
    /// Unique service id
    pub id: ServiceId,
    /// Declared service type
    pub service_type: ServiceType,
    /// The (possibly overridden) builder
    pub builder: BoxedBuilder,
    /// Decorators targeting this service, in declaration order
    pub decorators: Vec<DecoratorEntry>,
    /// Contribution entries targeting this service, if any
    pub contributions: Option<ContributionSet>,
}

/// Immutable mapping from service id / service type to lazy slots
pub struct ServiceRegistry {
    slots: HashMap<ServiceId, Arc<ServiceSlot>>,
    by_type: HashMap<TypeId, Vec<ServiceId>>,
    types: Vec<ServiceType>,
}

impl ServiceRegistry {
    /// Assemble a registry from validated slot specs.
    ///
    /// Enforces the one-live-slot-per-id invariant; all other binding-time
    /// validation happens in the binder layer before specs are produced.
    pub fn assemble(specs: Vec<SlotSpec>) -> Result<Self> {
        let mut slots = HashMap::with_capacity(specs.len());
        let mut by_type: HashMap<TypeId, Vec<ServiceId>> = HashMap::new();
        let mut types: Vec<ServiceType> = Vec::new();

        for spec in specs {
            if slots.contains_key(&spec.id) {
                return Err(Error::assembly(format!("Duplicate serviceId '{}'", spec.id)));
            }
            by_type
                .entry(spec.service_type.type_id())
                .or_default()
                .push(spec.id.clone());
            if !types.contains(&spec.service_type) {
                types.push(spec.service_type);
            }
            let slot = ServiceSlot::new(
                spec.id.clone(),
                spec.service_type,
                SlotDependencies {
                    builder: spec.builder,
                    decorators: spec.decorators,
                    contributions: spec.contributions,
                },
            );
            slots.insert(spec.id, Arc::new(slot));
        }

        debug!(services = slots.len(), "service registry assembled");
        Ok(Self {
            slots,
            by_type,
            types,
        })
    }

    /// Resolve the single service whose declared type is `T`
    pub fn get_by_type<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.resolve_by_type::<T>(&ResolutionStack::root())
    }

    /// Resolve a service by id as a type-erased value
    pub fn get_by_id(&self, id: &str) -> Result<ServiceValue> {
        self.resolve_by_id(id, &ResolutionStack::root())
    }

    /// Resolve a service by id, requiring the value to be a `T`
    pub fn get_by_id_as<T: Send + Sync + 'static>(&self, id: &str) -> Result<Arc<T>> {
        self.resolve_by_id_as::<T>(id, &ResolutionStack::root())
    }

    /// Resolve every service whose declared type is `T`, keyed by id.
    ///
    /// Zero matches is not an error; the map is just empty.
    pub fn get_all_by_type<T: Send + Sync + 'static>(&self) -> Result<BTreeMap<ServiceId, Arc<T>>> {
        self.resolve_all_by_type::<T>(&ResolutionStack::root())
    }

    /// Every declared service id, independent of resolution state
    pub fn ids(&self) -> BTreeSet<ServiceId> {
        self.slots.keys().cloned().collect()
    }

    /// Every declared service type, independent of resolution state
    pub fn types(&self) -> BTreeSet<ServiceType> {
        self.types.iter().copied().collect()
    }

    pub(crate) fn resolve_by_type<T: Send + Sync + 'static>(
        &self,
        stack: &ResolutionStack,
    ) -> Result<Arc<T>> {
        let service_type = ServiceType::of::<T>();
        let ids = self
            .by_type
            .get(&service_type.type_id())
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        match ids {
            [] => Err(Error::unknown_service_type(service_type.name())),
            [id] => {
                let value = self.resolve_slot(id, stack)?;
                value
                    .downcast::<T>()
                    .map_err(|_| Error::type_mismatch(id.as_str(), service_type.name()))
            }
            many => Err(Error::ambiguous_service_type(
                service_type.name(),
                many.len(),
            )),
        }
    }

    pub(crate) fn resolve_by_id(&self, id: &str, stack: &ResolutionStack) -> Result<ServiceValue> {
        let key = ServiceId::new(id);
        let slot = self
            .slots
            .get(&key)
            .ok_or_else(|| Error::unknown_service_id(id))?;
        slot.get(self, stack)
    }

    pub(crate) fn resolve_by_id_as<T: Send + Sync + 'static>(
        &self,
        id: &str,
        stack: &ResolutionStack,
    ) -> Result<Arc<T>> {
        self.resolve_by_id(id, stack)?
            .downcast::<T>()
            .map_err(|_| Error::type_mismatch(id, std::any::type_name::<T>()))
    }

    pub(crate) fn resolve_all_by_type<T: Send + Sync + 'static>(
        &self,
        stack: &ResolutionStack,
    ) -> Result<BTreeMap<ServiceId, Arc<T>>> {
        let service_type = ServiceType::of::<T>();
        let mut resolved = BTreeMap::new();
        if let Some(ids) = self.by_type.get(&service_type.type_id()) {
            for id in ids {
                let value = self
                    .resolve_slot(id, stack)?
                    .downcast::<T>()
                    .map_err(|_| Error::type_mismatch(id.as_str(), service_type.name()))?;
                resolved.insert(id.clone(), value);
            }
        }
        Ok(resolved)
    }

    fn resolve_slot(&self, id: &ServiceId, stack: &ResolutionStack) -> Result<ServiceValue> {
        let slot = self
            .slots
            .get(id)
            .ok_or_else(|| Error::unknown_service_id(id.as_str()))?;
        slot.get(self, stack)
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("ids", &self.ids())
            .finish_non_exhaustive()
    }
}
