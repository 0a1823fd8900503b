//! Registry assembly
//!
//! `RegistryBuilder` runs every module against one binder, then merges the
//! collected declarations into per-service slot specs: overrides replace
//! builders, decorators and contributions attach to their targets, and
//! every cross-declaration invariant is checked here so the registry itself
//! only ever sees consistent input. All assembly failures surface as
//! [`Error::Assembly`](wirebox_core::Error) before any service is built.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;
use wirebox_core::{
    ContributionSet, DecoratorEntry, Error, Result, ServiceId, ServiceRegistry, SlotSpec,
};

use crate::binder::{BindingDecl, ContributionEntryDecl, ServiceBinder};
use crate::module::ServiceModule;

/// Assembles a [`ServiceRegistry`] from a set of modules
#[derive(Default)]
pub struct RegistryBuilder {
    binder: ServiceBinder,
}

impl RegistryBuilder {
    /// A builder with no declarations
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `module` against this builder's binder
    #[must_use]
    pub fn with_module<M: ServiceModule>(mut self, module: M) -> Self {
        module.bind(&mut self.binder);
        self
    }

    /// Validate all collected declarations and assemble the registry.
    ///
    /// No service is constructed here; slots stay lazy until first lookup.
    pub fn build(self) -> Result<ServiceRegistry> {
        let specs = assemble_specs(self.binder)?;
        ServiceRegistry::assemble(specs)
    }
}

fn assemble_specs(binder: ServiceBinder) -> Result<Vec<SlotSpec>> {
    let mut bindings: IndexMap<ServiceId, BindingDecl> =
        IndexMap::with_capacity(binder.bindings.len());
    for decl in binder.bindings {
        if bindings.contains_key(&decl.id) {
            return Err(Error::assembly(format!("Duplicate serviceId '{}'", decl.id)));
        }
        bindings.insert(decl.id.clone(), decl);
    }

    let mut overridden: HashSet<ServiceId> = HashSet::new();
    for decl in binder.overrides {
        let Some(binding) = bindings.get_mut(&decl.id) else {
            return Err(Error::assembly(format!(
                "Attempted to override unknown serviceId '{}'",
                decl.id
            )));
        };
        if !overridden.insert(decl.id.clone()) {
            return Err(Error::assembly(format!(
                "Duplicate override for serviceId '{}'",
                decl.id
            )));
        }
        if binding.service_type != decl.service_type {
            return Err(Error::assembly(format!(
                "Override for serviceId '{}' declares type {} but the binding declares {}",
                decl.id,
                decl.service_type,
                binding.service_type
            )));
        }
        binding.builder = decl.builder;
    }

    let mut decorators: IndexMap<ServiceId, Vec<DecoratorEntry>> = IndexMap::new();
    for decl in binder.decorators {
        let Some(binding) = bindings.get(&decl.target) else {
            return Err(Error::assembly(format!(
                "Attempted to decorate unknown serviceId '{}'",
                decl.target
            )));
        };
        if binding.service_type != decl.service_type {
            return Err(Error::assembly(format!(
                "Decorator '{}' for serviceId '{}' declares type {} but the binding declares {}",
                decl.decorator_id,
                decl.target,
                decl.service_type,
                binding.service_type
            )));
        }
        let entries = decorators.entry(decl.target.clone()).or_default();
        if entries.iter().any(|entry| entry.id == decl.decorator_id) {
            return Err(Error::assembly(format!(
                "Duplicate decoratorId '{}' for serviceId '{}'",
                decl.decorator_id, decl.target
            )));
        }
        entries.push(DecoratorEntry {
            id: decl.decorator_id,
            decorate: decl.decorate,
            before: decl.before,
            after: decl.after,
        });
    }

    let mut contributions: IndexMap<ServiceId, ContributionSet> = IndexMap::new();
    for decl in binder.contributions {
        if !bindings.contains_key(&decl.target) {
            return Err(Error::assembly(format!(
                "Attempted to contribute to unknown serviceId '{}'",
                decl.target
            )));
        }
        match contributions.entry(decl.target.clone()) {
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(match decl.entry {
                    ContributionEntryDecl::Unordered(entry) => {
                        ContributionSet::Unordered(vec![entry])
                    }
                    ContributionEntryDecl::Ordered(entry) => ContributionSet::Ordered(vec![entry]),
                    ContributionEntryDecl::Mapped(entry) => ContributionSet::Mapped(vec![entry]),
                });
            }
            indexmap::map::Entry::Occupied(mut slot) => match (slot.get_mut(), decl.entry) {
                (ContributionSet::Unordered(entries), ContributionEntryDecl::Unordered(entry)) => {
                    entries.push(entry);
                }
                (ContributionSet::Ordered(entries), ContributionEntryDecl::Ordered(entry)) => {
                    entries.push(entry);
                }
                (ContributionSet::Mapped(entries), ContributionEntryDecl::Mapped(entry)) => {
                    entries.push(entry);
                }
                (set, entry) => {
                    return Err(Error::assembly(format!(
                        "Conflicting contribution types for serviceId '{}': {} and {}",
                        decl.target,
                        set.kind(),
                        entry.kind()
                    )));
                }
            },
        }
    }

    debug!(
        bindings = bindings.len(),
        decorated = decorators.len(),
        contributed = contributions.len(),
        "assembling slot specs"
    );

    Ok(bindings
        .into_iter()
        .map(|(id, binding)| SlotSpec {
            service_type: binding.service_type,
            builder: binding.builder,
            decorators: decorators.shift_remove(&id).unwrap_or_default(),
            contributions: contributions.shift_remove(&id),
            id,
        })
        .collect())
}
