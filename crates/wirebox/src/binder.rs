//! The declarative binding surface
//!
//! Modules record declarations here; nothing is validated or constructed
//! until [`RegistryBuilder::build`](crate::RegistryBuilder::build) merges
//! the collected declarations into slot specs. Each `bind`/`decorate`/
//! `contribute_*` call erases its typed closures immediately and returns a
//! small fluent handle for the optional knobs (explicit id, ordering
//! constraints).

use std::fmt;
use std::hash::Hash;

use wirebox_core::{
    boxed_builder, boxed_decorator, boxed_key_builder, default_service_id, BoxedBuilder,
    BoxedDecorator, ContributionKind, MappedEntry, OrderedEntry, Result, ServiceContext,
    ServiceId, ServiceType, UnorderedEntry,
};

/// The service a decorator or contribution targets.
///
/// Built from an explicit id (`"greeter"`) or from a bound type's default id
/// via [`ServiceTarget::of`].
#[derive(Debug, Clone)]
pub struct ServiceTarget {
    id: ServiceId,
}

impl ServiceTarget {
    /// Target the service bound under `T`'s default id
    pub fn of<T: 'static>() -> Self {
        Self {
            id: default_service_id::<T>(),
        }
    }

    /// The targeted service id
    pub fn id(&self) -> &ServiceId {
        &self.id
    }
}

impl From<&str> for ServiceTarget {
    fn from(id: &str) -> Self {
        Self {
            id: ServiceId::new(id),
        }
    }
}

impl From<String> for ServiceTarget {
    fn from(id: String) -> Self {
        Self {
            id: ServiceId::new(id),
        }
    }
}

impl From<ServiceId> for ServiceTarget {
    fn from(id: ServiceId) -> Self {
        Self { id }
    }
}

pub(crate) struct BindingDecl {
    pub(crate) id: ServiceId,
    pub(crate) service_type: ServiceType,
    pub(crate) builder: BoxedBuilder,
}

pub(crate) struct OverrideDecl {
    pub(crate) id: ServiceId,
    pub(crate) service_type: ServiceType,
    pub(crate) builder: BoxedBuilder,
}

pub(crate) struct DecoratorDecl {
    pub(crate) target: ServiceId,
    pub(crate) decorator_id: String,
    pub(crate) service_type: ServiceType,
    pub(crate) decorate: BoxedDecorator,
    pub(crate) before: Vec<String>,
    pub(crate) after: Vec<String>,
}

pub(crate) enum ContributionEntryDecl {
    Unordered(UnorderedEntry),
    Ordered(OrderedEntry),
    Mapped(MappedEntry),
}

impl ContributionEntryDecl {
    pub(crate) fn kind(&self) -> ContributionKind {
        match self {
            Self::Unordered(_) => ContributionKind::Unordered,
            Self::Ordered(_) => ContributionKind::Ordered,
            Self::Mapped(_) => ContributionKind::Mapped,
        }
    }
}

pub(crate) struct ContributionDecl {
    pub(crate) target: ServiceId,
    pub(crate) entry: ContributionEntryDecl,
}

/// Collects declarations from the modules handed to one builder
#[derive(Default)]
pub struct ServiceBinder {
    pub(crate) bindings: Vec<BindingDecl>,
    pub(crate) overrides: Vec<OverrideDecl>,
    pub(crate) decorators: Vec<DecoratorDecl>,
    pub(crate) contributions: Vec<ContributionDecl>,
}

impl ServiceBinder {
    /// Bind a service of type `T` built by `build`.
    ///
    /// The id defaults to `T`'s decapitalized simple type name; use
    /// [`BindOptions::with_id`] to pick another.
    pub fn bind<T, F>(&mut self, build: F) -> BindOptions<'_>
    where
        T: Send + Sync + 'static,
        F: for<'a> FnOnce(&ServiceContext<'a>) -> Result<T> + Send + 'static,
    {
        self.bindings.push(BindingDecl {
            id: default_service_id::<T>(),
            service_type: ServiceType::of::<T>(),
            builder: boxed_builder(build),
        });
        let index = self.bindings.len() - 1;
        BindOptions {
            decl: &mut self.bindings[index],
        }
    }

    /// Bind a service to an already-constructed value
    pub fn bind_instance<T>(&mut self, value: T) -> BindOptions<'_>
    where
        T: Send + Sync + 'static,
    {
        self.bind(move |_| Ok(value))
    }

    /// Replace the builder of a service another module bound.
    ///
    /// The target id defaults the same way as [`bind`](Self::bind); the
    /// declared type must match the original binding. At most one override
    /// per service id across all modules.
    pub fn override_with<T, F>(&mut self, build: F) -> OverrideOptions<'_>
    where
        T: Send + Sync + 'static,
        F: for<'a> FnOnce(&ServiceContext<'a>) -> Result<T> + Send + 'static,
    {
        self.overrides.push(OverrideDecl {
            id: default_service_id::<T>(),
            service_type: ServiceType::of::<T>(),
            builder: boxed_builder(build),
        });
        let index = self.overrides.len() - 1;
        OverrideOptions {
            decl: &mut self.overrides[index],
        }
    }

    /// Override a service with an already-constructed value
    pub fn override_instance<T>(&mut self, value: T) -> OverrideOptions<'_>
    where
        T: Send + Sync + 'static,
    {
        self.override_with(move |_| Ok(value))
    }

    /// Decorate the service at `target` with a stage named `decorator_id`.
    ///
    /// The decorator receives the previous stage's value and returns its
    /// replacement; stages for one target are ordered by their before/after
    /// constraints.
    pub fn decorate<T, S, F>(
        &mut self,
        target: S,
        decorator_id: &str,
        decorate: F,
    ) -> DecorateOptions<'_>
    where
        T: Send + Sync + 'static,
        S: Into<ServiceTarget>,
        F: for<'a> FnOnce(&ServiceContext<'a>, std::sync::Arc<T>) -> Result<T> + Send + 'static,
    {
        self.decorators.push(DecoratorDecl {
            target: target.into().id,
            decorator_id: decorator_id.to_owned(),
            service_type: ServiceType::of::<T>(),
            decorate: boxed_decorator(decorate),
            before: Vec::new(),
            after: Vec::new(),
        });
        let index = self.decorators.len() - 1;
        DecorateOptions {
            decl: &mut self.decorators[index],
        }
    }

    /// Contribute a value into `target`'s unordered collection
    pub fn contribute_unordered<T, S, F>(&mut self, target: S, build: F)
    where
        T: Send + Sync + 'static,
        S: Into<ServiceTarget>,
        F: for<'a> FnOnce(&ServiceContext<'a>) -> Result<T> + Send + 'static,
    {
        self.contributions.push(ContributionDecl {
            target: target.into().id,
            entry: ContributionEntryDecl::Unordered(UnorderedEntry {
                name: String::new(),
                build: boxed_builder(build),
            }),
        });
    }

    /// Contribute a value into `target`'s ordered collection under `name`.
    ///
    /// Other contributions constrain against `name`; chain
    /// [`before`](ContributeOptions::before)/[`after`](ContributeOptions::after)
    /// on the returned handle.
    pub fn contribute_ordered<T, S, F>(
        &mut self,
        target: S,
        name: &str,
        build: F,
    ) -> ContributeOptions<'_>
    where
        T: Send + Sync + 'static,
        S: Into<ServiceTarget>,
        F: for<'a> FnOnce(&ServiceContext<'a>) -> Result<T> + Send + 'static,
    {
        self.contributions.push(ContributionDecl {
            target: target.into().id,
            entry: ContributionEntryDecl::Ordered(OrderedEntry {
                name: name.to_owned(),
                build: boxed_builder(build),
                before: Vec::new(),
                after: Vec::new(),
            }),
        });
        let index = self.contributions.len() - 1;
        ContributeOptions {
            decl: &mut self.contributions[index],
        }
    }

    /// Contribute a key/value pair into `target`'s mapped collection.
    ///
    /// Keys compare by `K`'s own `Eq`/`Hash`; two entries resolving to equal
    /// keys fail the target's construction.
    pub fn contribute_mapped<K, V, S, FK, FV>(
        &mut self,
        target: S,
        build_key: FK,
        build_value: FV,
    ) where
        K: Eq + Hash + fmt::Debug + Send + Sync + 'static,
        V: Send + Sync + 'static,
        S: Into<ServiceTarget>,
        FK: for<'a> FnOnce(&ServiceContext<'a>) -> Result<K> + Send + 'static,
        FV: for<'a> FnOnce(&ServiceContext<'a>) -> Result<V> + Send + 'static,
    {
        self.contributions.push(ContributionDecl {
            target: target.into().id,
            entry: ContributionEntryDecl::Mapped(MappedEntry {
                name: String::new(),
                build_key: boxed_key_builder(build_key),
                build_value: boxed_builder(build_value),
            }),
        });
    }
}

/// Fluent knobs for a freshly declared binding
pub struct BindOptions<'b> {
    decl: &'b mut BindingDecl,
}

impl BindOptions<'_> {
    /// Use an explicit service id instead of the type-derived default
    pub fn with_id(self, id: impl Into<ServiceId>) -> Self {
        self.decl.id = id.into();
        self
    }
}

/// Fluent knobs for a freshly declared override
pub struct OverrideOptions<'b> {
    decl: &'b mut OverrideDecl,
}

impl OverrideOptions<'_> {
    /// Target an explicit service id instead of the type-derived default
    pub fn with_id(self, id: impl Into<ServiceId>) -> Self {
        self.decl.id = id.into();
        self
    }
}

/// Fluent ordering knobs for a freshly declared decorator
pub struct DecorateOptions<'b> {
    decl: &'b mut DecoratorDecl,
}

impl DecorateOptions<'_> {
    /// Run this decorator before the named one (`"*"` for all others)
    pub fn before(self, decorator_id: impl Into<String>) -> Self {
        self.decl.before.push(decorator_id.into());
        self
    }

    /// Run this decorator after the named one (`"*"` for all others)
    pub fn after(self, decorator_id: impl Into<String>) -> Self {
        self.decl.after.push(decorator_id.into());
        self
    }
}

/// Fluent ordering knobs for a freshly declared ordered contribution
pub struct ContributeOptions<'b> {
    decl: &'b mut ContributionDecl,
}

impl ContributeOptions<'_> {
    /// Place this contribution before the named one (`"*"` for all others)
    pub fn before(self, name: impl Into<String>) -> Self {
        if let ContributionEntryDecl::Ordered(entry) = &mut self.decl.entry {
            entry.before.push(name.into());
        }
        self
    }

    /// Place this contribution after the named one (`"*"` for all others)
    pub fn after(self, name: impl Into<String>) -> Self {
        if let ContributionEntryDecl::Ordered(entry) = &mut self.decl.entry {
            entry.after.push(name.into());
        }
        self
    }
}
