//! Lazy, memoized, thread-safe service slots
//!
//! A slot owns exactly one service's lifecycle: Unbuilt, Building (held
//! under the slot lock), Built. Construction happens at most once; the
//! build-time dependencies (builder, decorators, contribution entries) are
//! consumed on first build and dropped, while the cached value lives as long
//! as the registry.
//!
//! Cycle detection runs against the caller-supplied resolution stack
//! *before* the slot lock is taken, so a logical reentry on the same call
//! chain errors deterministically instead of deadlocking, while genuinely
//! concurrent callers block until the owning thread finishes.

use crate::context::{ResolutionStack, ServiceContext, ServiceValue};
use crate::contribution::ContributionSet;
use crate::error::{Error, Result};
use crate::id::{ServiceId, ServiceType};
use crate::locks::lock_mutex;
use crate::ordering::{self, ConstraintItem};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};

use crate::registry::ServiceRegistry;

/// A boxed, type-erased service builder
pub type BoxedBuilder =
    Box<dyn for<'a> FnOnce(&ServiceContext<'a>) -> Result<ServiceValue> + Send>;

/// A boxed, type-erased decorator stage
pub type BoxedDecorator =
    Box<dyn for<'a> FnOnce(&ServiceContext<'a>, ServiceValue) -> Result<ServiceValue> + Send>;

/// Erase a typed builder into a [`BoxedBuilder`]
pub fn boxed_builder<T, F>(build: F) -> BoxedBuilder
where
    T: Send + Sync + 'static,
    F: for<'a> FnOnce(&ServiceContext<'a>) -> Result<T> + Send + 'static,
{
    Box::new(move |ctx| {
        let value: ServiceValue = Arc::new(build(ctx)?);
        Ok(value)
    })
}

/// Erase a typed decorator into a [`BoxedDecorator`].
///
/// The decorator receives the previous stage's value as an `Arc<T>` and
/// returns the replacement value of the same declared type.
pub fn boxed_decorator<T, F>(decorate: F) -> BoxedDecorator
where
    T: Send + Sync + 'static,
    F: for<'a> FnOnce(&ServiceContext<'a>, Arc<T>) -> Result<T> + Send + 'static,
{
    Box::new(move |ctx, value| {
        let current = value
            .downcast::<T>()
            .map_err(|_| {
                Error::type_mismatch(ctx.service_id().as_str(), std::any::type_name::<T>())
            })?;
        let next: ServiceValue = Arc::new(decorate(ctx, current)?);
        Ok(next)
    })
}

/// One decorator declared for a target service
pub struct DecoratorEntry {
    /// Unique decorator id per target
    pub id: String,
    /// The decorating function
    pub decorate: BoxedDecorator,
    /// Decorator ids this one must precede (`*` for all others)
    pub before: Vec<String>,
    /// Decorator ids this one must follow (`*` for all others)
    pub after: Vec<String>,
}

/// Build-time dependencies, consumed and released on first construction
pub struct SlotDependencies {
    /// Builds the candidate value
    pub builder: BoxedBuilder,
    /// Decorators to order and apply over the candidate
    pub decorators: Vec<DecoratorEntry>,
    /// Contribution entries targeting this service, if any
    pub contributions: Option<ContributionSet>,
}

enum SlotState {
    Unbuilt(Box<SlotDependencies>),
    Built(ServiceValue),
    Failed,
}

/// The lazy holder for exactly one service's value
pub struct ServiceSlot {
    id: ServiceId,
    service_type: ServiceType,
    state: Mutex<SlotState>,
}

impl ServiceSlot {
    pub(crate) fn new(id: ServiceId, service_type: ServiceType, deps: SlotDependencies) -> Self {
        Self {
            id,
            service_type,
            state: Mutex::new(SlotState::Unbuilt(Box::new(deps))),
        }
    }

    /// The slot's service id
    pub fn id(&self) -> &ServiceId {
        &self.id
    }

    /// The slot's declared service type
    pub fn service_type(&self) -> ServiceType {
        self.service_type
    }

    /// Return the cached value, constructing it on first access.
    pub(crate) fn get(
        &self,
        registry: &ServiceRegistry,
        stack: &ResolutionStack,
    ) -> Result<ServiceValue> {
        // Logical reentry on this call chain is a cycle; check before taking
        // the lock so it errors instead of self-deadlocking.
        if stack.contains(&self.id) {
            return Err(Error::circular_dependency(stack.chain_through(&self.id)));
        }

        let mut state = lock_mutex(&self.state, "ServiceSlot::get")?;
        match &*state {
            SlotState::Built(value) => return Ok(Arc::clone(value)),
            SlotState::Failed => {
                return Err(Error::internal(format!(
                    "Service '{}' is unavailable after a failed build",
                    self.id
                )))
            }
            SlotState::Unbuilt(_) => {}
        }

        // A failed build is terminal for this slot; the state only leaves
        // Failed if construction below succeeds.
        let SlotState::Unbuilt(deps) = std::mem::replace(&mut *state, SlotState::Failed) else {
            return Err(Error::internal(format!(
                "Service '{}' changed state under its own lock",
                self.id
            )));
        };

        trace!(service_id = %self.id, "building service");
        let value = self.build(registry, stack.extended(self.id.clone()), *deps)?;
        *state = SlotState::Built(Arc::clone(&value));
        Ok(value)
    }

    fn build(
        &self,
        registry: &ServiceRegistry,
        stack: ResolutionStack,
        deps: SlotDependencies,
    ) -> Result<ServiceValue> {
        // Contribution builders run with a pre-builder context; the main
        // builder then sees the resolved collection through the final one.
        let contributions = match deps.contributions {
            Some(set) => {
                let ctx = ServiceContext::new(
                    registry,
                    stack.clone(),
                    self.id.clone(),
                    self.service_type,
                    None,
                );
                Some(
                    set.resolve(&ctx)
                        .map_err(|err| Error::wrap_build(self.id.as_str(), err))?,
                )
            }
            None => None,
        };

        let ctx = ServiceContext::new(
            registry,
            stack,
            self.id.clone(),
            self.service_type,
            contributions,
        );
        let mut value = (deps.builder)(&ctx).map_err(|err| Error::wrap_build(self.id.as_str(), err))?;

        if !deps.decorators.is_empty() {
            let items: Vec<ConstraintItem> = deps
                .decorators
                .iter()
                .map(|decorator| ConstraintItem {
                    name: decorator.id.clone(),
                    before: decorator.before.clone(),
                    after: decorator.after.clone(),
                })
                .collect();
            let order = ordering::solve(&items)?;
            trace!(service_id = %self.id, order = ?order, "applying decorators");

            let mut by_id: HashMap<String, BoxedDecorator> = deps
                .decorators
                .into_iter()
                .map(|decorator| (decorator.id, decorator.decorate))
                .collect();
            for name in order {
                let decorate = by_id.remove(&name).ok_or_else(|| {
                    Error::internal(format!("Ordering solver returned unknown decorator '{name}'"))
                })?;
                value = decorate(&ctx, value)
                    .map_err(|err| Error::wrap_build(self.id.as_str(), err))?;
            }
        }

        debug!(service_id = %self.id, "service built");
        Ok(value)
    }
}
