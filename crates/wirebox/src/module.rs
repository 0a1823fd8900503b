//! Service modules
//!
//! A module is a unit of configuration: it receives the binder once, during
//! [`RegistryBuilder::build`](crate::RegistryBuilder::build), and declares
//! bindings, overrides, decorators, and contributions. Modules compose by
//! being added to the same builder; later modules see nothing of earlier
//! ones until assembly merges all declarations.

use crate::binder::ServiceBinder;

/// A unit of registry configuration
pub trait ServiceModule {
    /// Declare this module's services on the binder
    fn bind(&self, binder: &mut ServiceBinder);
}

/// Closures are modules; `builder.with_module(|binder: &mut ServiceBinder| ...)`
/// covers the common inline case.
impl<F> ServiceModule for F
where
    F: Fn(&mut ServiceBinder),
{
    fn bind(&self, binder: &mut ServiceBinder) {
        self(binder);
    }
}
