//! # wirebox
//!
//! A lightweight inversion-of-control registry. Modules declare lazily
//! built, memoized services; other modules override them, decorate them,
//! and contribute values into their collections; the registry resolves
//! everything thread-safely with circular-dependency detection.
//!
//! ```
//! use wirebox::{RegistryBuilder, Result, ServiceBinder};
//!
//! struct Greeter {
//!     greeting: String,
//! }
//!
//! fn module(binder: &mut ServiceBinder) {
//!     binder.bind_instance("Hello".to_string());
//!     binder.bind::<Greeter, _>(|ctx| {
//!         Ok(Greeter {
//!             greeting: ctx.get_by_type::<String>()?.as_str().to_owned(),
//!         })
//!     });
//! }
//!
//! fn main() -> Result<()> {
//!     let registry = RegistryBuilder::new().with_module(module).build()?;
//!     let greeter = registry.get_by_type::<Greeter>()?;
//!     assert_eq!(greeter.greeting, "Hello");
//!     Ok(())
//! }
//! ```
//!
//! The resolution engine lives in `wirebox-core` and is re-exported here;
//! this crate adds the declarative surface: [`ServiceBinder`],
//! [`ServiceModule`], and [`RegistryBuilder`].

pub mod binder;
pub mod builder;
pub mod module;

pub use binder::{
    BindOptions, ContributeOptions, DecorateOptions, OverrideOptions, ServiceBinder, ServiceTarget,
};
pub use builder::RegistryBuilder;
pub use module::ServiceModule;

pub use wirebox_core::{
    default_service_id, ContributionKey, ContributionKind, Error, ResolutionStack, Result,
    ServiceContext, ServiceId, ServiceRegistry, ServiceType, ServiceValue, WILDCARD,
};
