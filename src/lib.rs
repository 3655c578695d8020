//! # Module-based dependency injection.
//!
//! Applications are made of named [`Module`]s. A module registers providers
//! under string names, declares the other modules it requires, and adds
//! callbacks that run while the application is configured and once it has
//! started. [`bootstrap()`] composes a module with everything it requires
//! into a single application [`Injector`]:
//!
//! ```
//! use module_injector::{bootstrap, inject, injectable, module, Module, Svc};
//!
//! struct Greeter {
//!     greeting: Svc<&'static str>,
//! }
//!
//! impl Greeter {
//!     fn greet(&self, name: &str) -> String {
//!         format!("{}, {name}!", self.greeting)
//!     }
//! }
//!
//! let core = Module::new("core");
//! core.constant("greeting", "Hello");
//!
//! let app = module("app", [&core]);
//! app.service("greeter", injectable!(|greeting: Svc<&'static str>| Greeter { greeting }));
//! app.run(inject(["greeter"], |greeter: Svc<Greeter>| {
//!     assert_eq!("Hello, world!", greeter.greet("world"));
//! }));
//!
//! let injector = bootstrap(&app).unwrap().into_injector();
//! let greeter: Svc<Greeter> = injector.get("greeter").unwrap();
//! assert_eq!("Hello, there!", greeter.greet("there"));
//! ```
//!
//! By default, services are held by thread-safe [`Arc<T>`](std::sync::Arc)
//! pointers. This can be changed to [`Rc<T>`](std::rc::Rc) by disabling
//! default features and enabling the "rc" feature:
//!
//! ```text
//! [dependencies.module_injector]
//! version = "*" # Replace with the version you want to use
//! default-features = false
//! features = ["rc"]
//! ```
//!
//! ## Dependencies are names
//!
//! Every callable the injector invokes declares the names of its
//! dependencies, in argument order. They are declared with [`inject()`], or
//! derived from a closure's parameter names with [`injectable!`]. Functions
//! without parameters can be passed as they are.
//!
//! Each resolved dependency is converted into its parameter type through the
//! [`Dependency`] trait, usually as a [`Svc<T>`].
//!
//! ## Providers
//!
//! Every registration is turned into a provider object while the application
//! is configured:
//!
//! - `value`: the value itself.
//! - `constant`: a value that is also available while configuring. Constants
//!   have no provider object.
//! - `factory`: the result of a factory function.
//! - `service`: a new instance built by a constructor.
//! - `provider`: a custom provider object implementing [`TypedProvider`] (or
//!   [`Provider`]), injectable as `<name>Provider` so it can be configured.
//!
//! Services are created lazily, the first time they are requested, and the
//! same instance is returned for each later request.
//!
//! ## Built-in services
//!
//! - `$injector`: the [`Injector`] itself.
//! - `$provide`: a [`Provide`] for registering providers during
//!   configuration.
//! - `$emit`: an [`Emitter`] for emitting events once the application has
//!   started. Handlers are subscribed with [`Injector::on()`].
//!
//! See the [getting started guide][getting-started] for a longer walkthrough.
//!
//! [getting-started]: crate::docs::getting_started

#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic)]
#![warn(missing_docs)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::doc_markdown,
    clippy::needless_doctest_main,
    clippy::needless_pass_by_value,
    clippy::uninlined_format_args
)]

#[cfg(not(any(feature = "arc", feature = "rc")))]
compile_error!(
    "Either the 'arc' or 'rc' feature must be enabled (but not both)."
);

#[cfg(all(feature = "arc", feature = "rc"))]
compile_error!(
    "The 'arc' and 'rc' features are mutually exclusive and cannot be enabled together."
);

mod bootstrap;
mod dependency;
mod events;
mod injector;
mod module;
mod services;

pub use bootstrap::*;
pub use dependency::*;
pub use events::*;
pub use injector::*;
pub use module::*;
pub use services::*;

pub mod docs;

#[cfg(test)]
mod tests;
