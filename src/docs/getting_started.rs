//! # Getting started
//!
//! An application starts as a module. Let's write one that greets whoever is
//! configured as its user:
//!
//! ```
//! use module_injector::{bootstrap, injectable, Module, Svc};
//!
//! let app = Module::new("greeter");
//! app.value("name", "world");
//! app.factory(
//!     "message",
//!     injectable!(|name: Svc<&'static str>| format!("Hello, {name}!")),
//! );
//!
//! let injector = bootstrap(&app).unwrap().into_injector();
//! let message: Svc<String> = injector.get("message").unwrap();
//! assert_eq!("Hello, world!", message.as_str());
//! ```
//!
//! The factory never asks for `name` itself. It only declares that it needs
//! something called `name`, and the injector finds it. The message is created
//! the first time it is requested, and every later request gets that same
//! message.
//!
//! ## Replacing services
//!
//! Because services are looked up by name, anything registered by a module
//! can be replaced by a module that requires it. This is handy in tests:
//!
//! ```
//! use module_injector::{bootstrap, injectable, module, Module, Svc};
//!
//! let app = Module::new("greeter");
//! app.value("name", "world");
//! app.factory(
//!     "message",
//!     injectable!(|name: Svc<&'static str>| format!("Hello, {name}!")),
//! );
//!
//! let tests = module("greeter-tests", [&app]);
//! tests.value("name", "tests");
//!
//! let injector = bootstrap(&tests).unwrap().into_injector();
//! let message: Svc<String> = injector.get("message").unwrap();
//! assert_eq!("Hello, tests!", message.as_str());
//! ```
//!
//! ## Configuring providers
//!
//! Some services need to be configured before they are created. A custom
//! provider object can be registered for them. While the application is
//! being configured, the provider itself can be injected under the service's
//! name followed by `Provider`:
//!
//! ```
//! use module_injector::{
//!     bootstrap, inject, injectable, Invoke, Module, Svc, TypedProvider,
//! };
//! use std::sync::Mutex;
//!
//! struct Greeting {
//!     template: String,
//! }
//!
//! impl Greeting {
//!     fn greet(&self, name: &str) -> String {
//!         self.template.replace("{}", name)
//!     }
//! }
//!
//! #[derive(Default)]
//! struct GreetingProvider {
//!     template: Mutex<Option<String>>,
//! }
//!
//! impl GreetingProvider {
//!     fn set_template(&self, template: &str) {
//!         *self.template.lock().unwrap() = Some(template.to_owned());
//!     }
//! }
//!
//! impl TypedProvider for GreetingProvider {
//!     type Result = Greeting;
//!
//!     fn get(&self) -> Svc<dyn Invoke<Greeting>> {
//!         let template = self
//!             .template
//!             .lock()
//!             .unwrap()
//!             .clone()
//!             .unwrap_or_else(|| "Hello, {}!".to_owned());
//!         Svc::new(injectable!(move || Greeting {
//!             template: template.clone()
//!         }))
//!     }
//! }
//!
//! let app = Module::new("greeter");
//! app.provider("greeting", GreetingProvider::default());
//! app.config(inject(
//!     ["greetingProvider"],
//!     |provider: Svc<GreetingProvider>| provider.set_template("Howdy, {}!"),
//! ));
//!
//! let injector = bootstrap(&app).unwrap().into_injector();
//! let greeting: Svc<Greeting> = injector.get("greeting").unwrap();
//! assert_eq!("Howdy, partner!", greeting.greet("partner"));
//! ```
//!
//! ## Events
//!
//! Once the application has started, services can tell each other what
//! happened through events. Handlers are subscribed on the injector, and
//! events are emitted through the `$emit` service:
//!
//! ```
//! use module_injector::{bootstrap, DynSvc, Emitter, Module, Svc};
//! use std::sync::{Arc, Mutex};
//!
//! let injector = bootstrap(&Module::new("greeter")).unwrap().into_injector();
//!
//! let greeted = Arc::new(Mutex::new(Vec::new()));
//! let log = greeted.clone();
//! injector.on("greeted", move |name: &DynSvc| {
//!     if let Some(name) = name.downcast_ref::<String>() {
//!         log.lock().unwrap().push(name.clone());
//!     }
//! });
//!
//! let emit: Svc<Emitter> = injector.get("$emit").unwrap();
//! emit.emit("greeted", "world".to_owned());
//! assert_eq!(vec!["world".to_owned()], *greeted.lock().unwrap());
//! ```
