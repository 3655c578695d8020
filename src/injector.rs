use crate::{
    Dependency, DynSvc, EventBus, Emitter, InjectError, InjectResult, IntoInvoke,
    Invoke, Locals, Normalized, Provider, ProviderHandle, Registration, Service,
    Subscriber, Svc,
};
use std::{
    collections::HashMap,
    thread::{self, ThreadId},
};
use tracing::trace;

mod provide;
mod services;

pub use provide::*;
pub use services::*;

/// Name under which the injector can request itself.
pub const INJECTOR: &str = "$injector";

/// Name of the [`Provide`] utility, available during the config phase.
pub const PROVIDE: &str = "$provide";

/// Name of the [`Emitter`] service, available during the run phase.
pub const EMIT: &str = "$emit";

/// Name of the [`Subscriber`] service, available during the run phase.
pub const ON: &str = "$on";

const PROVIDER_SUFFIX: &str = "Provider";

pub(crate) fn is_reserved(name: &str) -> bool {
    matches!(name, INJECTOR | PROVIDE | EMIT | ON)
}

pub(crate) trait SharedEx<T> {
    fn new(value: T) -> Self;
    fn with_inner<R, F: FnOnce(&T) -> R>(&self, f: F) -> R;
    fn with_inner_mut<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> R;
}

#[cfg(feature = "rc")]
mod types {
    use super::SharedEx;
    use std::{cell::RefCell, rc::Rc};

    pub type Shared<T> = Rc<RefCell<T>>;

    impl<T> SharedEx<T> for Shared<T> {
        fn new(value: T) -> Self {
            Rc::new(RefCell::new(value))
        }

        fn with_inner<R, F: FnOnce(&T) -> R>(&self, f: F) -> R {
            f(&*self.borrow())
        }

        fn with_inner_mut<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> R {
            f(&mut *self.borrow_mut())
        }
    }
}

#[cfg(feature = "arc")]
mod types {
    use super::SharedEx;
    use std::sync::{Arc, Mutex, PoisonError};

    pub type Shared<T> = Arc<Mutex<T>>;

    impl<T> SharedEx<T> for Shared<T> {
        fn new(value: T) -> Self {
            Arc::new(Mutex::new(value))
        }

        fn with_inner<R, F: FnOnce(&T) -> R>(&self, f: F) -> R {
            f(&*self.lock().unwrap_or_else(PoisonError::into_inner))
        }

        fn with_inner_mut<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> R {
            f(&mut *self.lock().unwrap_or_else(PoisonError::into_inner))
        }
    }
}

#[allow(clippy::wildcard_imports)]
pub(crate) use types::*;

/// The finalized provider map. Constants and provider objects are kept apart
/// because constants have no `<name>Provider` form.
#[derive(Clone, Default)]
pub(crate) struct Registry {
    constants: HashMap<String, DynSvc>,
    providers: HashMap<String, ProviderHandle>,
}

impl Registry {
    fn insert_constant(&mut self, name: &str, value: DynSvc) {
        self.providers.remove(name);
        self.constants.insert(name.to_owned(), value);
    }

    fn insert_provider(&mut self, name: &str, handle: ProviderHandle) {
        self.constants.remove(name);
        self.providers.insert(name.to_owned(), handle);
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
    Config,
    Run,
}

struct InjectorState {
    phase: Phase,
    sealed: bool,
    registry: Registry,
    instances: HashMap<String, DynSvc>,
    /// Names being activated, per thread, in request order.
    resolving: HashMap<ThreadId, Vec<String>>,
}

/// Marks a service as being activated by the current thread until dropped.
/// The mark is cleared even if the provider panics.
struct InFlight<'a> {
    injector: &'a Injector,
    name: &'a str,
    thread: ThreadId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.injector.state.with_inner_mut(|state| {
            let Some(chain) = state.resolving.get_mut(&self.thread) else {
                return;
            };
            if let Some(index) = chain.iter().rposition(|resolving| resolving == self.name) {
                chain.remove(index);
            }
            if chain.is_empty() {
                state.resolving.remove(&self.thread);
            }
        });
    }
}

enum Lookup {
    Found(DynSvc),
    Resolve(Svc<dyn Provider>),
}

/// A dependency injection container. Services are registered and resolved by
/// name.
///
/// An injector exists in one of two phases. During the config phase of
/// [`bootstrap()`](crate::bootstrap), it resolves constants, the
/// [`Provide`] utility and the provider objects themselves (requested as
/// `<name>Provider`). Once configuration has finished, a run-phase injector
/// is created from the finalized providers. It creates each service the
/// first time it is requested and returns that same instance for every
/// later request.
///
/// Cloning the injector does not clone the services inside of it. Instead,
/// both handles use the same providers and cache, meaning that the injector
/// can be passed to a service as a dependency. It can be requested as
/// `$injector` without being registered.
///
/// ```
/// use module_injector::{bootstrap, inject, Injector, Module, Svc};
///
/// struct Numbers(Injector);
///
/// impl Numbers {
///     fn doubled(&self, name: &str) -> i32 {
///         let value: Svc<i32> = self.0.get(name).unwrap();
///         *value * 2
///     }
/// }
///
/// let module = Module::new("app");
/// module.constant("answer", 21i32);
/// module.service("numbers", inject(["$injector"], Numbers));
///
/// let app = bootstrap(&module).unwrap().into_injector();
/// let numbers: Svc<Numbers> = app.get("numbers").unwrap();
/// assert_eq!(42, numbers.doubled("answer"));
/// ```
#[derive(Clone)]
pub struct Injector {
    state: Shared<InjectorState>,
    events: EventBus,
}

impl Injector {
    fn new(phase: Phase, registry: Registry, events: EventBus) -> Self {
        Injector {
            state: SharedEx::new(InjectorState {
                phase,
                sealed: false,
                registry,
                instances: HashMap::new(),
                resolving: HashMap::new(),
            }),
            events,
        }
    }

    /// Creates a config-phase injector with no registrations.
    pub(crate) fn config(events: EventBus) -> Self {
        Injector::new(Phase::Config, Registry::default(), events)
    }

    /// Creates a run-phase injector from a finalized provider map.
    pub(crate) fn run(registry: Registry, events: EventBus) -> Self {
        let injector = Injector::new(Phase::Run, registry, events);
        let emitter: DynSvc = Svc::new(Emitter::new(injector.events.clone()));
        let subscriber: DynSvc = Svc::new(Subscriber::new(injector.events.clone()));
        injector.state.with_inner_mut(|state| {
            state.instances.insert(EMIT.to_owned(), emitter);
            state.instances.insert(ON.to_owned(), subscriber);
        });
        injector
    }

    /// Performs a request for a service by name. The type requested
    /// determines how the resolved value is returned (see [`Dependency`]):
    ///
    /// - [`Svc<T>`]: the value downcast to `T`. Fails with
    ///   [`InjectError::InvalidType`] if it is not a `T`.
    /// - [`Injector`]: an injector handle (only useful with `$injector`).
    ///
    /// ```
    /// use module_injector::{bootstrap, Module, Svc};
    ///
    /// let module = Module::new("app");
    /// module.factory("answer", || 42i32);
    ///
    /// let app = bootstrap(&module).unwrap().into_injector();
    /// let answer: Svc<i32> = app.get("answer").unwrap();
    /// assert_eq!(42, *answer);
    ///
    /// let missing = app.get::<Svc<i32>>("question").unwrap_err();
    /// assert_eq!("Unknown provider: questionProvider", missing.to_string());
    /// ```
    pub fn get<D: Dependency>(&self, name: &str) -> InjectResult<D> {
        let service = self.get_dyn(name)?;
        D::from_service(name, service)
    }

    /// Gets a service by name as a type-erased service pointer.
    pub fn get_dyn(&self, name: &str) -> InjectResult<DynSvc> {
        if name == INJECTOR {
            return Ok(Svc::new(self.clone()));
        }

        let phase = self.state.with_inner(|state| state.phase);
        if name == PROVIDE && phase == Phase::Config {
            return Ok(Svc::new(Provide::new(self.clone())));
        }

        let lookup = self.state.with_inner_mut(|state| match state.phase {
            Phase::Config => Self::lookup_config(state, name),
            Phase::Run => Self::lookup_run(state, name),
        })?;

        match lookup {
            Lookup::Found(service) => Ok(service),
            Lookup::Resolve(provider) => {
                let _in_flight = InFlight {
                    injector: self,
                    name,
                    thread: thread::current().id(),
                };
                self.activate(name, provider.as_ref())
            }
        }
    }

    fn lookup_config(state: &InjectorState, name: &str) -> InjectResult<Lookup> {
        if state.sealed {
            return Err(InjectError::Sealed {
                name: name.to_owned(),
            });
        }

        if let Some(constant) = state.registry.constants.get(name) {
            return Ok(Lookup::Found(constant.clone()));
        }

        name.strip_suffix(PROVIDER_SUFFIX)
            .and_then(|service_name| state.registry.providers.get(service_name))
            .map(|handle| Lookup::Found(handle.object().clone()))
            .ok_or_else(|| InjectError::UnknownProvider {
                name: provider_name(name),
            })
    }

    fn lookup_run(state: &mut InjectorState, name: &str) -> InjectResult<Lookup> {
        if let Some(constant) = state.registry.constants.get(name) {
            return Ok(Lookup::Found(constant.clone()));
        }

        if let Some(instance) = state.instances.get(name) {
            trace!(service = name, "using cached instance");
            return Ok(Lookup::Found(instance.clone()));
        }

        let handle = state.registry.providers.get(name).ok_or_else(|| {
            InjectError::UnknownProvider {
                name: format!("{name}{PROVIDER_SUFFIX}"),
            }
        })?;

        let chain = state.resolving.entry(thread::current().id()).or_default();
        if chain.iter().any(|resolving| resolving == name) {
            let mut path = chain.clone();
            path.push(name.to_owned());
            return Err(InjectError::CircularDependency { path });
        }

        chain.push(name.to_owned());
        Ok(Lookup::Resolve(handle.provider().clone()))
    }

    /// Calls a provider outside of the state lock, then caches its result.
    /// If another thread cached the same service first, its instance wins.
    fn activate(&self, name: &str, provider: &dyn Provider) -> InjectResult<DynSvc> {
        trace!(service = name, "activating service");
        let service = provider.provide(self)?;

        Ok(self.state.with_inner_mut(|state| {
            state
                .instances
                .entry(name.to_owned())
                .or_insert(service)
                .clone()
        }))
    }

    /// Checks whether a name can be resolved by this injector.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        if name == INJECTOR {
            return true;
        }

        self.state.with_inner(|state| {
            let registry = &state.registry;
            match state.phase {
                Phase::Config if state.sealed => false,
                Phase::Config => {
                    name == PROVIDE
                        || registry.constants.contains_key(name)
                        || name
                            .strip_suffix(PROVIDER_SUFFIX)
                            .is_some_and(|service| registry.providers.contains_key(service))
                }
                Phase::Run => {
                    registry.constants.contains_key(name)
                        || registry.providers.contains_key(name)
                        || state.instances.contains_key(name)
                }
            }
        })
    }

    /// A view of the services registered on this injector.
    #[must_use]
    pub fn services(&self) -> Services {
        Services::new(self.clone())
    }

    pub(crate) fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.with_inner(|state| {
            let registry = &state.registry;
            match state.phase {
                Phase::Config => registry
                    .constants
                    .keys()
                    .cloned()
                    .chain(
                        registry
                            .providers
                            .keys()
                            .map(|name| format!("{name}{PROVIDER_SUFFIX}")),
                    )
                    .collect(),
                Phase::Run => registry
                    .constants
                    .keys()
                    .chain(registry.providers.keys())
                    .chain(state.instances.keys())
                    .cloned()
                    .collect(),
            }
        });
        names.sort();
        names.dedup();
        names
    }

    /// Invokes a callable with its dependencies injected and returns its
    /// result.
    pub fn invoke<R: 'static, M>(&self, func: impl IntoInvoke<R, M>) -> InjectResult<R> {
        self.invoke_with(func, &Locals::new())
    }

    /// Invokes a callable with its dependencies injected. Dependencies set in
    /// `locals` are taken from there instead of the injector.
    pub fn invoke_with<R: 'static, M>(
        &self,
        func: impl IntoInvoke<R, M>,
        locals: &Locals,
    ) -> InjectResult<R> {
        self.invoke_dyn(&func.into_invoke(), locals)
    }

    /// Creates a new instance using a constructor with its dependencies
    /// injected. Unlike services registered on a module, the instance is not
    /// cached.
    pub fn instantiate<T, M>(&self, constructor: impl IntoInvoke<T, M>) -> InjectResult<T>
    where
        T: Service,
    {
        self.instantiate_with(constructor, &Locals::new())
    }

    /// Creates a new instance using a constructor with its dependencies
    /// injected. Dependencies set in `locals` are taken from there instead of
    /// the injector.
    pub fn instantiate_with<T, M>(
        &self,
        constructor: impl IntoInvoke<T, M>,
        locals: &Locals,
    ) -> InjectResult<T>
    where
        T: Service,
    {
        self.instantiate_dyn(&constructor.into_invoke(), locals)
    }

    /// Invokes a type-erased callable with its dependencies injected.
    pub fn invoke_dyn<R: 'static>(
        &self,
        func: &dyn Invoke<R>,
        locals: &Locals,
    ) -> InjectResult<R> {
        let args = self.resolve_all(func.dependencies(), locals)?;
        func.invoke(args)
    }

    /// Creates a new instance using a type-erased constructor.
    pub fn instantiate_dyn<T: 'static>(
        &self,
        constructor: &dyn Invoke<T>,
        locals: &Locals,
    ) -> InjectResult<T> {
        trace!(dependencies = ?constructor.dependencies(), "instantiating");
        let args = self.resolve_all(constructor.dependencies(), locals)?;
        constructor.invoke(args)
    }

    fn resolve_all(&self, names: &[String], locals: &Locals) -> InjectResult<Vec<DynSvc>> {
        names
            .iter()
            .map(|name| match locals.get(name) {
                Some(local) => Ok(local.clone()),
                None => self.get_dyn(name),
            })
            .collect()
    }

    /// Registers a handler for an event. Handlers are called in registration
    /// order each time the event is emitted through the `$emit` service.
    ///
    /// ```
    /// use module_injector::{bootstrap, DynSvc, Emitter, Module, Svc};
    /// use std::sync::{Arc, Mutex};
    ///
    /// let app = bootstrap(&Module::new("app")).unwrap().into_injector();
    ///
    /// let received = Arc::new(Mutex::new(Vec::new()));
    /// let sink = received.clone();
    /// app.on("test", move |data: &DynSvc| {
    ///     sink.lock().unwrap().push(*data.downcast_ref::<i32>().unwrap());
    /// });
    ///
    /// let emit: Svc<Emitter> = app.get("$emit").unwrap();
    /// emit.emit("test", 123i32);
    /// assert_eq!(vec![123], *received.lock().unwrap());
    /// ```
    pub fn on<H>(&self, name: &str, handler: H)
    where
        H: Service + Fn(&DynSvc),
    {
        self.events.on(name, handler);
    }

    /// Normalizes a registration and adds it to this injector's provider
    /// map. Provider constructors are invoked here, with this injector
    /// resolving their dependencies.
    pub(crate) fn register(&self, name: &str, registration: Registration) -> InjectResult<()> {
        if is_reserved(name) {
            return Err(InjectError::ReservedName {
                name: name.to_owned(),
            });
        }
        if self.state.with_inner(|state| state.sealed) {
            return Err(InjectError::Sealed {
                name: name.to_owned(),
            });
        }

        trace!(service = name, ?registration, "registering provider");
        let handle = match Normalized::from(registration) {
            Normalized::Constant(value) => {
                return self.insert(name, |registry| registry.insert_constant(name, value));
            }
            Normalized::Provider(handle) => handle,
            Normalized::Deferred(constructor) => {
                self.instantiate_dyn(constructor.as_ref(), &Locals::new())?
            }
        };
        self.insert(name, |registry| registry.insert_provider(name, handle))
    }

    /// Applies a change to the provider map unless it has been sealed while
    /// a provider constructor was running.
    fn insert(&self, name: &str, f: impl FnOnce(&mut Registry)) -> InjectResult<()> {
        self.state.with_inner_mut(|state| {
            if state.sealed {
                return Err(InjectError::Sealed {
                    name: name.to_owned(),
                });
            }
            f(&mut state.registry);
            Ok(())
        })
    }

    /// Moves the provider map out of this injector. Later registrations and
    /// config-phase lookups fail with [`InjectError::Sealed`].
    pub(crate) fn seal(&self) -> Registry {
        self.state.with_inner_mut(|state| {
            state.sealed = true;
            std::mem::take(&mut state.registry)
        })
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.state.with_inner(|state| {
            f.debug_struct("Injector")
                .field("phase", &state.phase)
                .field("constants", &state.registry.constants.len())
                .field("providers", &state.registry.providers.len())
                .field("instances", &state.instances.len())
                .finish_non_exhaustive()
        })
    }
}

/// The `Provider`-suffixed form of a requested name. Config-phase requests
/// are usually already suffixed.
fn provider_name(name: &str) -> String {
    if name.ends_with(PROVIDER_SUFFIX) {
        name.to_owned()
    } else {
        format!("{name}{PROVIDER_SUFFIX}")
    }
}
