use crate::{
    IntoInvoke, Invoke, MapInvoke, Provider, Registration, Service, Shared,
    SharedEx, Svc,
};
use std::collections::HashSet;

#[cfg(feature = "arc")]
mod types {
    use crate::InjectResult;
    use futures_util::future::BoxFuture;
    use std::future::Future;

    /// The completion of an asynchronous run callback.
    pub type Completion = BoxFuture<'static, InjectResult<()>>;

    /// A future that can be returned from an asynchronous run callback.
    pub trait RunFuture: Future<Output = InjectResult<()>> + Send + 'static {}
    impl<F: Future<Output = InjectResult<()>> + Send + 'static> RunFuture for F {}
}

#[cfg(feature = "rc")]
mod types {
    use crate::InjectResult;
    use futures_util::future::LocalBoxFuture;
    use std::future::Future;

    /// The completion of an asynchronous run callback.
    pub type Completion = LocalBoxFuture<'static, InjectResult<()>>;

    /// A future that can be returned from an asynchronous run callback.
    pub trait RunFuture: Future<Output = InjectResult<()>> + 'static {}
    impl<F: Future<Output = InjectResult<()>> + 'static> RunFuture for F {}
}

pub use types::*;

pub(crate) type ConfigFn = Svc<dyn Invoke<()>>;
pub(crate) type RunFn = Svc<dyn Invoke<Option<Completion>>>;

struct ModuleState {
    name: String,
    requires: Vec<Module>,
    registrations: Vec<(String, Registration)>,
    config_fns: Vec<ConfigFn>,
    run_fns: Vec<RunFn>,
}

/// A named group of registrations and callbacks. Modules can require other
/// modules, and [`bootstrap()`](crate::bootstrap) composes a module together
/// with everything it requires into a single application.
///
/// A module is a handle to shared state. Cloning it does not copy its
/// registrations, so the same module can be required by several others and
/// still be configured through any of its handles before the application is
/// bootstrapped.
///
/// ```
/// use module_injector::{bootstrap, inject, module, Module, Svc};
///
/// let core = Module::new("core");
/// core.constant("greeting", "Hello");
///
/// let app = module("app", [&core]);
/// app.factory(
///     "message",
///     inject(["greeting"], |greeting: Svc<&'static str>| format!("{greeting}, world!")),
/// );
///
/// let injector = bootstrap(&app).unwrap().into_injector();
/// let message: Svc<String> = injector.get("message").unwrap();
/// assert_eq!("Hello, world!", message.as_str());
/// ```
#[derive(Clone)]
pub struct Module {
    state: Shared<ModuleState>,
}

/// Creates a module that requires other modules.
pub fn module<'a, I>(name: &str, requires: I) -> Module
where
    I: IntoIterator<Item = &'a Module>,
{
    let module = Module::new(name);
    for required in requires {
        module.requires(required);
    }
    module
}

impl Module {
    /// Creates an empty module.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Module {
            state: SharedEx::new(ModuleState {
                name: name.to_owned(),
                requires: Vec::new(),
                registrations: Vec::new(),
                config_fns: Vec::new(),
                run_fns: Vec::new(),
            }),
        }
    }

    /// The name of this module.
    #[must_use]
    pub fn name(&self) -> String {
        self.state.with_inner(|state| state.name.clone())
    }

    /// Adds a required module. Required modules are configured before the
    /// modules requiring them.
    #[allow(clippy::must_use_candidate)]
    pub fn requires(&self, module: &Module) -> &Self {
        let module = module.clone();
        self.state
            .with_inner_mut(|state| state.requires.push(module));
        self
    }

    /// Registers a value. The value is the service as is.
    pub fn value(&self, name: &str, value: impl Service) -> &Self {
        self.register(name, Registration::value(value))
    }

    /// Registers a constant. Constants can be injected into config callbacks
    /// as well as during the run phase.
    pub fn constant(&self, name: &str, value: impl Service) -> &Self {
        self.register(name, Registration::constant(value))
    }

    /// Registers a factory. The service is the result of the factory, which
    /// is invoked with its dependencies injected the first time the service
    /// is requested.
    pub fn factory<R, M>(&self, name: &str, factory: impl IntoInvoke<R, M>) -> &Self
    where
        R: Service,
    {
        self.register(name, Registration::factory(factory))
    }

    /// Registers a service constructor. The service is a new instance built by
    /// the constructor the first time the service is requested.
    ///
    /// ```
    /// use module_injector::{bootstrap, inject, Module, Svc};
    ///
    /// struct Counter {
    ///     start: u32,
    /// }
    ///
    /// impl Counter {
    ///     fn new(start: Svc<u32>) -> Self {
    ///         Counter { start: *start }
    ///     }
    /// }
    ///
    /// let module = Module::new("app");
    /// module.constant("start", 10u32);
    /// module.service("counter", inject(["start"], Counter::new));
    ///
    /// let app = bootstrap(&module).unwrap().into_injector();
    /// assert_eq!(10, app.get::<Svc<Counter>>("counter").unwrap().start);
    /// ```
    pub fn service<T, M>(&self, name: &str, constructor: impl IntoInvoke<T, M>) -> &Self
    where
        T: Service,
    {
        self.register(name, Registration::service(constructor))
    }

    /// Registers a provider object. During the config phase the object is
    /// injectable as `<name>Provider`.
    pub fn provider(&self, name: &str, provider: impl Provider) -> &Self {
        self.register(name, Registration::provider(provider))
    }

    /// Registers a provider constructor. The provider object is created during
    /// the config phase, with the constructor's dependencies resolved by the
    /// config-phase injector.
    pub fn provider_with<P, M>(&self, name: &str, constructor: impl IntoInvoke<P, M>) -> &Self
    where
        P: Provider,
    {
        self.register(name, Registration::provider_with(constructor))
    }

    /// Adds a registration. A registration under a name this module already
    /// registered replaces the previous one.
    #[allow(clippy::must_use_candidate)]
    pub fn register(&self, name: &str, registration: Registration) -> &Self {
        self.state.with_inner_mut(|state| {
            match state
                .registrations
                .iter_mut()
                .find(|(registered, _)| registered == name)
            {
                Some((_, existing)) => *existing = registration,
                None => state.registrations.push((name.to_owned(), registration)),
            }
        });
        self
    }

    /// Adds a config callback. Config callbacks can inject `$provide`,
    /// constants and provider objects (as `<name>Provider`).
    pub fn config<M>(&self, callback: impl IntoInvoke<(), M>) -> &Self {
        let callback: ConfigFn = Svc::new(callback.into_invoke());
        self.state
            .with_inner_mut(|state| state.config_fns.push(callback));
        self
    }

    /// Adds a run callback. Run callbacks are invoked by the run-phase
    /// injector once the application has been configured.
    pub fn run<M>(&self, callback: impl IntoInvoke<(), M>) -> &Self {
        let callback: RunFn = Svc::new(MapInvoke::new(
            callback.into_invoke(),
            |()| -> Option<Completion> { None },
        ));
        self.state.with_inner_mut(|state| state.run_fns.push(callback));
        self
    }

    /// Adds an asynchronous run callback. The callback itself is invoked like
    /// any other run callback, and the future it returns is awaited by the
    /// [`Bootstrap`](crate::Bootstrap) handle.
    pub fn run_async<F, M>(&self, callback: impl IntoInvoke<F, M>) -> &Self
    where
        F: RunFuture,
    {
        let callback: RunFn = Svc::new(MapInvoke::new(
            callback.into_invoke(),
            |future: F| -> Option<Completion> { Some(Box::pin(future) as Completion) },
        ));
        self.state.with_inner_mut(|state| state.run_fns.push(callback));
        self
    }

    /// This module and every module it requires, directly or not. Required
    /// modules come before the modules requiring them, in the order they were
    /// added. Each module appears once, even if it is required more than
    /// once or the requirements form a cycle.
    #[must_use]
    pub fn flatten(&self) -> Vec<Module> {
        let mut visited = HashSet::new();
        let mut flattened = Vec::new();
        self.flatten_into(&mut visited, &mut flattened);
        flattened
    }

    fn flatten_into(&self, visited: &mut HashSet<usize>, flattened: &mut Vec<Module>) {
        if !visited.insert(self.id()) {
            return;
        }

        let requires = self.state.with_inner(|state| state.requires.clone());
        for required in &requires {
            required.flatten_into(visited, flattened);
        }
        flattened.push(self.clone());
    }

    fn id(&self) -> usize {
        Shared::<ModuleState>::as_ptr(&self.state) as usize
    }

    pub(crate) fn registrations(&self) -> Vec<(String, Registration)> {
        self.state.with_inner(|state| state.registrations.clone())
    }

    pub(crate) fn config_fns(&self) -> Vec<ConfigFn> {
        self.state.with_inner(|state| state.config_fns.clone())
    }

    pub(crate) fn run_fns(&self) -> Vec<RunFn> {
        self.state.with_inner(|state| state.run_fns.clone())
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Required modules are named outside of the lock, since a module
        // may require itself.
        let (name, requires, registrations) = self.state.with_inner(|state| {
            let registrations: Vec<String> = state
                .registrations
                .iter()
                .map(|(name, _)| name.clone())
                .collect();
            (state.name.clone(), state.requires.clone(), registrations)
        });
        let requires: Vec<String> = requires.iter().map(Module::name).collect();

        f.debug_struct("Module")
            .field("name", &name)
            .field("requires", &requires)
            .field("registrations", &registrations)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(modules: &[Module]) -> Vec<String> {
        modules.iter().map(Module::name).collect()
    }

    #[test]
    fn diamond_is_flattened_once() {
        let base = Module::new("base");
        let left = module("left", [&base]);
        let right = module("right", [&base]);
        let app = module("app", [&left, &right]);

        assert_eq!(vec!["base", "left", "right", "app"], names(&app.flatten()));
    }

    #[test]
    fn cyclic_requires_terminate() {
        let a = Module::new("a");
        let b = module("b", [&a]);
        a.requires(&b);

        assert_eq!(vec!["b", "a"], names(&a.flatten()));
        assert_eq!(vec!["a", "b"], names(&b.flatten()));
    }

    #[test]
    fn reregistering_replaces_in_place() {
        let module = Module::new("app");
        module
            .value("first", 1i32)
            .value("second", 2i32)
            .constant("first", 3i32);

        let registrations = module.registrations();
        assert_eq!(2, registrations.len());
        assert_eq!("first", registrations[0].0);
        assert!(registrations[0].1.is_constant());
        assert_eq!("second", registrations[1].0);
    }

    #[test]
    fn self_requiring_module_can_be_formatted() {
        let a = Module::new("a");
        a.requires(&a).value("svc", 1i32);

        let formatted = format!("{a:?}");
        assert!(formatted.contains(r#"requires: ["a"]"#), "{formatted}");
        assert!(formatted.contains(r#"registrations: ["svc"]"#), "{formatted}");
        assert_eq!(vec!["a"], names(&a.flatten()));
    }
}
