use crate::{DynSvc, InjectResult, Injector, Invoke, Service, Svc};
use std::fmt::{Debug, Formatter};

/// Weakly typed provider object. Given the run-phase injector, this produces
/// the value registered under the provider's name. The injector calls this at
/// most once per name and caches the result. This is automatically
/// implemented for all types that implement [`TypedProvider`], which should
/// be preferred where possible.
pub trait Provider: Service {
    /// Provides the instance of the service.
    fn provide(&self, injector: &Injector) -> InjectResult<DynSvc>;
}

impl<T> Provider for T
where
    T: TypedProvider,
{
    fn provide(&self, injector: &Injector) -> InjectResult<DynSvc> {
        let get = self.get();
        let result = injector.invoke_dyn(get.as_ref(), &crate::Locals::new())?;
        Ok(Svc::new(result))
    }
}

/// A strongly-typed provider object. During the config phase the object
/// itself is injectable under `<name>Provider`, so any methods it exposes can
/// be used to configure it. During the run phase the callable returned by
/// [`get()`](TypedProvider::get) is invoked with its dependencies injected,
/// and its result becomes the service.
///
/// Provider objects are shared, so configuration state needs interior
/// mutability.
///
/// # Example
///
/// ```
/// use module_injector::{
///     bootstrap, inject, Invoke, Module, Svc, TypedProvider,
/// };
/// use std::sync::Mutex;
///
/// struct Greeter(String);
///
/// #[derive(Default)]
/// struct GreeterProvider {
///     greeting: Mutex<String>,
/// }
///
/// impl GreeterProvider {
///     fn set_greeting(&self, greeting: &str) {
///         *self.greeting.lock().unwrap() = greeting.to_owned();
///     }
/// }
///
/// impl TypedProvider for GreeterProvider {
///     type Result = Greeter;
///
///     fn get(&self) -> Svc<dyn Invoke<Greeter>> {
///         let greeting = self.greeting.lock().unwrap().clone();
///         Svc::new(inject(["name"], move |name: Svc<&'static str>| {
///             Greeter(format!("{greeting}, {name}!"))
///         }))
///     }
/// }
///
/// let module = Module::new("app");
/// module.constant("name", "world");
/// module.provider("greeter", GreeterProvider::default());
/// module.config(inject(
///     ["greeterProvider"],
///     |provider: Svc<GreeterProvider>| provider.set_greeting("Hello"),
/// ));
///
/// let app = bootstrap(&module).unwrap().into_injector();
/// let greeter: Svc<Greeter> = app.get("greeter").unwrap();
/// assert_eq!("Hello, world!", greeter.0);
/// ```
pub trait TypedProvider: Service {
    /// The type of service this provider produces.
    type Result: Service;

    /// Returns the callable that produces the service. Its dependencies are
    /// injected by the run-phase injector.
    fn get(&self) -> Svc<dyn Invoke<Self::Result>>;
}

/// What kind of registration a provider object was normalized from.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum ProviderKind {
    /// Registered with `value`.
    Value,
    /// Registered with `factory`.
    Factory,
    /// Registered with `service`.
    Service,
    /// Registered as a custom provider object.
    Provider,
}

/// A normalized provider object. Holds the object both as an injectable
/// service (its `<name>Provider` form during config) and as a [`Provider`]
/// (used during the run phase). Both point to the same allocation.
#[derive(Clone)]
pub struct ProviderHandle {
    kind: ProviderKind,
    object: DynSvc,
    provider: Svc<dyn Provider>,
}

impl ProviderHandle {
    /// Wraps a custom provider object.
    pub fn new<P: Provider>(provider: P) -> Self {
        ProviderHandle::with_kind(ProviderKind::Provider, provider)
    }

    pub(crate) fn with_kind<P: Provider>(kind: ProviderKind, provider: P) -> Self {
        let provider = Svc::new(provider);
        ProviderHandle {
            kind,
            object: provider.clone(),
            provider,
        }
    }

    /// The kind of registration this provider came from.
    #[must_use]
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// The provider object as an injectable service.
    #[must_use]
    pub fn object(&self) -> &DynSvc {
        &self.object
    }

    /// The provider object as a [`Provider`].
    #[must_use]
    pub fn provider(&self) -> &Svc<dyn Provider> {
        &self.provider
    }
}

impl Debug for ProviderHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
