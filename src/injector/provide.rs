use crate::{InjectResult, Injector, IntoInvoke, Provider, Registration, Service};

/// Registers providers while the application is being configured. This is
/// injectable as `$provide` in config callbacks of a
/// [`Module`](crate::Module).
///
/// Each method mirrors its counterpart on [`Module`](crate::Module), but
/// takes effect on the config-phase injector immediately: a provider added
/// here is injectable as `<name>Provider` by the callbacks that run after it
/// and replaces anything previously registered under the same name.
///
/// ```
/// use module_injector::{bootstrap, inject, Module, Provide, Svc};
///
/// let module = Module::new("app");
/// module.factory("test", || 123i32);
/// module.config(
///     inject(["$provide"], |provide: Svc<Provide>| provide.value("test", 456i32)).fallible(),
/// );
///
/// let app = bootstrap(&module).unwrap().into_injector();
/// assert_eq!(456, *app.get::<Svc<i32>>("test").unwrap());
/// ```
#[derive(Clone, Debug)]
pub struct Provide {
    injector: Injector,
}

impl Provide {
    pub(crate) fn new(injector: Injector) -> Self {
        Provide { injector }
    }

    /// Registers a value.
    pub fn value(&self, name: &str, value: impl Service) -> InjectResult<()> {
        self.register(name, Registration::value(value))
    }

    /// Registers a constant. Constants are injectable during the config phase
    /// from the moment they are registered.
    pub fn constant(&self, name: &str, value: impl Service) -> InjectResult<()> {
        self.register(name, Registration::constant(value))
    }

    /// Registers a factory.
    pub fn factory<R, M>(&self, name: &str, factory: impl IntoInvoke<R, M>) -> InjectResult<()>
    where
        R: Service,
    {
        self.register(name, Registration::factory(factory))
    }

    /// Registers a service constructor.
    pub fn service<T, M>(
        &self,
        name: &str,
        constructor: impl IntoInvoke<T, M>,
    ) -> InjectResult<()>
    where
        T: Service,
    {
        self.register(name, Registration::service(constructor))
    }

    /// Registers a provider object.
    pub fn provider(&self, name: &str, provider: impl Provider) -> InjectResult<()> {
        self.register(name, Registration::provider(provider))
    }

    /// Registers a provider constructor. The constructor is invoked right
    /// away, with its dependencies resolved by the config-phase injector.
    pub fn provider_with<P, M>(
        &self,
        name: &str,
        constructor: impl IntoInvoke<P, M>,
    ) -> InjectResult<()>
    where
        P: Provider,
    {
        self.register(name, Registration::provider_with(constructor))
    }

    /// Adds an already built registration. Once configuration has finished
    /// this fails with [`InjectError::Sealed`](crate::InjectError::Sealed).
    pub fn register(&self, name: &str, registration: Registration) -> InjectResult<()> {
        self.injector.register(name, registration)
    }
}
