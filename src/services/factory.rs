use crate::{DynSvc, InjectResult, Injector, Invoke, Locals, Provider, Svc};

/// The provider object behind a `factory` registration. The factory is
/// invoked with its dependencies injected and its result is the service.
pub struct FactoryProvider {
    factory: Svc<dyn Invoke<DynSvc>>,
}

impl FactoryProvider {
    /// Creates a provider from a type-erased factory.
    #[must_use]
    pub fn new(factory: Svc<dyn Invoke<DynSvc>>) -> Self {
        FactoryProvider { factory }
    }

    /// The names of the factory's dependencies.
    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        self.factory.dependencies()
    }
}

impl Provider for FactoryProvider {
    fn provide(&self, injector: &Injector) -> InjectResult<DynSvc> {
        injector.invoke_dyn(self.factory.as_ref(), &Locals::new())
    }
}

/// The provider object behind a `service` registration. The constructor is
/// called with its dependencies injected and the new instance is the
/// service.
pub struct ConstructorProvider {
    constructor: Svc<dyn Invoke<DynSvc>>,
}

impl ConstructorProvider {
    /// Creates a provider from a type-erased constructor.
    #[must_use]
    pub fn new(constructor: Svc<dyn Invoke<DynSvc>>) -> Self {
        ConstructorProvider { constructor }
    }

    /// The names of the constructor's dependencies.
    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        self.constructor.dependencies()
    }
}

impl Provider for ConstructorProvider {
    fn provide(&self, injector: &Injector) -> InjectResult<DynSvc> {
        injector.instantiate_dyn(self.constructor.as_ref(), &Locals::new())
    }
}
