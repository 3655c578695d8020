use crate::{Dependency, DynSvc, InjectResult, Injector};

/// A view of the services an injector can resolve, returned by
/// [`Injector::services()`]. Listing names does not create any service, and
/// each service is only created when it is read.
///
/// ```
/// use module_injector::{bootstrap, Module, Svc};
///
/// struct ServiceA {
///     test: i32,
/// }
///
/// let module = Module::new("app");
/// module.service("serviceA", || ServiceA { test: 123 });
///
/// let app = bootstrap(&module).unwrap().into_injector();
/// let services = app.services();
/// assert!(services.names().iter().any(|name| name == "serviceA"));
///
/// let service_a: Svc<ServiceA> = services.get("serviceA").unwrap();
/// assert_eq!(123, service_a.test);
/// ```
#[derive(Clone, Debug)]
pub struct Services {
    injector: Injector,
}

impl Services {
    pub(crate) fn new(injector: Injector) -> Self {
        Services { injector }
    }

    /// The names of every registered constant, provider and cached instance,
    /// in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.injector.names()
    }

    /// Checks whether a service is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.injector.has(name)
    }

    /// Resolves a service by name, creating it if needed.
    pub fn get<D: Dependency>(&self, name: &str) -> InjectResult<D> {
        self.injector.get(name)
    }

    /// Resolves a service by name as a type-erased service pointer.
    pub fn get_dyn(&self, name: &str) -> InjectResult<DynSvc> {
        self.injector.get_dyn(name)
    }
}
