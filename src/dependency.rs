use crate::{downcast_svc, DynSvc, InjectError, InjectResult, Injector, Service, Svc};
use std::collections::HashMap;

/// A type that can be injected as an argument of a callable. The injector
/// resolves each declared dependency name to a [`DynSvc`] and then converts it
/// into the parameter type through this trait.
///
/// - [`Svc<T>`]: the resolved value, downcast to `T`.
/// - [`Injector`]: the injector handle itself (requested as `$injector`).
pub trait Dependency: Sized + 'static {
    /// Converts a resolved service into this dependency. `name` is the name
    /// the service was resolved under and is used for diagnostics.
    fn from_service(name: &str, service: DynSvc) -> InjectResult<Self>;
}

impl<T: Service> Dependency for Svc<T> {
    fn from_service(name: &str, service: DynSvc) -> InjectResult<Self> {
        downcast_svc(service).map_err(|_| InjectError::InvalidType {
            name: name.to_owned(),
            expected: std::any::type_name::<T>(),
        })
    }
}

impl Dependency for Injector {
    fn from_service(name: &str, service: DynSvc) -> InjectResult<Self> {
        let injector: Svc<Injector> = Dependency::from_service(name, service)?;
        Ok(Injector::clone(&injector))
    }
}

/// Local overrides passed to an invocation. A dependency whose name is set
/// here is taken from the locals instead of being resolved by the injector.
///
/// ```
/// use module_injector::{bootstrap, inject, Locals, Module, Svc};
///
/// let module = Module::new("app");
/// module.constant("greeting", "hello");
///
/// let app = bootstrap(&module).unwrap().into_injector();
/// let greet = inject(["greeting"], |greeting: Svc<&'static str>| greeting.len());
/// assert_eq!(5, app.invoke(greet).unwrap());
///
/// let greet = inject(["greeting"], |greeting: Svc<&'static str>| greeting.len());
/// let locals = Locals::new().with("greeting", "bonjour");
/// assert_eq!(7, app.invoke_with(greet, &locals).unwrap());
/// ```
#[derive(Clone, Default)]
pub struct Locals {
    values: HashMap<String, DynSvc>,
}

impl Locals {
    /// Creates an empty set of locals.
    #[must_use]
    pub fn new() -> Self {
        Locals::default()
    }

    /// Adds a local value, returning the updated set.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Service) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds an already shared local value, returning the updated set.
    #[must_use]
    pub fn with_dyn(mut self, name: &str, value: DynSvc) -> Self {
        self.insert_dyn(name, value);
        self
    }

    /// Sets a local value. If a value was already set under that name, it is
    /// returned.
    pub fn insert(&mut self, name: &str, value: impl Service) -> Option<DynSvc> {
        self.insert_dyn(name, Svc::new(value))
    }

    /// Sets an already shared local value.
    pub fn insert_dyn(&mut self, name: &str, value: DynSvc) -> Option<DynSvc> {
        self.values.insert(name.to_owned(), value)
    }

    /// Removes and returns a local value if it has been set.
    pub fn remove(&mut self, name: &str) -> Option<DynSvc> {
        self.values.remove(name)
    }

    /// Gets a local value if it has been set.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DynSvc> {
        self.values.get(name)
    }
}

impl std::fmt::Debug for Locals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_is_inserted_then_removed() {
        let mut locals = Locals::new();
        locals.insert("foo", "bar".to_string());
        let value = locals.get("foo").cloned().unwrap();
        let value: Svc<String> = Dependency::from_service("foo", value).unwrap();
        assert_eq!("bar", value.as_str());

        assert!(locals.remove("foo").is_some());
        assert!(locals.get("foo").is_none());
    }

    #[test]
    fn wrong_type_is_reported_with_name() {
        let service: DynSvc = Svc::new(1u8);
        match <Svc<String> as Dependency>::from_service("foo", service) {
            Err(InjectError::InvalidType { name, .. }) if name == "foo" => {}
            Err(error) => Err(error).unwrap(),
            Ok(_) => unreachable!("u8 should not downcast to String"),
        }
    }
}
