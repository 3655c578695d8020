use crate::{
    ConstructorProvider, DynSvc, FactoryProvider, IntoInvoke, Invoke, MapInvoke,
    Provider, ProviderHandle, ProviderKind, Service, Svc, ValueProvider,
};
use std::fmt::{Debug, Formatter};

/// A single provider registration, as stored by a
/// [`Module`](crate::Module) or passed to [`Provide`](crate::Provide).
///
/// All kinds except [`Constant`](Registration::Constant) are normalized into
/// a [`ProviderHandle`] during the config phase, so the run-phase injector
/// resolves every service the same way.
#[derive(Clone)]
pub enum Registration {
    /// Resolves to the value as is.
    Value(DynSvc),

    /// Resolves to the value as is. Unlike a value, a constant is injectable
    /// under its bare name during both the config and run phases, and has no
    /// `<name>Provider` form.
    Constant(DynSvc),

    /// Resolves by invoking the factory with its dependencies injected.
    Factory(Svc<dyn Invoke<DynSvc>>),

    /// Resolves by calling the constructor with its dependencies injected.
    Service(Svc<dyn Invoke<DynSvc>>),

    /// A ready-made provider object.
    Provider(ProviderHandle),

    /// A constructor for a provider object. It is invoked with its
    /// dependencies injected by the config-phase injector.
    ProviderConstructor(Svc<dyn Invoke<ProviderHandle>>),
}

impl Registration {
    /// Creates a value registration.
    pub fn value(value: impl Service) -> Self {
        Registration::Value(Svc::new(value))
    }

    /// Creates a constant registration.
    pub fn constant(value: impl Service) -> Self {
        Registration::Constant(Svc::new(value))
    }

    /// Creates a factory registration.
    pub fn factory<R, M>(factory: impl IntoInvoke<R, M>) -> Self
    where
        R: Service,
    {
        Registration::Factory(Svc::new(MapInvoke::new(
            factory.into_invoke(),
            |result: R| Svc::new(result) as DynSvc,
        )))
    }

    /// Creates a service registration from a constructor.
    pub fn service<T, M>(constructor: impl IntoInvoke<T, M>) -> Self
    where
        T: Service,
    {
        Registration::Service(Svc::new(MapInvoke::new(
            constructor.into_invoke(),
            |instance: T| Svc::new(instance) as DynSvc,
        )))
    }

    /// Creates a registration from a provider object.
    pub fn provider(provider: impl Provider) -> Self {
        Registration::Provider(ProviderHandle::new(provider))
    }

    /// Creates a registration from a provider constructor.
    pub fn provider_with<P, M>(constructor: impl IntoInvoke<P, M>) -> Self
    where
        P: Provider,
    {
        Registration::ProviderConstructor(Svc::new(MapInvoke::new(
            constructor.into_invoke(),
            ProviderHandle::new::<P>,
        )))
    }

    /// Whether this is a constant registration.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        matches!(self, Registration::Constant(_))
    }
}

/// The result of normalizing a [`Registration`].
pub(crate) enum Normalized {
    Constant(DynSvc),
    Provider(ProviderHandle),
    Deferred(Svc<dyn Invoke<ProviderHandle>>),
}

impl From<Registration> for Normalized {
    fn from(registration: Registration) -> Self {
        match registration {
            Registration::Constant(value) => Normalized::Constant(value),
            Registration::Value(value) => Normalized::Provider(
                ProviderHandle::with_kind(ProviderKind::Value, ValueProvider::new(value)),
            ),
            Registration::Factory(factory) => Normalized::Provider(
                ProviderHandle::with_kind(ProviderKind::Factory, FactoryProvider::new(factory)),
            ),
            Registration::Service(constructor) => {
                Normalized::Provider(ProviderHandle::with_kind(
                    ProviderKind::Service,
                    ConstructorProvider::new(constructor),
                ))
            }
            Registration::Provider(handle) => Normalized::Provider(handle),
            Registration::ProviderConstructor(constructor) => Normalized::Deferred(constructor),
        }
    }
}

impl Debug for Registration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Registration::Value(_) => "Value",
            Registration::Constant(_) => "Constant",
            Registration::Factory(_) => "Factory",
            Registration::Service(_) => "Service",
            Registration::Provider(_) => "Provider",
            Registration::ProviderConstructor(_) => "ProviderConstructor",
        };
        f.write_str(kind)
    }
}
