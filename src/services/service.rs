#![allow(clippy::used_underscore_binding)]

use derive_more::Display;
use downcast_rs::impl_downcast;
use std::error::Error;

#[cfg(feature = "arc")]
mod types {
    use crate::InjectError;
    use std::sync::Arc;

    /// A reference-counted pointer holding a service. The pointer type is
    /// determined by the feature flags passed to this crate.
    pub type Svc<T> = Arc<T>;

    /// A result from attempting to resolve a service or invoke a callable
    /// with its dependencies.
    pub type InjectResult<T> = Result<T, InjectError>;

    /// The boxed error type carried by [`InjectError::ActivationFailed`].
    pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

    /// Implemented automatically on types that are capable of being a service.
    pub trait Service: downcast_rs::DowncastSync {}
    impl<T: ?Sized + downcast_rs::DowncastSync> Service for T {}
}

#[cfg(feature = "rc")]
mod types {
    use crate::InjectError;
    use std::rc::Rc;

    /// A reference-counted pointer holding a service. The pointer type is
    /// determined by the feature flags passed to this crate.
    pub type Svc<T> = Rc<T>;

    /// A result from attempting to resolve a service or invoke a callable
    /// with its dependencies.
    pub type InjectResult<T> = Result<T, InjectError>;

    /// The boxed error type carried by [`InjectError::ActivationFailed`].
    pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

    /// Implemented automatically on types that are capable of being a service.
    pub trait Service: downcast_rs::Downcast {}
    impl<T: ?Sized + downcast_rs::Downcast> Service for T {}
}

pub use types::*;

#[cfg(feature = "arc")]
impl_downcast!(sync Service);

#[cfg(feature = "rc")]
impl_downcast!(Service);

/// A service pointer holding an instance of `dyn Service`. Every value the
/// injector hands out is stored as one of these.
pub type DynSvc = Svc<dyn Service>;

/// Converts a type-erased service pointer back into a pointer to its concrete
/// type. On failure, the original pointer is returned.
pub(crate) fn downcast_svc<T: Service>(service: DynSvc) -> Result<Svc<T>, DynSvc> {
    #[cfg(feature = "arc")]
    let result = service.downcast_arc::<T>();
    #[cfg(feature = "rc")]
    let result = service.downcast_rc::<T>();
    result
}

/// An error that has occurred while composing modules or resolving services.
#[derive(Debug, Display)]
#[non_exhaustive]
pub enum InjectError {
    /// No constant or provider is registered under the requested name. The
    /// name is always the `Provider`-suffixed form of the request.
    #[display(fmt = "Unknown provider: {}", name)]
    UnknownProvider {
        /// The provider name that could not be found.
        name: String,
    },

    /// A service was requested while it was already being resolved.
    #[display(fmt = "Circular dependency found: {}", "fmt_cycle(path)")]
    CircularDependency {
        /// The chain of services being resolved, ending with the service
        /// that was requested again.
        path: Vec<String>,
    },

    /// The resolved value is not of the type it was requested as.
    #[display(fmt = "{} is not of type {}", name, expected)]
    InvalidType {
        /// The name the value was resolved under.
        name: String,
        /// The type name the value was requested as.
        expected: &'static str,
    },

    /// A callable declared a different number of dependency names than it
    /// accepts arguments.
    #[display(
        fmt = "callable takes {} arguments but declares {} dependencies",
        expected,
        actual
    )]
    ArityMismatch {
        /// The number of arguments the callable accepts.
        expected: usize,
        /// The number of dependency names it declared.
        actual: usize,
    },

    /// The name is reserved for a built-in service and cannot be registered.
    #[display(fmt = "{} is reserved and cannot be registered", name)]
    ReservedName {
        /// The reserved name.
        name: String,
    },

    /// A provider was registered after the application finished
    /// configuring, usually through a [`Provide`](crate::Provide) kept past
    /// its config callback.
    #[display(fmt = "{} cannot be registered after configuration has finished", name)]
    Sealed {
        /// The name that was being registered or requested.
        name: String,
    },

    /// A factory, constructor or callback failed. The inner error is
    /// reported unchanged.
    #[display(fmt = "{}", inner)]
    ActivationFailed {
        /// The error raised by application code.
        inner: BoxError,
    },

    /// An unexpected error has occurred. This is usually caused by a bug in
    /// the library itself.
    #[display(fmt = "an unexpected error occurred (please report this): {}", _0)]
    InternalError(String),
}

impl InjectError {
    /// Wraps an application error so it can be returned from a fallible
    /// callable.
    ///
    /// ```
    /// use module_injector::InjectError;
    ///
    /// let error = InjectError::activation("connection refused");
    /// assert_eq!("connection refused", error.to_string());
    /// ```
    pub fn activation(inner: impl Into<BoxError>) -> Self {
        InjectError::ActivationFailed {
            inner: inner.into(),
        }
    }
}

impl Error for InjectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            InjectError::ActivationFailed { inner } => Some(inner.as_ref()),
            _ => None,
        }
    }
}

fn fmt_cycle(cycle: &[String]) -> String {
    let mut joined = String::new();
    for item in cycle.iter().rev() {
        if !joined.is_empty() {
            joined.push_str(" <- ");
        }
        joined.push_str(item);
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_is_printed_from_latest_request() {
        let error = InjectError::CircularDependency {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!("Circular dependency found: a <- b <- a", error.to_string());
    }

    #[test]
    fn activation_failure_exposes_source() {
        let error = InjectError::activation("boom");
        assert_eq!("boom", error.to_string());
        assert_eq!("boom", error.source().unwrap().to_string());
    }

    #[test]
    fn downcast_returns_original_on_mismatch() {
        let service: DynSvc = Svc::new(5i32);
        let Err(service) = downcast_svc::<String>(service) else {
            unreachable!("an i32 is not a String");
        };
        let Ok(value) = downcast_svc::<i32>(service) else {
            unreachable!("the original pointer should still hold an i32");
        };
        assert_eq!(5, *value);
    }
}
