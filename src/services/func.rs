use crate::{Dependency, DynSvc, InjectError, InjectResult, Service};
use std::marker::PhantomData;

/// A function whose arguments can be injected. All functions of arity 12 or
/// less are automatically injectable functions if each of their parameters
/// is a valid [`Dependency`].
///
/// This trait only knows the types of the arguments. The names they are
/// resolved under come from an [`Injectable`], created with [`inject()`] or
/// [`injectable!`](crate::injectable).
///
/// ## Type parameters
/// * `D` - Tuple of this function's parameter types.
pub trait InjectFn<D>: Service {
    /// The value returned by this function.
    type Output;

    /// The number of arguments this function takes.
    const ARITY: usize;

    /// Converts each resolved argument into its parameter type, then calls
    /// this function.
    fn inject(&self, names: &[String], args: Vec<DynSvc>) -> InjectResult<Self::Output>;
}

macro_rules! impl_inject_fn {
    () => {
        impl_inject_fn!(@impl ());
    };
    ($first:ident $(, $rest:ident)*) => {
        impl_inject_fn!(@impl ($first $(, $rest)*));
        impl_inject_fn!($($rest),*);
    };
    (@impl ($($type_name:ident),*)) => {
        impl<F, R $(, $type_name)*> InjectFn<($($type_name,)*)> for F
        where
            F: Service + Fn($($type_name),*) -> R,
            $($type_name: Dependency,)*
        {
            type Output = R;

            const ARITY: usize = <[&'static str]>::len(&[$(stringify!($type_name)),*]);

            #[allow(unused_variables, unused_mut, non_snake_case)]
            fn inject(&self, names: &[String], args: Vec<DynSvc>) -> InjectResult<R> {
                let mut args = names.iter().zip(args);
                $(
                    let $type_name = match args.next() {
                        Some((name, service)) => <$type_name as Dependency>::from_service(name, service)?,
                        None => {
                            return Err(InjectError::InternalError(
                                "fewer arguments were resolved than declared".to_owned(),
                            ))
                        }
                    };
                )*
                Ok(self($($type_name),*))
            }
        }
    };
}

impl_inject_fn!(T0, T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);

/// A callable with an ordered list of named dependencies. This is what the
/// injector invokes: it resolves each name returned by
/// [`dependencies()`](Invoke::dependencies) and passes the results to
/// [`invoke()`](Invoke::invoke) in the same order.
pub trait Invoke<R>: Service {
    /// The names of the dependencies of this callable, in argument order.
    fn dependencies(&self) -> &[String];

    /// Invokes the callable with its resolved dependencies.
    fn invoke(&self, args: Vec<DynSvc>) -> InjectResult<R>;
}

/// An [`InjectFn`] paired with the names of its dependencies.
pub struct Injectable<F, D> {
    names: Vec<String>,
    func: F,
    marker: PhantomData<fn(D)>,
}

impl<F, D> Injectable<F, D>
where
    F: InjectFn<D>,
{
    /// Marks this callable as able to fail. The callable returns an
    /// [`InjectResult<R>`], and an error it returns is propagated to whoever
    /// resolved or invoked it.
    ///
    /// ```
    /// use module_injector::{bootstrap, inject, InjectError, Module, Svc};
    ///
    /// let module = Module::new("app");
    /// module.constant("port", 80u16);
    /// module.factory(
    ///     "socket",
    ///     inject(["port"], |port: Svc<u16>| {
    ///         if *port < 1024 {
    ///             Err(InjectError::activation("privileged port"))
    ///         } else {
    ///             Ok(*port)
    ///         }
    ///     })
    ///     .fallible(),
    /// );
    ///
    /// let app = bootstrap(&module).unwrap().into_injector();
    /// let error = app.get::<Svc<u16>>("socket").unwrap_err();
    /// assert_eq!("privileged port", error.to_string());
    /// ```
    #[must_use]
    pub fn fallible(self) -> Fallible<F, D> {
        Fallible { inner: self }
    }
}

impl<F, D> Invoke<<F as InjectFn<D>>::Output> for Injectable<F, D>
where
    F: InjectFn<D>,
    D: 'static,
{
    fn dependencies(&self) -> &[String] {
        &self.names
    }

    fn invoke(&self, args: Vec<DynSvc>) -> InjectResult<<F as InjectFn<D>>::Output> {
        if self.names.len() != F::ARITY {
            return Err(InjectError::ArityMismatch {
                expected: F::ARITY,
                actual: self.names.len(),
            });
        }

        self.func.inject(&self.names, args)
    }
}

/// An [`Injectable`] whose function returns an [`InjectResult`]. See
/// [`Injectable::fallible()`].
pub struct Fallible<F, D> {
    inner: Injectable<F, D>,
}

impl<F, D, R> Invoke<R> for Fallible<F, D>
where
    F: InjectFn<D, Output = InjectResult<R>>,
    D: 'static,
{
    fn dependencies(&self) -> &[String] {
        Invoke::dependencies(&self.inner)
    }

    fn invoke(&self, args: Vec<DynSvc>) -> InjectResult<R> {
        Invoke::invoke(&self.inner, args)?
    }
}

/// Maps the result of another callable. Used to erase the result types of
/// registered callables.
pub(crate) struct MapInvoke<I, R, T> {
    inner: I,
    map: fn(R) -> T,
}

impl<I, R, T> MapInvoke<I, R, T> {
    pub(crate) fn new(inner: I, map: fn(R) -> T) -> Self {
        MapInvoke { inner, map }
    }
}

impl<I, R, T> Invoke<T> for MapInvoke<I, R, T>
where
    I: Invoke<R>,
    R: 'static,
    T: 'static,
{
    fn dependencies(&self) -> &[String] {
        self.inner.dependencies()
    }

    fn invoke(&self, args: Vec<DynSvc>) -> InjectResult<T> {
        self.inner.invoke(args).map(self.map)
    }
}

/// Marker for callables that already declare their dependencies.
#[doc(hidden)]
pub enum Declared {}

/// Marker for functions without parameters.
#[doc(hidden)]
pub enum NoDependencies {}

/// Defines a conversion into an [`Invoke`]. Anything accepting a callable
/// takes this trait so that callables with declared dependencies and plain
/// functions without parameters can be passed the same way.
///
/// The `M` parameter only disambiguates the implementations and is always
/// inferred.
pub trait IntoInvoke<R, M> {
    /// The resulting callable.
    type Invoke: Invoke<R>;

    /// Performs the conversion.
    fn into_invoke(self) -> Self::Invoke;
}

impl<I, R> IntoInvoke<R, Declared> for I
where
    I: Invoke<R>,
{
    type Invoke = I;

    fn into_invoke(self) -> Self::Invoke {
        self
    }
}

impl<F, R> IntoInvoke<R, NoDependencies> for F
where
    F: InjectFn<(), Output = R>,
{
    type Invoke = Injectable<F, ()>;

    fn into_invoke(self) -> Self::Invoke {
        Injectable {
            names: Vec::new(),
            func: self,
            marker: PhantomData,
        }
    }
}

/// Declares the dependencies of a function explicitly. The names are resolved
/// in order and passed as the function's arguments, so the list must have one
/// name per parameter.
///
/// This form should be preferred whenever the parameter names of the function
/// differ from the names of the services it needs. When they match, the
/// [`injectable!`](crate::injectable) macro can derive the list instead.
///
/// ```
/// use module_injector::{bootstrap, inject, Module, Svc};
///
/// let module = Module::new("app");
/// module.constant("a", 2i32);
/// module.constant("b", 3i32);
/// module.factory("sum", inject(["a", "b"], |x: Svc<i32>, y: Svc<i32>| *x + *y));
///
/// let app = bootstrap(&module).unwrap().into_injector();
/// assert_eq!(5, *app.get::<Svc<i32>>("sum").unwrap());
/// ```
pub fn inject<F, D, N>(names: N, func: F) -> Injectable<F, D>
where
    F: InjectFn<D>,
    N: IntoIterator,
    N::Item: Into<String>,
{
    Injectable {
        names: names.into_iter().map(Into::into).collect(),
        func,
        marker: PhantomData,
    }
}

/// Creates an [`Injectable`] from a closure, using the names of its
/// parameters as the names of its dependencies. Each parameter must have a
/// type annotation.
///
/// ```
/// use module_injector::{bootstrap, injectable, Module, Svc};
///
/// let module = Module::new("app");
/// module.constant("abc", 123i32);
/// module.factory("doubled", injectable!(|abc: Svc<i32>| *abc * 2));
///
/// let app = bootstrap(&module).unwrap().into_injector();
/// assert_eq!(246, *app.get::<Svc<i32>>("doubled").unwrap());
/// ```
#[macro_export]
macro_rules! injectable {
    (move || $body:expr) => {
        $crate::inject(::std::iter::empty::<&'static str>(), move || $body)
    };
    (|| $body:expr) => {
        $crate::inject(::std::iter::empty::<&'static str>(), || $body)
    };
    (move |$($arg:ident : $ty:ty),+ $(,)?| $body:expr) => {
        $crate::inject([$(stringify!($arg)),+], move |$($arg: $ty),+| $body)
    };
    (|$($arg:ident : $ty:ty),+ $(,)?| $body:expr) => {
        $crate::inject([$(stringify!($arg)),+], |$($arg: $ty),+| $body)
    };
}
