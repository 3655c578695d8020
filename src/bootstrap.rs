use crate::{
    Completion, EventBus, InjectResult, Injector, Locals, Module, Registration,
};
use futures_util::{
    future::{try_join_all, TryJoinAll},
    FutureExt,
};
use std::{
    collections::HashSet,
    future::Future,
    ops::Deref,
    pin::Pin,
    task::{Context, Poll},
};
use tracing::debug;

/// Composes a module with everything it requires into an application.
///
/// Bootstrapping happens in two phases:
///
/// 1. **Config.** The registrations of every module are collected, with
///    later registrations under a name replacing earlier ones. Each module's
///    config callbacks are then invoked in order, required modules first.
///    They can inject `$provide`, constants and provider objects.
/// 2. **Run.** The final providers are moved into a new run-phase
///    [`Injector`] and each module's run callbacks are invoked in the same
///    order.
///
/// Any error raised until the run callbacks have been invoked is returned
/// directly. The returned [`Bootstrap`] dereferences to the application
/// injector, and can be awaited to wait for the futures of asynchronous run
/// callbacks.
///
/// ```
/// use module_injector::{bootstrap, inject, Module, Svc};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let module = Module::new("app");
/// module.constant("runs", AtomicUsize::new(0));
/// module.run(inject(["runs"], |runs: Svc<AtomicUsize>| {
///     runs.fetch_add(1, Ordering::SeqCst);
/// }));
///
/// let app = bootstrap(&module).unwrap();
/// let runs: Svc<AtomicUsize> = app.get("runs").unwrap();
/// assert_eq!(1, runs.load(Ordering::SeqCst));
/// ```
pub fn bootstrap(root: &Module) -> InjectResult<Bootstrap> {
    let modules = root.flatten();
    debug!(
        root = %root.name(),
        modules = modules.len(),
        "bootstrapping application"
    );

    let events = EventBus::default();
    let config = Injector::config(events.clone());

    for (name, registration) in winning_registrations(&modules) {
        config.register(&name, registration)?;
    }

    for module in &modules {
        debug!(module = %module.name(), "configuring module");
        for callback in module.config_fns() {
            config.invoke_dyn(callback.as_ref(), &Locals::new())?;
        }
    }

    let app = Injector::run(config.seal(), events);

    let mut pending = Vec::new();
    for module in &modules {
        debug!(module = %module.name(), "running module");
        for callback in module.run_fns() {
            if let Some(completion) = app.invoke_dyn(callback.as_ref(), &Locals::new())? {
                pending.push(completion);
            }
        }
    }

    debug!(pending = pending.len(), "application started");
    Ok(Bootstrap {
        app,
        pending: Box::pin(try_join_all(pending)),
    })
}

/// The last registration of each name across all modules, constants first.
/// The rest keep the relative order of their winning registrations.
fn winning_registrations(modules: &[Module]) -> Vec<(String, Registration)> {
    let all: Vec<_> = modules
        .iter()
        .flat_map(Module::registrations)
        .collect();

    let mut seen = HashSet::new();
    let mut winners: Vec<_> = all
        .into_iter()
        .rev()
        .filter(|(name, _)| seen.insert(name.clone()))
        .collect();
    winners.reverse();

    let (mut ordered, rest): (Vec<_>, Vec<_>) = winners
        .into_iter()
        .partition(|(_, registration)| registration.is_constant());
    ordered.extend(rest);
    ordered
}

/// A bootstrapped application.
///
/// This dereferences to the application's [`Injector`]. As a future, it
/// resolves once the futures returned by asynchronous run callbacks have
/// completed, either to the injector or to the first error any of them
/// failed with. Awaiting it is only needed when modules use
/// [`Module::run_async()`].
///
/// ```
/// use futures::executor::block_on;
/// use module_injector::{bootstrap, InjectError, Module};
///
/// let module = Module::new("app");
/// module.run_async(|| async { Err::<(), _>(InjectError::activation("not ready")) });
///
/// let error = block_on(bootstrap(&module).unwrap()).unwrap_err();
/// assert_eq!("not ready", error.to_string());
/// ```
#[must_use = "asynchronous run callbacks are only awaited through this handle"]
pub struct Bootstrap {
    app: Injector,
    pending: Pin<Box<TryJoinAll<Completion>>>,
}

impl Bootstrap {
    /// The application injector.
    #[must_use]
    pub fn injector(&self) -> &Injector {
        &self.app
    }

    /// Takes the application injector without waiting for asynchronous run
    /// callbacks.
    #[must_use]
    pub fn into_injector(self) -> Injector {
        self.app
    }
}

impl Future for Bootstrap {
    type Output = InjectResult<Injector>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        this.pending
            .poll_unpin(cx)
            .map_ok(|_| this.app.clone())
    }
}

impl Deref for Bootstrap {
    type Target = Injector;

    fn deref(&self) -> &Self::Target {
        &self.app
    }
}

impl std::fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrap")
            .field("app", &self.app)
            .finish_non_exhaustive()
    }
}
