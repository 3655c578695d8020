use crate::{DynSvc, Service, Shared, SharedEx, Svc};
use std::collections::HashMap;
use tracing::trace;

/// A callback subscribed to an event. This is implemented for every
/// function that accepts the event's data.
pub trait EventHandler: Service + Fn(&DynSvc) {}
impl<F: Service + Fn(&DynSvc)> EventHandler for F {}

/// Named events and the handlers subscribed to them. One bus is shared by the
/// injectors of a single application.
#[derive(Clone, Default)]
pub(crate) struct EventBus {
    handlers: Shared<HashMap<String, Vec<Svc<dyn EventHandler>>>>,
}

impl EventBus {
    pub fn on<H: EventHandler>(&self, name: &str, handler: H) {
        let handler: Svc<dyn EventHandler> = Svc::new(handler);
        self.handlers.with_inner_mut(|handlers| {
            handlers.entry(name.to_owned()).or_default().push(handler);
        });
    }

    /// Calls every handler of an event with its data and returns how many
    /// were called. Handlers may subscribe or emit while being called.
    pub fn emit_dyn(&self, name: &str, data: &DynSvc) -> usize {
        let handlers = self
            .handlers
            .with_inner(|handlers| handlers.get(name).cloned().unwrap_or_default());

        trace!(event = name, handlers = handlers.len(), "emitting event");
        for handler in &handlers {
            (handler.as_ref())(data);
        }
        handlers.len()
    }
}

/// Emits named events to the handlers registered through
/// [`Injector::on()`](crate::Injector::on). This is injectable as `$emit`
/// during the run phase.
///
/// ```
/// use module_injector::{bootstrap, inject, Emitter, Module, Svc};
///
/// let module = Module::new("app");
/// module.run(inject(["$emit"], |emit: Svc<Emitter>| {
///     // Nobody is listening yet.
///     assert_eq!(0, emit.emit("started", ()));
/// }));
///
/// bootstrap(&module).unwrap();
/// ```
pub struct Emitter {
    bus: EventBus,
}

impl Emitter {
    pub(crate) fn new(bus: EventBus) -> Self {
        Emitter { bus }
    }

    /// Emits an event, passing `data` to each handler. Returns the number of
    /// handlers that were called.
    pub fn emit<T: Service>(&self, name: &str, data: T) -> usize {
        self.emit_dyn(name, &(Svc::new(data) as DynSvc))
    }

    /// Emits an event with already shared data.
    pub fn emit_dyn(&self, name: &str, data: &DynSvc) -> usize {
        self.bus.emit_dyn(name, data)
    }
}

/// Subscribes handlers to named events. This is injectable as `$on` during
/// the run phase, and is what [`Injector::on()`](crate::Injector::on) uses.
pub struct Subscriber {
    bus: EventBus,
}

impl Subscriber {
    pub(crate) fn new(bus: EventBus) -> Self {
        Subscriber { bus }
    }

    /// Appends a handler to an event's handlers.
    pub fn on<H: EventHandler>(&self, name: &str, handler: H) {
        self.bus.on(name, handler);
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber").finish_non_exhaustive()
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter").finish_non_exhaustive()
    }
}
