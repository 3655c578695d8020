use crate::{DynSvc, InjectResult, Injector, Provider};

/// The provider object behind a `value` registration. It returns the
/// registered value as is. During the config phase it can be injected as
/// `<name>Provider` to inspect the value before it is used.
pub struct ValueProvider {
    value: DynSvc,
}

impl ValueProvider {
    /// Creates a new `ValueProvider` using a predetermined value.
    #[must_use]
    pub fn new(value: DynSvc) -> Self {
        ValueProvider { value }
    }

    /// The value this provider returns.
    #[must_use]
    pub fn value(&self) -> &DynSvc {
        &self.value
    }
}

impl Provider for ValueProvider {
    fn provide(&self, _injector: &Injector) -> InjectResult<DynSvc> {
        Ok(self.value.clone())
    }
}
