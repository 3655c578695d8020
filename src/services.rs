mod factory;
mod func;
mod providers;
mod registration;
mod service;
mod value;

pub use factory::*;
pub use func::*;
pub use providers::*;
pub use registration::*;
pub use service::*;
pub use value::*;
