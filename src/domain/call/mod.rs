//! Call bounded context - manages the lifecycle of calls

pub mod aggregate;
pub mod event;
pub mod observer;
pub mod value_object;

pub use aggregate::Call;
pub use event::CallEvent;
pub use observer::CallObserver;
pub use value_object::{CallDirection, CallState, EndReason};
