//! Interface layer - console front end and logging observer

pub mod console;
pub mod logging_observer;

pub use console::{Console, ConsoleCommand, ConsoleError};
pub use logging_observer::TracingObserver;
