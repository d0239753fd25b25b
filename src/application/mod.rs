//! Application layer: ports and the services built on them.

pub mod ports;
pub mod services;
pub mod timeout;

pub use timeout::UntilTimeout;
