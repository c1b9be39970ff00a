//! Application services and the ports they depend on.

pub mod error;
pub mod events;
pub mod greetings;
pub mod ports;
pub mod repos;
