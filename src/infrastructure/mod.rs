//! Concrete adapters for the domain ports: response emitters and the
//! decision handlers that ship with the broker.

pub mod channel;
pub mod policy;
pub mod prompt;
