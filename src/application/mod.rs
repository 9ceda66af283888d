//! Application layer: the handler registries and the broker that polls them.
//!
//! `Broker` is the entry point. It snapshots the registry for the request's
//! kind, polls each handler in turn, reduces their opinions with the tallies
//! in `aggregate`, and emits exactly one verdict per request.

pub mod aggregate;
pub mod broker;
pub mod registry;
