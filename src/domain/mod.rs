//! Request, verdict and port definitions shared by every layer.

pub mod ports;
pub mod request;
pub mod verdict;
