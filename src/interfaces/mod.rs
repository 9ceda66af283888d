//! Wire formats used to talk to the backend over a byte stream.

pub mod jsonl;
