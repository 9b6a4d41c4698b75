//! Message types of the remote-write / remote-read wire contract.
//!
//! Field numbers are fixed by the protocol; see `crate::codec` for the encoding.
mod types;
mod unknown;

pub use types::*;
pub use unknown::*;
