//! Shared wire types for the relay.

mod ws;

pub use ws::*;
