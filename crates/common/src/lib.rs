//! Ambient helpers shared by the storage crates and binaries.

pub mod env;
pub mod utils;
