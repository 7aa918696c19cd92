// Thin re-export module: implementation lives in `blockchain/core.rs`, split into
// block construction, chain storage and chain validation.

pub mod core;
pub use core::*;
