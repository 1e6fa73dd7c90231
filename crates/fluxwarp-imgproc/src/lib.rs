#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// module containing parallization utilities.
pub mod parallel;

/// flux-conserving geometric transformations module.
pub mod warp;
