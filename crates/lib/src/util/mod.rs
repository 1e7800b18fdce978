//! Shared utilities.
//!
//! Slash-path helpers used by the manifest, the root tree and the staged view,
//! plus test helpers for building scratch repositories.

pub mod path;

#[cfg(test)]
pub mod testutil;
