//! vendo-lib: verification engine for vendored Go dependencies
//!
//! A project keeps copies of its third-party packages under `_vendor/` and
//! records them in `vendor.json`. Before each commit this crate checks that
//! three views of the dependency set agree:
//! - the paths staged in git (`staged`)
//! - the manifest (`manifest`)
//! - what the project actually imports (`imports`)
//!
//! and that local modifications of vendored repositories are acknowledged
//! (`check`, `vcs`).

pub mod check;
pub mod config;
pub mod consts;
pub mod imports;
pub mod manifest;
pub mod platform;
pub mod process;
pub mod roots;
pub mod staged;
pub mod util;
pub mod vcs;
