mod check;
mod deps;

pub use check::{CheckPhase, cmd_check};
pub use deps::cmd_deps;
