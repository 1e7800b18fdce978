//! Check command implementation.
//!
//! Runs the pre-commit verification phases against the staged index of the
//! project and reports each phase as it passes.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::ValueEnum;

use vendo_lib::check::{Checker, Phase};
use vendo_lib::config::Layout;
use vendo_lib::imports::GoListResolver;
use vendo_lib::staged::GitIndex;
use vendo_lib::vcs::VcsRegistry;

use crate::output::{format_duration, print_success};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CheckPhase {
  /// consistency, then dependencies, then patched
  #[default]
  All,
  /// Staged vendor paths match the manifest's repository roots
  Consistency,
  /// The manifest lists exactly the transitive dependencies
  Dependencies,
  /// Modified vendored repositories are at the recorded revision or commented
  Patched,
}

impl CheckPhase {
  fn phases(self) -> &'static [Phase] {
    match self {
      CheckPhase::All => &Phase::ALL,
      CheckPhase::Consistency => &[Phase::Consistency],
      CheckPhase::Dependencies => &[Phase::Dependencies],
      CheckPhase::Patched => &[Phase::Patched],
    }
  }
}

pub fn cmd_check(root: &Path, phase: CheckPhase) -> Result<()> {
  let layout = Layout::from_env(root)?;
  let index = GitIndex::new(root);
  let resolver = GoListResolver::default();
  let registry = VcsRegistry::default();
  let checker = Checker::new(&layout, &index, &resolver, &registry);

  for &phase in phase.phases() {
    let started = Instant::now();
    checker
      .run(&[phase])
      .with_context(|| format!("{phase} check failed"))?;
    print_success(&format!("{phase} ({})", format_duration(started.elapsed())));
  }
  Ok(())
}
