//! Pre-commit verification of the vendor tree.
//!
//! Three phases run in order and the first failure aborts:
//!
//! 1. **consistency**: every staged path under the vendor directory lies in
//!    a repository root declared in the manifest, and every declared root is
//!    staged.
//! 2. **dependencies**: the manifest lists exactly the non-standard packages
//!    the project transitively imports on its target platforms.
//! 3. **patched**: staged modifications inside a vendored repository are
//!    either a move to the revision the manifest records, or acknowledged by
//!    a changed comment.
//!
//! Consistency reads only the index. The other two phases look at files on
//! disk and therefore run with unstaged changes stashed away.

mod consistency;
mod dependencies;
mod patched;

pub use dependencies::mismatch_marker;

use std::fmt;

use thiserror::Error;
use tracing::info;

use crate::config::{Layout, LayoutError};
use crate::imports::{BuildResolver, ImportError};
use crate::manifest::{Manifest, ManifestError};
use crate::roots::RootPathError;
use crate::staged::{StagedError, StagedIndex};
use crate::vcs::{VcsError, VcsRegistry};

/// Why a staged path is not accounted for by the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrayKind {
  /// Neither a declared root nor a directory leading to one.
  Undeclared,
  /// A file sitting outside every declared root.
  OutsideRoot,
}

#[derive(Debug, Error)]
pub enum CheckError {
  #[error(transparent)]
  Structural(#[from] LayoutError),

  #[error("{path} is not staged in git")]
  ManifestNotStaged { path: String },

  #[error("{}: {path}", stray_message(.kind, .manifest))]
  StrayPath {
    path: String,
    manifest: String,
    kind: StrayKind,
  },

  #[error("repositoryRoots from {manifest} not found in git: {}", .roots.join(" "))]
  MissingRoots { manifest: String, roots: Vec<String> },

  #[error("{}", dependencies::mismatch_report(.manifest, .declared, .detected))]
  ManifestMismatch {
    manifest: String,
    declared: Vec<String>,
    detected: Vec<String>,
  },

  #[error(
    "staged changes outside any repositoryRoot from {manifest}:\n\t{}",
    .files.join("\n\t")
  )]
  UnmatchedFiles { manifest: String, files: Vec<String> },

  #[error(
    "{}",
    patched::revision_report(.root, .canonical, .manifest, .recorded, .recorded_time, .actual, .metadata_dir)
  )]
  RevisionMismatch {
    root: String,
    canonical: String,
    manifest: String,
    recorded: String,
    recorded_time: String,
    actual: String,
    metadata_dir: String,
  },

  #[error(
    "{root} contains local patches; describe them by editing the \"comment\" of its entry in {manifest}"
  )]
  UncommentedPatch { root: String, manifest: String },

  #[error("new repository {root} must be added as a pristine copy of its checked-out revision")]
  NewRootNotPristine { root: String },

  #[error(
    "new repository {root} has no recognized version control metadata; add it as a pristine clone carrying its .git, .hg or .bzr directory"
  )]
  UnsupportedVcs { root: String },

  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error(transparent)]
  RootPath(#[from] RootPathError),

  #[error(transparent)]
  Staged(#[from] StagedError),

  #[error(transparent)]
  Vcs(#[from] VcsError),

  #[error(transparent)]
  Imports(#[from] ImportError),
}

fn stray_message(kind: &StrayKind, manifest: &str) -> String {
  match kind {
    StrayKind::Undeclared => format!("unexpected file or directory in git, not declared in {manifest}"),
    StrayKind::OutsideRoot => format!("unexpected file in git, not inside any repositoryRoot from {manifest}"),
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Consistency,
  Dependencies,
  Patched,
}

impl Phase {
  pub const ALL: [Phase; 3] = [Phase::Consistency, Phase::Dependencies, Phase::Patched];

  pub fn name(self) -> &'static str {
    match self {
      Phase::Consistency => "consistency",
      Phase::Dependencies => "dependencies",
      Phase::Patched => "patched",
    }
  }
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Runs verification phases against one project.
pub struct Checker<'a> {
  layout: &'a Layout,
  index: &'a dyn StagedIndex,
  resolver: &'a dyn BuildResolver,
  registry: &'a VcsRegistry,
}

impl<'a> Checker<'a> {
  pub fn new(
    layout: &'a Layout,
    index: &'a dyn StagedIndex,
    resolver: &'a dyn BuildResolver,
    registry: &'a VcsRegistry,
  ) -> Self {
    Self {
      layout,
      index,
      resolver,
      registry,
    }
  }

  /// Runs `phases` in order, stopping at the first failure.
  pub fn run(&self, phases: &[Phase]) -> Result<(), CheckError> {
    for &phase in phases {
      info!(%phase, "checking");
      match phase {
        Phase::Consistency => self.check_consistency()?,
        Phase::Dependencies => self.check_dependencies()?,
        Phase::Patched => self.check_patched()?,
      }
    }
    Ok(())
  }

  pub fn run_all(&self) -> Result<(), CheckError> {
    self.run(&Phase::ALL)
  }

  /// The manifest as staged. A manifest missing from the index is an error.
  fn staged_manifest(&self) -> Result<Manifest, CheckError> {
    let path = self.layout.manifest();
    let bytes = self.index.read_staged(path)?.ok_or_else(|| CheckError::ManifestNotStaged {
      path: path.to_string(),
    })?;
    let manifest = Manifest::parse(&bytes)?;
    manifest.validate()?;
    Ok(manifest)
  }

  /// The manifest as of `HEAD`; empty before the first commit that adds it.
  fn head_manifest(&self) -> Result<Manifest, CheckError> {
    match self.index.read_head(self.layout.manifest())? {
      Some(bytes) => Ok(Manifest::parse(&bytes)?),
      None => Ok(Manifest::new()),
    }
  }

  /// Runs `phase` with the working tree reduced to the staged state.
  ///
  /// The layout is verified both before stashing and after, since stashing
  /// may remove files that were only present as unstaged changes.
  fn with_staged_tree<T>(&self, label: &str, phase: impl FnOnce() -> Result<T, CheckError>) -> Result<T, CheckError> {
    self.layout.verify_structure()?;
    let snapshot = self.index.stash_unstaged(label)?;
    self.layout.verify_structure()?;
    let outcome = phase();
    let released = snapshot.release();
    let value = outcome?;
    released?;
    Ok(value)
  }
}
