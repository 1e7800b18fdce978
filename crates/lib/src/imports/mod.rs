//! Transitive import closure of the project.
//!
//! The closure starts from the import paths found in the project's own Go
//! sources, grows by asking the build resolver for the dependencies of that
//! seed on every target platform, and finally drops whatever the resolver
//! classifies as standard library. Each step takes an [`ImportSet`] by value
//! and hands back a new one.

mod resolver;
pub mod scan;

pub use resolver::{BuildResolver, GoListResolver};
pub use scan::{ImportSyntaxError, parse_imports, scan_imports};

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::platform::Platform;
use crate::process::CommandError;
use crate::util::path::has_path_prefix;

#[derive(Debug, Error)]
pub enum ImportError {
  #[error("no target platforms declared; add \"platforms\" to the manifest (e.g. [\"linux_amd64\"])")]
  NoPlatforms,

  #[error("failed to walk project sources: {0}")]
  Walk(#[from] walkdir::Error),

  #[error("failed to read {}: {source}", .path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error(transparent)]
  Resolver(#[from] CommandError),
}

/// Ordered set of import paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSet(BTreeSet<String>);

impl ImportSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, id: impl Into<String>) -> bool {
    self.0.insert(id.into())
  }

  pub fn contains(&self, id: &str) -> bool {
    self.0.contains(id)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.0.iter().map(String::as_str)
  }

  pub fn into_sorted_vec(self) -> Vec<String> {
    self.0.into_iter().collect()
  }

  #[must_use]
  pub fn union(mut self, other: ImportSet) -> Self {
    self.0.extend(other.0);
    self
  }

  #[must_use]
  pub fn difference(mut self, other: &ImportSet) -> Self {
    self.0.retain(|id| !other.contains(id));
    self
  }

  /// Drops `prefix` itself and everything below it.
  #[must_use]
  pub fn without_prefix(mut self, prefix: &str) -> Self {
    self.0.retain(|id| !has_path_prefix(id, prefix));
    self
  }
}

impl<S: Into<String>> FromIterator<S> for ImportSet {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    Self(iter.into_iter().map(Into::into).collect())
  }
}

impl IntoIterator for ImportSet {
  type Item = String;
  type IntoIter = std::collections::btree_set::IntoIter<String>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.into_iter()
  }
}

/// Unions `seed` with its transitive dependencies on every platform. Every
/// platform is queried with the original seed only.
pub fn dependency_closure(
  seed: ImportSet,
  platforms: &[Platform],
  resolver: &dyn BuildResolver,
  search_path: &Path,
) -> Result<ImportSet, ImportError> {
  if platforms.is_empty() {
    return Err(ImportError::NoPlatforms);
  }
  let mut closure = seed.clone();
  for platform in platforms {
    let deps = resolver.transitive_deps(&seed, platform, search_path)?;
    debug!(%platform, count = deps.len(), "resolved dependencies");
    closure = closure.union(deps);
  }
  Ok(closure)
}

pub fn remove_standard(
  ids: ImportSet,
  resolver: &dyn BuildResolver,
  search_path: &Path,
) -> Result<ImportSet, ImportError> {
  let standard = resolver.standard(&ids, search_path)?;
  Ok(ids.difference(&standard))
}

/// Computes the non-standard dependencies of the project at `root`,
/// excluding the project's own packages.
pub fn project_dependencies(
  root: &Path,
  platforms: &[Platform],
  resolver: &dyn BuildResolver,
  search_path: &Path,
) -> Result<ImportSet, ImportError> {
  if platforms.is_empty() {
    return Err(ImportError::NoPlatforms);
  }
  let project = resolver.project_import_path(root)?;
  let seed = scan_imports(root, &project)?;
  info!(project = %project, direct = seed.len(), "scanned project imports");
  let closure = dependency_closure(seed, platforms, resolver, search_path)?;
  let closure = remove_standard(closure, resolver, search_path)?;
  Ok(closure.without_prefix(&project))
}
