use std::collections::BTreeSet;

use tracing::{debug, info};

use super::{CheckError, Checker, StrayKind};
use crate::roots::RepoRootTree;
use crate::staged::{WalkControl, walk_tree};

impl Checker<'_> {
  /// Verifies that the staged vendor tree and the manifest's repository
  /// roots describe the same set of directories.
  pub fn check_consistency(&self) -> Result<(), CheckError> {
    self.layout.verify_structure()?;
    let manifest = self.staged_manifest()?;
    let manifest_path = self.layout.manifest();

    let tree = RepoRootTree::from_roots(manifest.packages.iter().map(|p| p.repository_root.as_str()))?;
    let mut unvisited: BTreeSet<&str> = manifest.repository_roots();

    let files = self.index.list_staged()?;
    let ignore = self.layout.ignore_file();
    let stray = |path: &str, kind| CheckError::StrayPath {
      path: path.to_string(),
      manifest: manifest_path.to_string(),
      kind,
    };

    walk_tree(&files, self.layout.vendor_dir(), |path, is_dir| {
      if path == ignore {
        return Ok(WalkControl::Continue);
      }
      let node = tree.get(path).ok_or_else(|| stray(path, StrayKind::Undeclared))?;
      if !is_dir {
        return Err(stray(path, StrayKind::OutsideRoot));
      }
      if node.is_leaf() {
        debug!(root = path, "found repository root");
        unvisited.remove(path);
        return Ok(WalkControl::SkipDir);
      }
      Ok(WalkControl::Continue)
    })?;

    if !unvisited.is_empty() {
      return Err(CheckError::MissingRoots {
        manifest: manifest_path.to_string(),
        roots: unvisited.into_iter().map(str::to_string).collect(),
      });
    }
    info!(roots = manifest.repository_roots().len(), "vendor tree matches manifest");
    Ok(())
  }
}
