use std::collections::BTreeSet;

use tracing::{debug, info};

use super::{CheckError, Checker};
use crate::manifest::{Manifest, ManifestEntry};
use crate::roots::RepoRootTree;

impl Checker<'_> {
  /// Verifies every staged change inside a vendored repository.
  ///
  /// A repository whose metadata directory is present must be checked out
  /// at the recorded revision. Beyond that, changes are accepted when the
  /// copy is pristine, or when the repository was already vendored and the
  /// manifest comment for it was edited.
  pub fn check_patched(&self) -> Result<(), CheckError> {
    self.with_staged_tree("vendo check-patched", || {
      let changes = self.index.staged_changes(self.layout.vendor_dir())?;
      if changes.is_empty() {
        debug!("no staged changes in vendor tree");
        return Ok(());
      }
      let manifest = self.staged_manifest()?;
      let previous = self.head_manifest()?;
      self.verify_changes(&changes, &manifest, &previous)
    })
  }

  fn verify_changes(&self, changes: &[Vec<u8>], manifest: &Manifest, previous: &Manifest) -> Result<(), CheckError> {
    let manifest_path = self.layout.manifest();
    let tree = RepoRootTree::from_roots(manifest.packages.iter().map(|p| p.repository_root.as_str()))?;
    let ignore = self.layout.ignore_file();

    let mut dirty_roots = BTreeSet::new();
    let mut unmatched = Vec::new();
    for file in changes {
      match tree.enclosing_root(file) {
        Some(root) => {
          dirty_roots.insert(root);
        }
        None if file.as_slice() == ignore.as_bytes() => {}
        None => unmatched.push(String::from_utf8_lossy(file).into_owned()),
      }
    }
    if !unmatched.is_empty() {
      return Err(CheckError::UnmatchedFiles {
        manifest: manifest_path.to_string(),
        files: unmatched,
      });
    }

    let current = manifest.by_repository_root();
    let before = previous.by_repository_root();
    for root in &dirty_roots {
      let entries = current.get(root.as_str()).map(Vec::as_slice).unwrap_or_default();
      let vcs = self.registry.detect(&self.layout.abs(root))?;

      if let Some(vcs) = &vcs {
        let actual = vcs.revision()?;
        if let Some(stale) = entries.iter().find(|e| e.revision != actual) {
          return Err(CheckError::RevisionMismatch {
            root: root.clone(),
            canonical: stale.canonical.clone(),
            manifest: manifest_path.to_string(),
            recorded: stale.revision.clone(),
            recorded_time: stale.revision_time.clone(),
            actual,
            metadata_dir: format!("{root}/{}", vcs.backend().marker()),
          });
        }
        if vcs.is_clean()? {
          debug!(root = %root, backend = %vcs.backend(), "pristine at recorded revision");
          continue;
        }
      }

      match before.get(root.as_str()) {
        None if vcs.is_none() => return Err(CheckError::UnsupportedVcs { root: root.clone() }),
        None => return Err(CheckError::NewRootNotPristine { root: root.clone() }),
        Some(old) if comments(old) == comments(entries) => {
          return Err(CheckError::UncommentedPatch {
            root: root.clone(),
            manifest: manifest_path.to_string(),
          });
        }
        Some(_) => info!(root = %root, "patched with updated comment"),
      }
    }
    Ok(())
  }
}

fn comments<'m>(entries: &[&'m ManifestEntry]) -> BTreeSet<&'m str> {
  entries.iter().map(|e| e.comment.as_str()).collect()
}

pub(super) fn revision_report(
  root: &str,
  canonical: &str,
  manifest: &str,
  recorded: &str,
  recorded_time: &str,
  actual: &str,
  metadata_dir: &str,
) -> String {
  format!(
    "{root} is checked out at revision {actual}, but {manifest} records {recorded} ({recorded_time}) for {canonical}.\n\
     Fix it with one of:\n\
     \x20 - check out the recorded revision {recorded} in {root};\n\
     \x20 - set \"revision\" of {canonical} in {manifest} to {actual};\n\
     \x20 - delete {metadata_dir} if {root} should no longer track its upstream repository."
  )
}
