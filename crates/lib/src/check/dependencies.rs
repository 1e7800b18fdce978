use tracing::info;

use super::{CheckError, Checker};
use crate::imports::project_dependencies;

impl Checker<'_> {
  /// Verifies that the manifest lists exactly the packages the project
  /// transitively imports, standard library excluded.
  pub fn check_dependencies(&self) -> Result<(), CheckError> {
    self.with_staged_tree("vendo check-dependencies", || {
      let manifest = self.staged_manifest()?;
      let search_path = self.layout.abs(self.layout.vendor_dir());
      let detected = project_dependencies(self.layout.root(), &manifest.platforms, self.resolver, &search_path)?;
      compare_dependencies(self.layout.manifest(), manifest.canonical_ids(), detected.into_sorted_vec())?;
      info!(count = manifest.packages.len(), "manifest matches project dependencies");
      Ok(())
    })
  }
}

/// Both lists must be sorted.
fn compare_dependencies(manifest: &str, declared: Vec<String>, detected: Vec<String>) -> Result<(), CheckError> {
  if declared == detected {
    return Ok(());
  }
  Err(CheckError::ManifestMismatch {
    manifest: manifest.to_string(),
    declared,
    detected,
  })
}

/// Spaces up to the first character where `a` and `b` differ, then `↑`.
pub fn mismatch_marker(a: &str, b: &str) -> String {
  let common = a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count();
  format!("{}↑", " ".repeat(common))
}

pub(super) fn mismatch_report(manifest: &str, declared: &[String], detected: &[String]) -> String {
  let declared = declared.join(" ");
  let detected = detected.join(" ");
  format!(
    "packages listed in {manifest} differ from the dependencies of the project:\n\
     {manifest}:\n\t{declared}\n\
     dependencies:\n\t{detected}\n\t{}",
    mismatch_marker(&declared, &detected)
  )
}
