//! Shared fixtures for pipeline tests: scratch git projects and a resolver
//! answering from a table instead of running `go list`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;
use vendo_lib::imports::{BuildResolver, ImportError, ImportSet};
use vendo_lib::manifest::{Manifest, ManifestEntry};
use vendo_lib::platform::Platform;

pub struct Project {
  pub temp: TempDir,
}

impl Project {
  pub fn new() -> Self {
    let project = Self {
      temp: TempDir::new().unwrap(),
    };
    project.git(&["init", "-q"]);
    project.git(&["config", "user.name", "vendo-test"]);
    project.git(&["config", "user.email", "vendo-test@example.com"]);
    project.git(&["config", "commit.gpgsign", "false"]);
    project
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  pub fn write(&self, relative: &str, content: &str) {
    let path = self.temp.path().join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
  }

  pub fn read(&self, relative: &str) -> String {
    std::fs::read_to_string(self.temp.path().join(relative)).unwrap()
  }

  pub fn write_manifest(&self, manifest: &Manifest) {
    manifest.save(&self.temp.path().join("vendor.json")).unwrap();
  }

  pub fn git(&self, args: &[&str]) -> String {
    let output = Command::new("git")
      .args(args)
      .current_dir(self.temp.path())
      .env("GIT_CONFIG_NOSYSTEM", "1")
      .output()
      .unwrap();
    assert!(
      output.status.success(),
      "git {:?} failed: {}",
      args,
      String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
  }

  pub fn commit_all(&self, message: &str) {
    self.git(&["add", "-A"]);
    self.git(&["commit", "-q", "-m", message]);
  }
}

pub fn entry(canonical: &str, root: &str) -> ManifestEntry {
  ManifestEntry {
    canonical: canonical.to_string(),
    local: canonical.to_string(),
    revision: "0000000000000000000000000000000000000000".to_string(),
    revision_time: "2015-07-10T12:34:56Z".to_string(),
    comment: String::new(),
    repository_root: root.to_string(),
  }
}

pub fn manifest(entries: Vec<ManifestEntry>) -> Manifest {
  let mut m = Manifest::new();
  m.packages = entries;
  m.platforms = vec![Platform::new("linux", "amd64")];
  m
}

/// Resolver answering from fixed dependency edges.
#[derive(Default)]
pub struct TableResolver {
  pub project: String,
  pub edges: BTreeMap<String, Vec<String>>,
  pub standard: BTreeSet<String>,
}

impl TableResolver {
  pub fn new(project: &str) -> Self {
    Self {
      project: project.to_string(),
      ..Default::default()
    }
  }

  pub fn edge(mut self, from: &str, to: &[&str]) -> Self {
    self
      .edges
      .insert(from.to_string(), to.iter().map(|s| s.to_string()).collect());
    self
  }

  pub fn standard(mut self, ids: &[&str]) -> Self {
    self.standard.extend(ids.iter().map(|s| s.to_string()));
    self
  }
}

impl BuildResolver for TableResolver {
  fn project_import_path(&self, _dir: &Path) -> Result<String, ImportError> {
    Ok(self.project.clone())
  }

  fn transitive_deps(
    &self,
    seeds: &ImportSet,
    _platform: &Platform,
    _search_path: &Path,
  ) -> Result<ImportSet, ImportError> {
    let mut found = ImportSet::new();
    let mut stack: Vec<String> = seeds.iter().map(str::to_string).collect();
    while let Some(id) = stack.pop() {
      for dep in self.edges.get(&id).into_iter().flatten() {
        if found.insert(dep.clone()) {
          stack.push(dep.clone());
        }
      }
    }
    Ok(found)
  }

  fn standard(&self, ids: &ImportSet, _search_path: &Path) -> Result<ImportSet, ImportError> {
    Ok(ids.iter().filter(|id| self.standard.contains(*id)).collect())
  }

  fn unresolved(&self, _ids: &ImportSet, _search_path: &Path) -> Result<ImportSet, ImportError> {
    Ok(ImportSet::new())
  }
}
