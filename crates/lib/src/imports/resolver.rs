use std::path::Path;

use super::{ImportError, ImportSet};
use crate::platform::Platform;
use crate::process::Cmd;

/// Answers questions about Go import paths.
///
/// `search_path` is the GOPATH the answers are computed against, normally
/// the project's vendor directory.
pub trait BuildResolver {
  /// Import path of the package in `dir`.
  fn project_import_path(&self, dir: &Path) -> Result<String, ImportError>;

  /// Every package `seeds` depend on, directly or not, when building for
  /// `platform`. The seeds themselves are not included.
  fn transitive_deps(&self, seeds: &ImportSet, platform: &Platform, search_path: &Path)
  -> Result<ImportSet, ImportError>;

  /// The members of `ids` that belong to the standard library.
  fn standard(&self, ids: &ImportSet, search_path: &Path) -> Result<ImportSet, ImportError>;

  /// The members of `ids` that cannot be found at all.
  fn unresolved(&self, ids: &ImportSet, search_path: &Path) -> Result<ImportSet, ImportError>;
}

const DEPS_TEMPLATE: &str = "{{range .Deps}}{{. | println}}{{end}}";
const STANDARD_TEMPLATE: &str = "{{if .Standard}}{{.ImportPath}}{{end}}";
const UNRESOLVED_TEMPLATE: &str = "{{if not .Root}}{{.ImportPath}}{{end}}";

/// [`BuildResolver`] implemented with `go list` in GOPATH mode.
#[derive(Debug, Clone)]
pub struct GoListResolver {
  program: String,
}

impl Default for GoListResolver {
  fn default() -> Self {
    Self::new("go")
  }
}

impl GoListResolver {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
    }
  }

  fn list(&self, template: &str) -> Cmd {
    Cmd::new(&self.program)
      .env("GO111MODULE", "off")
      .args(["list", "-e", "-f", template])
  }

  fn query(&self, cmd: Cmd, ids: &ImportSet) -> Result<ImportSet, ImportError> {
    // `go list` with no arguments would describe the current directory.
    if ids.is_empty() {
      return Ok(ImportSet::new());
    }
    let lines = cmd.arg("--").args(ids.iter()).output_lines()?;
    Ok(lines.into_iter().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect())
  }
}

impl BuildResolver for GoListResolver {
  fn project_import_path(&self, dir: &Path) -> Result<String, ImportError> {
    Ok(self.list("{{.ImportPath}}").arg(".").current_dir(dir).output_one_line()?)
  }

  fn transitive_deps(
    &self,
    seeds: &ImportSet,
    platform: &Platform,
    search_path: &Path,
  ) -> Result<ImportSet, ImportError> {
    let cmd = self
      .list(DEPS_TEMPLATE)
      .env("GOPATH", search_path)
      .env("GOOS", platform.os.as_str())
      .env("GOARCH", platform.arch.as_str());
    self.query(cmd, seeds)
  }

  fn standard(&self, ids: &ImportSet, search_path: &Path) -> Result<ImportSet, ImportError> {
    self.query(self.list(STANDARD_TEMPLATE).env("GOPATH", search_path), ids)
  }

  fn unresolved(&self, ids: &ImportSet, search_path: &Path) -> Result<ImportSet, ImportError> {
    self.query(self.list(UNRESOLVED_TEMPLATE).env("GOPATH", search_path), ids)
  }
}
