//! Shared test helpers for CLI integration tests.

use std::path::Path;
use std::process::Command as StdCommand;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Manifest declaring a single vendored repository at `_vendor/src/h/x`.
pub const ONE_ROOT_MANIFEST: &str = r#"{
  "tool": "github.com/zpas-lab/vendo",
  "package": [
    {
      "canonical": "h/x",
      "local": "h/x",
      "revision": "0000000000000000000000000000000000000000",
      "revisionTime": "2015-07-10T12:34:56Z",
      "repositoryRoot": "_vendor/src/h/x"
    }
  ]
}
"#;

/// A git checkout of a project with a vendor tree, committed once.
pub struct TestRepo {
  pub temp: TempDir,
}

impl TestRepo {
  pub fn new() -> Self {
    let repo = Self {
      temp: TempDir::new().unwrap(),
    };
    repo.git(&["init", "-q"]);
    repo.git(&["config", "user.name", "vendo-test"]);
    repo.git(&["config", "user.email", "vendo-test@example.com"]);
    repo.git(&["config", "commit.gpgsign", "false"]);
    repo
  }

  /// Project with one vendored root, everything committed.
  pub fn vendored() -> Self {
    let repo = Self::new();
    repo.write_file("main.go", "package main\n\nimport \"h/x\"\n");
    repo.write_file("vendor.json", ONE_ROOT_MANIFEST);
    repo.write_file("_vendor/.gitignore", ".git\n.hg\n.bzr\n");
    repo.write_file("_vendor/src/h/x/x.go", "package x\n");
    repo.git(&["add", "-A"]);
    repo.git(&["commit", "-q", "-m", "vendor h/x"]);
    repo
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn read_file(&self, relative_path: &str) -> String {
    std::fs::read_to_string(self.temp.path().join(relative_path)).unwrap()
  }

  pub fn git(&self, args: &[&str]) -> String {
    let output = StdCommand::new("git")
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

  /// `vendo -C <repo>` with the layout overrides cleared.
  pub fn vendo(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("vendo");
    cmd
      .arg("-C")
      .arg(self.temp.path())
      .env_remove("VENDO_MANIFEST")
      .env_remove("VENDO_VENDOR_DIR")
      .env_remove("RUST_LOG");
    cmd
  }
}
