//! Test utilities for vendo-lib.
//!
//! Helpers for running shell snippets and for building throwaway git
//! repositories with a deterministic identity.

use std::path::Path;
use std::process::Command;

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// Runs git in `dir`, panicking with its output on failure. Returns stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
  let output = Command::new("git")
    .args(["-c", "commit.gpgsign=false", "-c", "core.autocrlf=false"])
    .args(args)
    .current_dir(dir)
    .env("GIT_AUTHOR_NAME", "vendo-test")
    .env("GIT_AUTHOR_EMAIL", "vendo-test@example.com")
    .env("GIT_COMMITTER_NAME", "vendo-test")
    .env("GIT_COMMITTER_EMAIL", "vendo-test@example.com")
    .env("GIT_CONFIG_NOSYSTEM", "1")
    .output()
    .expect("failed to spawn git");
  assert!(
    output.status.success(),
    "git {:?} failed:\n{}{}",
    args,
    String::from_utf8_lossy(&output.stderr),
    String::from_utf8_lossy(&output.stdout)
  );
  String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Initializes an empty repository in `dir`.
pub fn init_repo(dir: &Path) {
  std::fs::create_dir_all(dir).unwrap();
  git(dir, &["init", "-q"]);
  // Code under test runs plain `git`, so the identity must live in the repo.
  git(dir, &["config", "user.name", "vendo-test"]);
  git(dir, &["config", "user.email", "vendo-test@example.com"]);
  git(dir, &["config", "commit.gpgsign", "false"]);
}

/// Writes `content` to `relative` below `dir`, creating parent directories.
pub fn write_file(dir: &Path, relative: &str, content: &str) {
  let path = dir.join(relative);
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(path, content).unwrap();
}

/// Stages everything and commits it.
pub fn commit_all(dir: &Path, message: &str) {
  git(dir, &["add", "-A"]);
  git(dir, &["commit", "-q", "--allow-empty", "-m", message]);
}

/// Returns the full hash of HEAD.
pub fn head(dir: &Path) -> String {
  git(dir, &["rev-parse", "HEAD"]).trim().to_string()
}
