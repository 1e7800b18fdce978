//! `vendo check` against real git repositories.

use predicates::prelude::*;

use crate::common::TestRepo;

#[test]
fn consistency_passes_for_declared_root() {
  let repo = TestRepo::vendored();
  repo
    .vendo()
    .args(["check", "consistency"])
    .assert()
    .success()
    .stdout(predicate::str::contains("consistency"));
}

#[test]
fn consistency_rejects_staged_stray_directory() {
  let repo = TestRepo::vendored();
  repo.write_file("_vendor/src/h/y/y.go", "package y\n");
  repo.git(&["add", "_vendor/src/h/y/y.go"]);

  repo
    .vendo()
    .args(["check", "consistency"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("consistency check failed"))
    .stderr(predicate::str::contains("_vendor/src/h/y"));
}

#[test]
fn consistency_ignores_unstaged_files() {
  let repo = TestRepo::vendored();
  repo.write_file("_vendor/src/h/y/y.go", "package y\n");

  repo.vendo().args(["check", "consistency"]).assert().success();
}

#[test]
fn consistency_reports_missing_root() {
  let repo = TestRepo::vendored();
  repo.git(&["rm", "-q", "-r", "--cached", "_vendor/src/h/x"]);

  repo
    .vendo()
    .args(["check", "consistency"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("not found in git: _vendor/src/h/x"));
}

#[test]
fn patched_passes_without_staged_vendor_changes() {
  let repo = TestRepo::vendored();
  repo.write_file("main.go", "package main // unstaged edit\n");

  repo.vendo().args(["check", "patched"]).assert().success();
  assert_eq!(repo.read_file("main.go"), "package main // unstaged edit\n");
}

#[test]
fn patched_rejects_uncommented_patch() {
  let repo = TestRepo::vendored();
  repo.write_file("_vendor/src/h/x/x.go", "package x // patched\n");
  repo.git(&["add", "_vendor/src/h/x/x.go"]);
  repo.write_file("main.go", "package main // unstaged edit\n");

  repo
    .vendo()
    .args(["check", "patched"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("contains local patches"));
  assert_eq!(repo.read_file("main.go"), "package main // unstaged edit\n");
  assert_eq!(repo.git(&["stash", "list"]), "");
}

#[test]
fn dependencies_require_platforms() {
  let repo = TestRepo::vendored();

  repo
    .vendo()
    .args(["check", "dependencies"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("no target platforms"));
}

#[test]
fn vendor_dir_can_be_overridden() {
  let repo = TestRepo::vendored();

  repo
    .vendo()
    .env("VENDO_VENDOR_DIR", "third_party")
    .args(["check", "consistency"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("vendor directory not found"));
}
