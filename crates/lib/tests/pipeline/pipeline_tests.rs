//! Full verification runs against real git repositories.

use vendo_lib::check::{CheckError, Checker, Phase, StrayKind};
use vendo_lib::config::Layout;
use vendo_lib::staged::GitIndex;
use vendo_lib::vcs::VcsRegistry;

use crate::common::{Project, TableResolver, entry, manifest};

fn resolver() -> TableResolver {
  TableResolver::new("example.com/proj")
    .edge("hostA/x", &["fmt", "hostA/x/internal"])
    .standard(&["fmt", "os"])
}

/// Project importing hostA/x, vendored with its internal package.
fn vendored_project() -> Project {
  let project = Project::new();
  project.write("main.go", "package main\n\nimport (\n\t\"hostA/x\"\n\t\"os\"\n)\n");
  project.write("_vendor/.gitignore", ".git\n.hg\n.bzr\n");
  project.write("_vendor/src/hostA/x/x.go", "package x\n");
  project.write("_vendor/src/hostA/x/internal/i.go", "package internal\n");
  project.write_manifest(&manifest(vec![
    entry("hostA/x", "_vendor/src/hostA/x"),
    entry("hostA/x/internal", "_vendor/src/hostA/x"),
  ]));
  project.commit_all("vendor hostA/x");
  project
}

fn run(project: &Project, resolver: &TableResolver, phases: &[Phase]) -> Result<(), CheckError> {
  let layout = Layout::new(project.path());
  let index = GitIndex::new(project.path());
  let registry = VcsRegistry::default();
  Checker::new(&layout, &index, resolver, &registry).run(phases)
}

#[test]
fn all_phases_pass_on_consistent_project() {
  let project = vendored_project();
  run(&project, &resolver(), &Phase::ALL).unwrap();
}

#[test]
fn first_commit_is_checked_without_stashing() {
  let project = Project::new();
  project.write("main.go", "package main\n\nimport \"hostA/x\"\n");
  project.write("_vendor/src/hostA/x/x.go", "package x\n");
  project.write_manifest(&manifest(vec![
    entry("hostA/x", "_vendor/src/hostA/x"),
    entry("hostA/x/internal", "_vendor/src/hostA/x"),
  ]));
  project.git(&["add", "-A"]);

  run(&project, &resolver(), &[Phase::Consistency, Phase::Dependencies]).unwrap();
  assert_eq!(project.git(&["stash", "list"]), "");
}

#[test]
fn extra_declared_package_fails_dependency_check() {
  let project = vendored_project();
  project.write_manifest(&manifest(vec![
    entry("hostA/x", "_vendor/src/hostA/x"),
    entry("hostA/x/internal", "_vendor/src/hostA/x"),
    entry("hostA/x/sub", "_vendor/src/hostA/x"),
  ]));
  project.git(&["add", "vendor.json"]);

  match run(&project, &resolver(), &Phase::ALL).unwrap_err() {
    CheckError::ManifestMismatch { declared, detected, .. } => {
      assert!(declared.contains(&"hostA/x/sub".to_string()));
      assert!(!detected.contains(&"hostA/x/sub".to_string()));
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn stray_vendored_directory_fails_consistency() {
  let project = vendored_project();
  project.write("_vendor/src/hostA/y/y.go", "package y\n");
  project.git(&["add", "_vendor/src/hostA/y/y.go"]);

  match run(&project, &resolver(), &Phase::ALL).unwrap_err() {
    CheckError::StrayPath { path, kind, .. } => {
      assert_eq!(path, "_vendor/src/hostA/y");
      assert_eq!(kind, StrayKind::Undeclared);
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn dependency_check_sees_staged_sources_only() {
  let project = vendored_project();
  let unstaged = "package main\n\nimport (\n\t\"hostA/x\"\n\t\"hostB/z\"\n)\n";
  project.write("main.go", unstaged);

  run(&project, &resolver(), &[Phase::Dependencies]).unwrap();
  assert_eq!(project.read("main.go"), unstaged);
  assert_eq!(project.git(&["stash", "list"]), "");
}

#[test]
fn staged_import_without_manifest_entry_fails() {
  let project = vendored_project();
  project.write("main.go", "package main\n\nimport (\n\t\"hostA/x\"\n\t\"hostB/z\"\n)\n");
  project.git(&["add", "main.go"]);

  let err = run(&project, &resolver(), &[Phase::Dependencies]).unwrap_err();
  let text = err.to_string();
  assert!(text.contains("hostB/z"), "{text}");
  assert!(text.contains('↑'));
}

#[test]
fn commented_patch_passes_and_uncommented_fails() {
  let project = vendored_project();
  project.write("_vendor/src/hostA/x/x.go", "package x // local fix\n");
  project.git(&["add", "_vendor/src/hostA/x/x.go"]);

  let err = run(&project, &resolver(), &Phase::ALL).unwrap_err();
  assert!(matches!(err, CheckError::UncommentedPatch { .. }), "{err}");

  let mut patched = manifest(vec![
    entry("hostA/x", "_vendor/src/hostA/x"),
    entry("hostA/x/internal", "_vendor/src/hostA/x"),
  ]);
  patched.packages[0].comment = "local fix in x.go".to_string();
  project.write_manifest(&patched);
  project.git(&["add", "vendor.json"]);

  run(&project, &resolver(), &Phase::ALL).unwrap();
}
