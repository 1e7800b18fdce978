//! Read access to the project's staged index.
//!
//! Checks must judge what is about to be committed, not what happens to be
//! in the working tree. [`StagedIndex`] exposes the index as a flat sorted
//! listing, reads blobs from the index or from `HEAD`, reports staged
//! changes, and can temporarily hide unstaged modifications so tools that
//! only read the filesystem see the staged state.

mod git;
mod stash;
pub mod status;

pub use git::GitIndex;
pub use stash::{StashSnapshot, stash_created};

use thiserror::Error;

use crate::process::CommandError;
use crate::util::path::is_subdir;
use status::StatusError;

#[derive(Debug, Error)]
pub enum StagedError {
  #[error(transparent)]
  Command(#[from] CommandError),

  #[error(transparent)]
  Status(#[from] StatusError),

  #[error(
    "failed to restore unstaged changes hidden in stash {stash} ({label}): {reason}\n\
     Recover them manually with:\n  git stash apply --index {stash}"
  )]
  StashRestore {
    stash: String,
    label: String,
    reason: String,
  },
}

pub trait StagedIndex {
  /// Every path in the index, sorted, each listed once.
  fn list_staged(&self) -> Result<Vec<String>, StagedError>;

  /// Content of `path` as staged, or `None` if it is not in the index.
  fn read_staged(&self, path: &str) -> Result<Option<Vec<u8>>, StagedError>;

  /// Content of `path` at `HEAD`, or `None` if it is absent there or there
  /// is no commit yet.
  fn read_head(&self, path: &str) -> Result<Option<Vec<u8>>, StagedError>;

  /// Paths under `subpath` whose staged content differs from `HEAD`.
  fn staged_changes(&self, subpath: &str) -> Result<Vec<Vec<u8>>, StagedError>;

  /// Hides unstaged modifications of tracked files until the returned
  /// snapshot is released or dropped.
  fn stash_unstaged(&self, label: &str) -> Result<StashSnapshot<'_>, StagedError>;
}

/// Returned by a [`walk_tree`] visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
  Continue,
  /// Do not report anything below the directory just visited. Ignored for
  /// files.
  SkipDir,
}

/// Replays a sorted, flat list of staged files under `subpath` as a tree
/// walk.
///
/// `visit` receives `(path, is_dir)`. Each directory strictly between
/// `subpath` and a file is reported once, before anything inside it.
/// `subpath` itself is not reported.
pub fn walk_tree<E>(
  files: &[String],
  subpath: &str,
  mut visit: impl FnMut(&str, bool) -> Result<WalkControl, E>,
) -> Result<(), E> {
  let base = subpath.trim_end_matches('/');
  let mut open: Vec<&str> = Vec::new();
  let mut skipped: Option<&str> = None;

  for file in files {
    let file = file.as_str();
    if !is_subdir(file, base) {
      continue;
    }
    if skipped.is_some_and(|dir| is_subdir(file, dir)) {
      continue;
    }
    skipped = None;

    while open.last().is_some_and(|dir| !is_subdir(file, dir)) {
      open.pop();
    }

    let mut start = open.last().map_or(base.len(), |dir| dir.len()) + 1;
    while let Some(offset) = file[start..].find('/') {
      let dir = &file[..start + offset];
      open.push(dir);
      start += offset + 1;
      if visit(dir, true)? == WalkControl::SkipDir {
        skipped = Some(dir);
        break;
      }
    }
    if skipped.is_some_and(|dir| is_subdir(file, dir)) {
      continue;
    }
    visit(file, false)?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::convert::Infallible;

  fn files(list: &[&str]) -> Vec<String> {
    let mut v: Vec<String> = list.iter().map(|s| s.to_string()).collect();
    v.sort();
    v
  }

  fn events(list: &[String], subpath: &str, skip: &[&str]) -> Vec<String> {
    let mut seen = Vec::new();
    walk_tree::<Infallible>(list, subpath, |path, is_dir| {
      seen.push(format!("{}{}", path, if is_dir { "/" } else { "" }));
      Ok(if skip.contains(&path) {
        WalkControl::SkipDir
      } else {
        WalkControl::Continue
      })
    })
    .unwrap();
    seen
  }

  #[test]
  fn synthesizes_every_ancestor_directory_once() {
    let list = files(&[
      "main.go",
      "_vendor/.gitignore",
      "_vendor/src/h/x/a.go",
      "_vendor/src/h/x/sub/b.go",
      "_vendor/src/h/y.go",
    ]);
    assert_eq!(
      events(&list, "_vendor", &[]),
      vec![
        "_vendor/.gitignore",
        "_vendor/src/",
        "_vendor/src/h/",
        "_vendor/src/h/x/",
        "_vendor/src/h/x/a.go",
        "_vendor/src/h/x/sub/",
        "_vendor/src/h/x/sub/b.go",
        "_vendor/src/h/y.go",
      ]
    );
  }

  #[test]
  fn skip_dir_prunes_subtree() {
    let list = files(&[
      "_vendor/src/h/x/.travis.yml",
      "_vendor/src/h/x/deep/a.go",
      "_vendor/src/h/x/z.go",
      "_vendor/src/h/x-other/c.go",
    ]);
    assert_eq!(
      events(&list, "_vendor/", &["_vendor/src/h/x"]),
      vec![
        "_vendor/src/",
        "_vendor/src/h/",
        "_vendor/src/h/x-other/",
        "_vendor/src/h/x-other/c.go",
        "_vendor/src/h/x/",
      ]
    );
  }

  #[test]
  fn entries_outside_subpath_are_ignored() {
    let list = files(&["_vendored/a", "vendor.json", "_vendor/b"]);
    assert_eq!(events(&list, "_vendor", &[]), vec!["_vendor/b"]);
  }

  #[test]
  fn visitor_error_stops_walk() {
    let list = files(&["_vendor/a/b", "_vendor/c/d"]);
    let mut count = 0;
    let result = walk_tree(&list, "_vendor", |path, _| {
      count += 1;
      if path == "_vendor/a" { Err(path.to_string()) } else { Ok(WalkControl::Continue) }
    });
    assert_eq!(result, Err("_vendor/a".to_string()));
    assert_eq!(count, 1);
  }
}
