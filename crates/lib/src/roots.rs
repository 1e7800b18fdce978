//! Path-segment trie of declared repository roots.
//!
//! Every `repositoryRoot` from the manifest is inserted segment by segment.
//! A node without children is a leaf and marks a declared root; inner nodes
//! are directories that merely lead to one.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::util::path::{PathIssue, check_clean_relative, parent_bytes};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid repository root {path:?}: {issue}")]
pub struct RootPathError {
  pub path: String,
  pub issue: PathIssue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoRootTree {
  children: BTreeMap<String, RepoRootTree>,
}

impl RepoRootTree {
  pub fn new() -> Self {
    Self::default()
  }

  /// Builds a tree from a list of roots, failing on the first invalid one.
  pub fn from_roots<'a, I>(roots: I) -> Result<Self, RootPathError>
  where
    I: IntoIterator<Item = &'a str>,
  {
    let mut tree = Self::new();
    for root in roots {
      tree.put(root)?;
    }
    Ok(tree)
  }

  /// Inserts a clean, relative, slash-separated path, creating intermediate
  /// nodes as needed. Inserting a path twice is a no-op.
  pub fn put(&mut self, path: &str) -> Result<(), RootPathError> {
    check_clean_relative(path).map_err(|issue| RootPathError {
      path: path.to_string(),
      issue,
    })?;
    let mut node = self;
    for seg in path.split('/') {
      node = node.children.entry(seg.to_string()).or_default();
    }
    Ok(())
  }

  /// Descends segment by segment; `None` at the first missing segment.
  /// The empty path never matches.
  pub fn get(&self, path: &str) -> Option<&RepoRootTree> {
    if path.is_empty() {
      return None;
    }
    let mut node = self;
    for seg in path.split('/') {
      node = node.children.get(seg)?;
    }
    Some(node)
  }

  /// A leaf denotes a declared repository root.
  pub fn is_leaf(&self) -> bool {
    self.children.is_empty()
  }

  /// Returns the declared root containing `file`, found by walking up the
  /// file's parent directories until one of them is a leaf.
  ///
  /// `file` is raw bytes as reported by git; ancestors that are not valid
  /// UTF-8 can never match a root and are skipped.
  pub fn enclosing_root(&self, file: &[u8]) -> Option<String> {
    let mut current = parent_bytes(file);
    while let Some(dir) = current {
      if let Ok(dir) = std::str::from_utf8(dir)
        && self.get(dir).is_some_and(RepoRootTree::is_leaf)
      {
        return Some(dir.to_string());
      }
      current = parent_bytes(dir);
    }
    None
  }
}
