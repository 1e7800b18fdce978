//! Project layout: where the manifest and the vendor tree live.
//!
//! All names are project-relative and slash-separated. The defaults can be
//! overridden with `VENDO_MANIFEST` and `VENDO_VENDOR_DIR`.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::consts::{IGNORE_FILENAME, MANIFEST_ENV, MANIFEST_FILENAME, VENDOR_DIR_ENV, VENDOR_DIRNAME};
use crate::util::path::{PathIssue, check_clean_relative};

#[derive(Debug, Error)]
pub enum LayoutError {
  #[error("{} not found: {}", .kind, .path.display())]
  NotFound { kind: &'static str, path: PathBuf },

  #[error("expected a directory: {}", .0.display())]
  NotADirectory(PathBuf),

  #[error("expected a regular file: {}", .0.display())]
  NotAFile(PathBuf),

  #[error("cannot access {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid value {value:?} in ${var}: {issue}")]
  InvalidOverride {
    var: &'static str,
    value: String,
    issue: PathIssue,
  },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
  root: PathBuf,
  manifest: String,
  vendor: String,
}

impl Layout {
  /// Layout with default names rooted at `root`.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self {
      root: root.into(),
      manifest: MANIFEST_FILENAME.to_string(),
      vendor: VENDOR_DIRNAME.to_string(),
    }
  }

  /// Layout rooted at `root` with names taken from the environment when set.
  pub fn from_env(root: impl Into<PathBuf>) -> Result<Self, LayoutError> {
    let mut layout = Self::new(root);
    if let Some(manifest) = read_override(MANIFEST_ENV)? {
      layout.manifest = manifest;
    }
    if let Some(vendor) = read_override(VENDOR_DIR_ENV)? {
      layout.vendor = vendor;
    }
    Ok(layout)
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn manifest(&self) -> &str {
    &self.manifest
  }

  pub fn vendor_dir(&self) -> &str {
    &self.vendor
  }

  /// The ignore file inside the vendor directory (`_vendor/.gitignore`).
  pub fn ignore_file(&self) -> String {
    format!("{}/{}", self.vendor, IGNORE_FILENAME)
  }

  /// Resolves a project-relative slash path against the root.
  pub fn abs(&self, relative: &str) -> PathBuf {
    relative.split('/').fold(self.root.clone(), |path, seg| path.join(seg))
  }

  /// Confirms the project looks like a git checkout with a manifest and a
  /// vendor directory. Runs before every phase, and again once the working
  /// tree has been rewritten to the staged state.
  pub fn verify_structure(&self) -> Result<(), LayoutError> {
    expect_dir("git directory", &self.root.join(".git"))?;
    expect_file("manifest", &self.abs(&self.manifest))?;
    expect_dir("vendor directory", &self.abs(&self.vendor))?;
    Ok(())
  }
}

fn read_override(var: &'static str) -> Result<Option<String>, LayoutError> {
  let Some(value) = env::var(var).ok().filter(|v| !v.is_empty()) else {
    return Ok(None);
  };
  check_clean_relative(&value).map_err(|issue| LayoutError::InvalidOverride {
    var,
    value: value.clone(),
    issue,
  })?;
  Ok(Some(value))
}

fn stat(kind: &'static str, path: &Path) -> Result<std::fs::Metadata, LayoutError> {
  std::fs::metadata(path).map_err(|source| match source.kind() {
    io::ErrorKind::NotFound => LayoutError::NotFound {
      kind,
      path: path.to_path_buf(),
    },
    _ => LayoutError::Io {
      path: path.to_path_buf(),
      source,
    },
  })
}

fn expect_dir(kind: &'static str, path: &Path) -> Result<(), LayoutError> {
  if stat(kind, path)?.is_dir() {
    Ok(())
  } else {
    Err(LayoutError::NotADirectory(path.to_path_buf()))
  }
}

fn expect_file(kind: &'static str, path: &Path) -> Result<(), LayoutError> {
  if stat(kind, path)?.is_file() {
    Ok(())
  } else {
    Err(LayoutError::NotAFile(path.to_path_buf()))
  }
}
