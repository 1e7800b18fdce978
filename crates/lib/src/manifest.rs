//! The `vendor.json` manifest.
//!
//! The manifest records every vendored package together with the repository
//! root it was copied from and the revision that copy corresponds to.
//!
//! # Format
//!
//! ```json
//! {
//!   "tool": "github.com/zpas-lab/vendo",
//!   "package": [
//!     {
//!       "canonical": "github.com/foo/bar",
//!       "local": "github.com/foo/bar",
//!       "revision": "7b3e0e8b...",
//!       "revisionTime": "2015-07-10T12:34:56+02:00",
//!       "comment": "patched: fix race in Close",
//!       "repositoryRoot": "_vendor/src/github.com/foo/bar"
//!     }
//!   ],
//!   "platforms": ["linux_amd64", "darwin_amd64"]
//! }
//! ```
//!
//! Unknown keys are ignored on read. `package` may be `null`.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use crate::consts::TOOL_NAME;
use crate::platform::Platform;
use crate::util::path::{PathIssue, check_clean_relative};

#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to read {}: {source}", .path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse manifest: {0}")]
  Parse(#[source] serde_json::Error),

  #[error("failed to serialize manifest: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("failed to write {}: {source}", .path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid \"repositoryRoot\" {root:?} for import {canonical:?}: {issue}")]
  InvalidRoot {
    canonical: String,
    root: String,
    issue: PathIssue,
  },

  #[error("empty \"canonical\" import path in manifest entry with repositoryRoot {0:?}")]
  EmptyCanonical(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
  #[serde(default)]
  pub tool: String,

  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub comment: String,

  #[serde(rename = "package", default, deserialize_with = "null_as_empty")]
  pub packages: Vec<ManifestEntry>,

  /// Platforms the dependency closure is computed for.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub platforms: Vec<Platform>,
}

/// One vendored package.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
  /// Import path the project's code uses.
  #[serde(default)]
  pub canonical: String,

  /// Import path of the copy under the vendor directory.
  #[serde(default)]
  pub local: String,

  /// Revision of the upstream repository the copy was taken from.
  #[serde(default)]
  pub revision: String,

  #[serde(default)]
  pub revision_time: String,

  /// Free-form note; editing it is how a local patch gets acknowledged.
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub comment: String,

  /// Project-relative directory holding the copied repository.
  #[serde(default)]
  pub repository_root: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ManifestEntry>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(Option::<Vec<ManifestEntry>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Default for Manifest {
  fn default() -> Self {
    Self::new()
  }
}

impl Manifest {
  pub fn new() -> Self {
    Self {
      tool: TOOL_NAME.to_string(),
      comment: String::new(),
      packages: Vec::new(),
      platforms: Vec::new(),
    }
  }

  pub fn parse(bytes: &[u8]) -> Result<Self, ManifestError> {
    serde_json::from_slice(bytes).map_err(ManifestError::Parse)
  }

  /// Loads the manifest from disk.
  ///
  /// Returns `Ok(None)` if the file does not exist.
  pub fn load(path: &Path) -> Result<Option<Self>, ManifestError> {
    let bytes = match std::fs::read(path) {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(source) => {
        return Err(ManifestError::Read {
          path: path.to_path_buf(),
          source,
        });
      }
    };
    Self::parse(&bytes).map(Some)
  }

  /// Pretty-printed JSON with 2-space indent and a trailing newline.
  /// Entries are emitted sorted by `canonical`.
  pub fn to_json(&self) -> Result<String, ManifestError> {
    let mut sorted = self.clone();
    sorted.sort_packages();
    let mut json = serde_json::to_string_pretty(&sorted).map_err(ManifestError::Serialize)?;
    json.push('\n');
    Ok(json)
  }

  /// Writes the manifest atomically: a temporary file in the same directory
  /// is filled and then renamed over `path`.
  pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
    let json = self.to_json()?;
    let write_err = |source| ManifestError::Write {
      path: path.to_path_buf(),
      source,
    };
    let dir = match path.parent() {
      Some(dir) if !dir.as_os_str().is_empty() => dir,
      _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(json.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    debug!(path = %path.display(), packages = self.packages.len(), "wrote manifest");
    Ok(())
  }

  pub fn sort_packages(&mut self) {
    self.packages.sort_by(|a, b| a.canonical.cmp(&b.canonical));
  }

  /// Groups entries by repository root; several packages may share a root.
  pub fn by_repository_root(&self) -> BTreeMap<&str, Vec<&ManifestEntry>> {
    let mut roots: BTreeMap<&str, Vec<&ManifestEntry>> = BTreeMap::new();
    for p in &self.packages {
      roots.entry(p.repository_root.as_str()).or_default().push(p);
    }
    roots
  }

  /// Canonical import paths, sorted. A path listed twice appears twice.
  pub fn canonical_ids(&self) -> Vec<String> {
    let mut ids: Vec<String> = self.packages.iter().map(|p| p.canonical.clone()).collect();
    ids.sort();
    ids
  }

  pub fn repository_roots(&self) -> BTreeSet<&str> {
    self.packages.iter().map(|p| p.repository_root.as_str()).collect()
  }

  pub fn validate(&self) -> Result<(), ManifestError> {
    for p in &self.packages {
      if p.canonical.is_empty() {
        return Err(ManifestError::EmptyCanonical(p.repository_root.clone()));
      }
      check_clean_relative(&p.repository_root).map_err(|issue| ManifestError::InvalidRoot {
        canonical: p.canonical.clone(),
        root: p.repository_root.clone(),
        issue,
      })?;
    }
    Ok(())
  }
}
