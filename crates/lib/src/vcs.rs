//! Version-control backends for vendored repositories.
//!
//! A vendored copy may keep the metadata directory of the repository it was
//! cloned from (`.git`, `.hg` or `.bzr`). Each backend knows its marker
//! directory and how to drive its command-line tool; [`VcsRegistry`] decides
//! which backend, if any, owns a directory.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, SecondsFormat};
use thiserror::Error;
use tracing::debug;

use crate::process::{Cmd, CommandError};

/// Exported by git to hooks; they point at the enclosing project's repository.
const GIT_REPO_ENV: [&str; 4] = ["GIT_DIR", "GIT_WORK_TREE", "GIT_INDEX_FILE", "GIT_PREFIX"];

#[derive(Debug, Error)]
pub enum VcsError {
  #[error(transparent)]
  Command(#[from] CommandError),

  #[error("cannot parse {backend} revision time {raw:?}: {source}")]
  Time {
    backend: Backend,
    raw: String,
    #[source]
    source: chrono::ParseError,
  },

  #[error("cannot probe {}: {source}", .path.display())]
  Probe {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
  Git,
  Mercurial,
  Bazaar,
}

impl Backend {
  pub const ALL: [Backend; 3] = [Backend::Git, Backend::Mercurial, Backend::Bazaar];

  pub fn name(self) -> &'static str {
    match self {
      Backend::Git => "git",
      Backend::Mercurial => "hg",
      Backend::Bazaar => "bzr",
    }
  }

  /// Metadata directory whose presence marks a repository root.
  pub fn marker(self) -> &'static str {
    match self {
      Backend::Git => ".git",
      Backend::Mercurial => ".hg",
      Backend::Bazaar => ".bzr",
    }
  }

  fn tool(self) -> Cmd {
    let cmd = Cmd::new(self.name());
    match self {
      Backend::Git => GIT_REPO_ENV.iter().fold(cmd, |cmd, key| cmd.env_remove(key)),
      _ => cmd,
    }
  }

  /// Clones `from` into the directory `to`.
  pub fn clone_repo(self, from: &str, to: &Path) -> Result<(), VcsError> {
    match self {
      Backend::Git => self.tool().args(["clone", "-q", "--", from]).arg(to).log_always().run()?,
      Backend::Mercurial => self.tool().args(["clone", "-q", "--", from]).arg(to).log_always().run()?,
      Backend::Bazaar => {
        // `bzr branch` refuses an existing target; only an empty one is removed.
        if let Err(source) = std::fs::remove_dir(to)
          && source.kind() != io::ErrorKind::NotFound
        {
          return Err(VcsError::Probe {
            path: to.to_path_buf(),
            source,
          });
        }
        self.tool().args(["branch", "-q", from]).arg(to).log_always().run()?
      }
    }
    Ok(())
  }

  /// Converts the tool's native timestamp into RFC 3339.
  pub fn parse_revision_time(self, raw: &str) -> Result<String, VcsError> {
    let raw = raw.trim();
    let parsed = match self {
      Backend::Git | Backend::Mercurial => DateTime::parse_from_rfc3339(raw),
      Backend::Bazaar => DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z"),
    };
    parsed
      .map(|t: DateTime<FixedOffset>| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
      .map_err(|source| VcsError::Time {
        backend: self,
        raw: raw.to_string(),
        source,
      })
  }
}

impl fmt::Display for Backend {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// A repository root handled by a particular backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vcs {
  backend: Backend,
  root: PathBuf,
}

impl Vcs {
  pub fn new(backend: Backend, root: impl Into<PathBuf>) -> Self {
    Self {
      backend,
      root: root.into(),
    }
  }

  pub fn backend(&self) -> Backend {
    self.backend
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Directory holding the backend's metadata, e.g. `<root>/.git`.
  pub fn metadata_dir(&self) -> PathBuf {
    self.root.join(self.backend.marker())
  }

  /// The tool, pinned to this root and never to an enclosing repository.
  fn cmd(&self) -> Cmd {
    match self.backend {
      Backend::Git => Backend::Git
        .tool()
        .arg("--git-dir")
        .arg(self.metadata_dir())
        .arg("--work-tree")
        .arg(&self.root),
      Backend::Mercurial => Cmd::new("hg").arg("-R").arg(&self.root),
      Backend::Bazaar => Cmd::new("bzr"),
    }
  }

  /// Identifier of the checked-out revision.
  pub fn revision(&self) -> Result<String, VcsError> {
    let cmd = match self.backend {
      Backend::Git => self.cmd().args(["rev-parse", "HEAD"]),
      Backend::Mercurial => self.cmd().args(["log", "-r", ".", "--template", "{node}"]),
      Backend::Bazaar => self
        .cmd()
        .args(["version-info", "--custom", "--template={revision_id}"])
        .arg(&self.root),
    };
    Ok(cmd.output_one_line()?)
  }

  /// Commit time of the checked-out revision, in RFC 3339.
  pub fn revision_time(&self) -> Result<String, VcsError> {
    let cmd = match self.backend {
      Backend::Git => self.cmd().args(["log", "-1", "--format=%aI", "HEAD"]),
      Backend::Mercurial => self.cmd().args(["log", "-r", ".", "--template", "{date|rfc3339date}"]),
      Backend::Bazaar => self
        .cmd()
        .args(["version-info", "--custom", "--template={date}"])
        .arg(&self.root),
    };
    self.backend.parse_revision_time(&cmd.output_one_line()?)
  }

  /// A name `checkout` can return to: the branch for git when HEAD is on
  /// one, otherwise the revision itself.
  pub fn head_symbolic_ref(&self) -> Result<String, VcsError> {
    if self.backend == Backend::Git {
      let branch = self
        .cmd()
        .args(["symbolic-ref", "-q", "--short", "HEAD"])
        .log_never()
        .output_one_line();
      match branch {
        Ok(branch) => return Ok(branch),
        Err(e) if e.exit_code() == Some(1) => debug!(root = %self.root.display(), "detached HEAD"),
        Err(e) => return Err(e.into()),
      }
    }
    self.revision()
  }

  pub fn checkout(&self, revision: &str) -> Result<(), VcsError> {
    let cmd = match self.backend {
      Backend::Git => self.cmd().args(["checkout", "-q", revision]),
      Backend::Mercurial => self.cmd().args(["update", "-q", "-r", revision]),
      Backend::Bazaar => self
        .cmd()
        .args(["update", "-q", "-r"])
        .arg(format!("revid:{revision}"))
        .arg(&self.root),
    };
    cmd.log_always().run()?;
    Ok(())
  }

  /// True when the working copy has neither modifications nor untracked
  /// files.
  pub fn is_clean(&self) -> Result<bool, VcsError> {
    let cmd = match self.backend {
      Backend::Git => self.cmd().args(["status", "--porcelain"]),
      Backend::Mercurial => self.cmd().arg("status"),
      Backend::Bazaar => self.cmd().arg("status").arg(&self.root),
    };
    Ok(cmd.output_lines()?.is_empty())
  }
}

/// Ordered list of backends consulted when identifying a directory. When a
/// directory carries several markers, the earliest backend wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsRegistry {
  backends: Vec<Backend>,
}

impl Default for VcsRegistry {
  fn default() -> Self {
    Self::new(Backend::ALL.to_vec())
  }
}

impl VcsRegistry {
  pub fn new(backends: Vec<Backend>) -> Self {
    Self { backends }
  }

  pub fn backends(&self) -> &[Backend] {
    &self.backends
  }

  /// The backend whose marker directory sits directly in `dir`.
  pub fn detect(&self, dir: &Path) -> Result<Option<Vcs>, VcsError> {
    for &backend in &self.backends {
      let marker = dir.join(backend.marker());
      match std::fs::metadata(&marker) {
        Ok(meta) if meta.is_dir() => return Ok(Some(Vcs::new(backend, dir))),
        Ok(_) => {}
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {}
        Err(source) => return Err(VcsError::Probe { path: marker, source }),
      }
    }
    Ok(None)
  }

  /// Walks from `path` towards the filesystem root and returns the first
  /// directory a backend recognizes. A relative path is not followed above
  /// its first component.
  pub fn find_root(&self, path: &Path) -> Result<Option<Vcs>, VcsError> {
    let mut current = Some(path);
    while let Some(dir) = current.filter(|d| !d.as_os_str().is_empty()) {
      if let Some(vcs) = self.detect(dir)? {
        return Ok(Some(vcs));
      }
      current = dir.parent();
    }
    Ok(None)
  }
}
