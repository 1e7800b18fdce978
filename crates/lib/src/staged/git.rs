use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::status::{self, StatusError};
use super::{StagedError, StagedIndex, StashSnapshot, stash_created};
use crate::process::Cmd;

/// [`StagedIndex`] backed by the `git` command line, run in the project
/// root.
#[derive(Debug, Clone)]
pub struct GitIndex {
  root: PathBuf,
}

impl GitIndex {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn git(&self) -> Cmd {
    Cmd::new("git")
      .arg("-c")
      .arg("core.quotepath=on")
      .current_dir(&self.root)
  }

  /// Resolves a revision expression, mapping "does not exist" to `None`.
  fn verify(&self, rev: &str) -> Result<Option<String>, StagedError> {
    let cmd = self.git().args(["rev-parse", "-q", "--verify", rev]).log_never();
    match cmd.output_one_line() {
      Ok(id) => Ok(Some(id)),
      Err(e) if e.exit_code() == Some(1) => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  fn read_object(&self, object: &str) -> Result<Option<Vec<u8>>, StagedError> {
    if self.verify(object)?.is_none() {
      return Ok(None);
    }
    let blob = self.git().args(["cat-file", "blob", object]).stdout_bytes()?;
    Ok(Some(blob))
  }

  fn stash_top(&self) -> Result<Option<String>, StagedError> {
    self.verify("refs/stash")
  }

  fn restore_stash(&self, label: &str, stash: &str) -> Result<(), StagedError> {
    let fail = |reason: String| StagedError::StashRestore {
      stash: stash.to_string(),
      label: label.to_string(),
      reason,
    };
    match self.stash_top() {
      Ok(Some(top)) if top == stash => {}
      Ok(top) => {
        return Err(fail(format!(
          "refs/stash now points at {}",
          top.as_deref().unwrap_or("nothing")
        )));
      }
      Err(e) => return Err(fail(e.to_string())),
    }
    self
      .git()
      .args(["reset", "--hard", "--quiet"])
      .run()
      .map_err(|e| fail(e.to_string()))?;
    self
      .git()
      .args(["stash", "pop", "--index", "--quiet"])
      .run()
      .map_err(|e| fail(e.to_string()))?;
    Ok(())
  }
}

/// The stash may hold the user's changes but its id could not be read back.
fn unknown_stash(label: &str, err: StagedError) -> StagedError {
  StagedError::StashRestore {
    stash: "stash@{0}".to_string(),
    label: label.to_string(),
    reason: format!("could not look up the stash just created: {err}"),
  }
}

/// Parses one line of `git ls-files --stage`: `MODE SHA STAGE\tPATH`.
fn parse_ls_files_line(line: &[u8]) -> Result<String, StagedError> {
  let tab = line
    .iter()
    .position(|b| *b == b'\t')
    .ok_or_else(|| StatusError::MalformedLine(String::from_utf8_lossy(line).into_owned()))?;
  let raw = &line[tab + 1..];
  let path = if raw.first() == Some(&b'"') {
    let (path, rest) = status::parse_filename(raw)?;
    if !rest.is_empty() {
      return Err(StatusError::MalformedLine(String::from_utf8_lossy(line).into_owned()).into());
    }
    path
  } else {
    raw.to_vec()
  };
  Ok(String::from_utf8_lossy(&path).into_owned())
}

impl StagedIndex for GitIndex {
  fn list_staged(&self) -> Result<Vec<String>, StagedError> {
    let out = self.git().args(["ls-files", "--stage"]).stdout_bytes()?;
    let mut paths = Vec::new();
    for line in out.split(|b| *b == b'\n').filter(|l| !l.is_empty()) {
      let path = parse_ls_files_line(line)?;
      // Unmerged paths appear once per conflict stage.
      if paths.last() != Some(&path) {
        paths.push(path);
      }
    }
    debug!(count = paths.len(), "listed staged files");
    Ok(paths)
  }

  fn read_staged(&self, path: &str) -> Result<Option<Vec<u8>>, StagedError> {
    self.read_object(&format!(":{path}"))
  }

  fn read_head(&self, path: &str) -> Result<Option<Vec<u8>>, StagedError> {
    self.read_object(&format!("HEAD:{path}"))
  }

  fn staged_changes(&self, subpath: &str) -> Result<Vec<Vec<u8>>, StagedError> {
    let out = self
      .git()
      .args(["status", "--porcelain", "--", subpath])
      .stdout_bytes()?;
    Ok(status::staged_paths(&out)?)
  }

  fn stash_unstaged(&self, label: &str) -> Result<StashSnapshot<'_>, StagedError> {
    if self.verify("HEAD")?.is_none() {
      warn!(label, "no commits yet; checking the working tree as is, unstaged changes included");
      return Ok(StashSnapshot::noop(label));
    }
    let before = self.stash_top()?;
    self
      .git()
      .args(["stash", "push", "--keep-index", "--quiet", "--message", label])
      .run()?;
    let after = self.stash_top().map_err(|e| unknown_stash(label, e))?;
    let stash = match after {
      Some(after) if stash_created(before.as_deref(), Some(&after)) => after,
      _ => {
        debug!(label, "no unstaged changes to hide");
        return Ok(StashSnapshot::noop(label));
      }
    };
    info!(label, %stash, "hid unstaged changes");
    let owned = label.to_string();
    Ok(StashSnapshot::new(label, move || self.restore_stash(&owned, &stash)))
  }
}
