//! Helpers for relative, slash-separated paths.
//!
//! Paths stored in the manifest and reported by git are always relative to the
//! project root and use `/` regardless of platform. These helpers never touch
//! the filesystem.

use std::fmt;

/// Why a path was rejected by [`check_clean_relative`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathIssue {
  Empty,
  Absolute,
  Backslash,
  ParentSegment,
  NotClean { suggestion: String },
}

impl fmt::Display for PathIssue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PathIssue::Empty => write!(f, "path is empty"),
      PathIssue::Absolute => write!(f, "path is absolute (must be relative)"),
      PathIssue::Backslash => write!(f, "path must use forward slashes"),
      PathIssue::ParentSegment => write!(f, "path must not contain \"..\" segments"),
      PathIssue::NotClean { suggestion } => write!(f, "path is not clean (did you mean {:?}?)", suggestion),
    }
  }
}

/// Verifies that `path` is non-empty, relative, slash-separated and clean:
/// no `.` or `..` segments, no empty segments, no trailing slash.
pub fn check_clean_relative(path: &str) -> Result<(), PathIssue> {
  if path.is_empty() {
    return Err(PathIssue::Empty);
  }
  if path.starts_with('/') || has_drive_prefix(path) {
    return Err(PathIssue::Absolute);
  }
  if path.contains('\\') {
    return Err(PathIssue::Backslash);
  }
  let clean = clean(path);
  if clean.split('/').any(|seg| seg == "..") {
    return Err(PathIssue::ParentSegment);
  }
  if clean != path {
    return Err(PathIssue::NotClean { suggestion: clean });
  }
  Ok(())
}

fn has_drive_prefix(path: &str) -> bool {
  let bytes = path.as_bytes();
  bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Lexically cleans a relative slash path. Leading `..` segments are kept.
pub fn clean(path: &str) -> String {
  let mut out: Vec<&str> = Vec::new();
  for seg in path.split('/') {
    match seg {
      "" | "." => {}
      ".." => {
        if matches!(out.last(), Some(last) if *last != "..") {
          out.pop();
        } else {
          out.push("..");
        }
      }
      _ => out.push(seg),
    }
  }
  out.join("/")
}

/// Reports whether `path` lies strictly below `dir`.
///
/// Both arguments must be clean and either both relative or both absolute.
/// The comparison is purely textual and case-sensitive.
pub fn is_subdir(path: &str, dir: &str) -> bool {
  path.len() > dir.len() && path.starts_with(dir) && path.as_bytes()[dir.len()] == b'/'
}

/// Reports whether `id` equals `prefix` or names something below it.
pub fn has_path_prefix(id: &str, prefix: &str) -> bool {
  id == prefix || is_subdir(id, prefix)
}

/// Returns the parent of a relative slash path, or `None` at the top.
pub fn parent(path: &str) -> Option<&str> {
  path.rfind('/').map(|pos| &path[..pos])
}

/// Byte-level counterpart of [`parent`] for paths that may not be UTF-8.
pub fn parent_bytes(path: &[u8]) -> Option<&[u8]> {
  path.iter().rposition(|b| *b == b'/').map(|pos| &path[..pos])
}
