//! Finds the import paths used by the project's own Go sources.
//!
//! Only the package clause and the import declarations that follow it are
//! read; the rest of each file is ignored.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use super::{ImportError, ImportSet};
use crate::util::path::has_path_prefix;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{message} at byte {offset}")]
pub struct ImportSyntaxError {
  pub message: String,
  pub offset: usize,
  /// Imports recognized before the error.
  pub partial: Vec<String>,
}

/// Files and directories the Go tool never builds from.
fn is_ignored(entry: &DirEntry) -> bool {
  if entry.depth() == 0 {
    return false;
  }
  let name = entry.file_name().to_string_lossy();
  name.starts_with('_') || name.starts_with('.') || (name == "testdata" && entry.file_type().is_dir())
}

/// Collects the imports of every `*.go` file below `root`, leaving out the
/// project itself (`project` and anything under it) and the cgo pseudo
/// package `C`.
pub fn scan_imports(root: &Path, project: &str) -> Result<ImportSet, ImportError> {
  let mut imports = ImportSet::new();
  let walker = WalkDir::new(root).sort_by_file_name().into_iter();
  for entry in walker.filter_entry(|e| !is_ignored(e)) {
    let entry = entry?;
    if !entry.file_type().is_file() || entry.path().extension().is_none_or(|ext| ext != "go") {
      continue;
    }
    let path = entry.path();
    let src = std::fs::read(path).map_err(|source| ImportError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let src = String::from_utf8_lossy(&src);
    let found = match parse_imports(&src) {
      Ok(found) => found,
      Err(e) => {
        warn!(file = %path.display(), "{e}");
        e.partial
      }
    };
    debug!(file = %path.display(), count = found.len(), "parsed imports");
    for id in found {
      if id != "C" && !has_path_prefix(&id, project) {
        imports.insert(id);
      }
    }
  }
  Ok(imports)
}

/// Returns the import paths declared by one Go source file, in order.
pub fn parse_imports(src: &str) -> Result<Vec<String>, ImportSyntaxError> {
  let mut parser = Parser {
    src: src.as_bytes(),
    pos: 0,
    found: Vec::new(),
  };
  match parser.file() {
    Ok(()) => Ok(parser.found),
    Err((message, offset)) => Err(ImportSyntaxError {
      message,
      offset,
      partial: parser.found,
    }),
  }
}

type ParseResult<T> = Result<T, (String, usize)>;

struct Parser<'a> {
  src: &'a [u8],
  pos: usize,
  found: Vec<String>,
}

impl Parser<'_> {
  fn fail<T>(&self, message: &str) -> ParseResult<T> {
    Err((message.to_string(), self.pos))
  }

  fn peek(&self) -> Option<u8> {
    self.src.get(self.pos).copied()
  }

  /// Skips whitespace, comments and, when `semicolons` is set, `;`.
  fn skip(&mut self, semicolons: bool) -> ParseResult<()> {
    while let Some(c) = self.peek() {
      match c {
        b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
        b';' if semicolons => self.pos += 1,
        b'/' if self.src.get(self.pos + 1) == Some(&b'/') => {
          while self.peek().is_some_and(|c| c != b'\n') {
            self.pos += 1;
          }
        }
        b'/' if self.src.get(self.pos + 1) == Some(&b'*') => {
          let body = &self.src[self.pos + 2..];
          match body.windows(2).position(|w| w == b"*/") {
            Some(end) => self.pos += 2 + end + 2,
            None => return self.fail("comment not terminated"),
          }
        }
        _ => break,
      }
    }
    Ok(())
  }

  fn ident(&mut self) -> Option<&str> {
    let start = self.pos;
    while let Some(c) = self.peek() {
      if c == b'_' || c.is_ascii_alphanumeric() || c >= 0x80 {
        self.pos += 1;
      } else {
        break;
      }
    }
    if self.pos == start || self.src[start].is_ascii_digit() {
      self.pos = start;
      return None;
    }
    std::str::from_utf8(&self.src[start..self.pos]).ok()
  }

  fn keyword(&mut self, word: &str) -> bool {
    let start = self.pos;
    if self.ident() == Some(word) {
      true
    } else {
      self.pos = start;
      false
    }
  }

  fn file(&mut self) -> ParseResult<()> {
    if self.src.starts_with("\u{feff}".as_bytes()) {
      self.pos = 3;
    }
    self.skip(false)?;
    if !self.keyword("package") {
      return self.fail("expected 'package'");
    }
    self.skip(false)?;
    if self.ident().is_none() {
      return self.fail("expected package name");
    }
    loop {
      self.skip(true)?;
      if !self.keyword("import") {
        return Ok(());
      }
      self.skip(false)?;
      if self.peek() == Some(b'(') {
        self.pos += 1;
        loop {
          self.skip(true)?;
          match self.peek() {
            Some(b')') => {
              self.pos += 1;
              break;
            }
            None => return self.fail("import block not terminated"),
            Some(_) => self.import_spec()?,
          }
        }
      } else {
        self.import_spec()?;
      }
    }
  }

  /// `[name | "." | "_"] "path"`
  fn import_spec(&mut self) -> ParseResult<()> {
    if self.peek() == Some(b'.') {
      self.pos += 1;
    } else {
      let _ = self.ident();
    }
    self.skip(false)?;
    let path = self.string_lit()?;
    self.found.push(path);
    Ok(())
  }

  fn string_lit(&mut self) -> ParseResult<String> {
    let quote = match self.peek() {
      Some(q @ (b'"' | b'`')) => q,
      _ => return self.fail("expected import path"),
    };
    self.pos += 1;
    let mut out = Vec::new();
    while let Some(c) = self.peek() {
      self.pos += 1;
      match c {
        c if c == quote => return Ok(String::from_utf8_lossy(&out).into_owned()),
        b'\\' if quote == b'"' => match self.peek() {
          Some(escaped) => {
            out.push(escaped);
            self.pos += 1;
          }
          None => break,
        },
        b'\n' if quote == b'"' => return self.fail("newline in import path"),
        c => out.push(c),
      }
    }
    self.fail("import path not terminated")
  }
}
