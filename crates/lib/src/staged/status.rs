//! Parser for `git status --porcelain` output.
//!
//! Each line is two status characters, a space, then one filename or, for
//! renames and copies, `ORIG -> NEW`. Filenames that contain unusual bytes
//! are double-quoted and use C-style escapes; the escapes decode to raw
//! bytes, so a name need not be valid UTF-8. Anything that does not match
//! this shape is an error rather than being skipped.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusError {
  #[error("cannot parse empty string as filename in git output")]
  EmptyFilename,

  #[error("cannot parse filename in git output: {0}")]
  Unterminated(String),

  #[error("cannot parse filename in git output (invalid syntax): {0}")]
  InvalidEscape(String),

  #[error("unexpected format of git output: {0:?}")]
  MalformedLine(String),
}

/// One line of porcelain status output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
  /// Index column (`X`).
  pub index: u8,
  /// Worktree column (`Y`).
  pub worktree: u8,
  /// One path, or the original and new path of a rename.
  pub paths: Vec<Vec<u8>>,
}

impl StatusEntry {
  /// True when the index column records a change, i.e. the entry is not
  /// unmodified (` `), untracked (`?`) or ignored (`!`).
  pub fn is_staged(&self) -> bool {
    !matches!(self.index, b' ' | b'?' | b'!')
  }
}

fn lossy(bytes: &[u8]) -> String {
  String::from_utf8_lossy(bytes).into_owned()
}

/// Reads one filename from the start of `input`, returning it together with
/// the unparsed remainder.
///
/// A bare name runs up to the first space. A quoted name runs up to the
/// closing quote.
pub fn parse_filename(input: &[u8]) -> Result<(Vec<u8>, &[u8]), StatusError> {
  match input.first() {
    None => Err(StatusError::EmptyFilename),
    Some(b'"') => parse_quoted(input),
    Some(_) => {
      let end = input.iter().position(|b| *b == b' ').unwrap_or(input.len());
      if end == 0 {
        return Err(StatusError::EmptyFilename);
      }
      Ok((input[..end].to_vec(), &input[end..]))
    }
  }
}

fn parse_quoted(input: &[u8]) -> Result<(Vec<u8>, &[u8]), StatusError> {
  let invalid = || StatusError::InvalidEscape(lossy(input));
  let mut name = Vec::new();
  let mut i = 1;
  while i < input.len() {
    match input[i] {
      b'"' => return Ok((name, &input[i + 1..])),
      b'\\' => {
        let esc = *input.get(i + 1).ok_or_else(invalid)?;
        i += 2;
        let byte = match esc {
          b'a' => 0x07,
          b'b' => 0x08,
          b'f' => 0x0c,
          b'n' => b'\n',
          b'r' => b'\r',
          b't' => b'\t',
          b'v' => 0x0b,
          b'\\' => b'\\',
          b'"' => b'"',
          b'x' => {
            let hex = input.get(i..i + 2).ok_or_else(invalid)?;
            i += 2;
            std::str::from_utf8(hex)
              .ok()
              .and_then(|h| u8::from_str_radix(h, 16).ok())
              .ok_or_else(invalid)?
          }
          b'0'..=b'7' => {
            let rest = input.get(i..i + 2).ok_or_else(invalid)?;
            i += 2;
            let mut value: u32 = u32::from(esc - b'0');
            for d in rest {
              if !(b'0'..=b'7').contains(d) {
                return Err(invalid());
              }
              value = value * 8 + u32::from(d - b'0');
            }
            u8::try_from(value).map_err(|_| invalid())?
          }
          _ => return Err(invalid()),
        };
        name.push(byte);
      }
      b => {
        name.push(b);
        i += 1;
      }
    }
  }
  Err(StatusError::Unterminated(lossy(input)))
}

/// Parses a single status line (without its trailing newline).
pub fn parse_status_line(line: &[u8]) -> Result<StatusEntry, StatusError> {
  let malformed = || StatusError::MalformedLine(lossy(line));
  if line.len() < 4 || line[2] != b' ' {
    return Err(malformed());
  }
  let (first, rest) = parse_filename(&line[3..])?;
  let mut paths = vec![first];
  if !rest.is_empty() {
    let rest = rest.strip_prefix(b" -> ").ok_or_else(malformed)?;
    let (second, rest) = parse_filename(rest)?;
    if !rest.is_empty() {
      return Err(malformed());
    }
    paths.push(second);
  }
  Ok(StatusEntry {
    index: line[0],
    worktree: line[1],
    paths,
  })
}

/// Every path with a staged change in a complete status listing. Renames
/// contribute both names.
pub fn staged_paths(output: &[u8]) -> Result<Vec<Vec<u8>>, StatusError> {
  let mut paths = Vec::new();
  for line in output.split(|b| *b == b'\n').filter(|l| !l.is_empty()) {
    let entry = parse_status_line(line)?;
    if entry.is_staged() {
      paths.extend(entry.paths);
    }
  }
  Ok(paths)
}
