//! Target platforms for dependency resolution.
//!
//! A platform is written `OS_ARCH` (e.g. `linux_amd64`), matching the
//! `GOOS`/`GOARCH` pair handed to the build resolver. Only the first `_`
//! separates the two halves, so `linux_arm_v7` has arch `arm_v7`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlatformError {
  #[error("invalid platform {0:?}: expected OS_ARCH, e.g. linux_amd64")]
  Malformed(String),

  #[error("no platforms given")]
  Empty,
}

/// Operating system and architecture pair, e.g. `linux_amd64`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Platform {
  pub os: String,
  pub arch: String,
}

impl Platform {
  pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
    Self {
      os: os.into(),
      arch: arch.into(),
    }
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}_{}", self.os, self.arch)
  }
}

impl FromStr for Platform {
  type Err = PlatformError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.split_once('_') {
      Some((os, arch)) if !os.is_empty() && !arch.is_empty() => Ok(Self::new(os, arch)),
      _ => Err(PlatformError::Malformed(s.to_string())),
    }
  }
}

impl TryFrom<String> for Platform {
  type Error = PlatformError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Platform> for String {
  fn from(platform: Platform) -> Self {
    platform.to_string()
  }
}

/// Parses a comma-separated list such as `linux_amd64,darwin_arm64`.
///
/// Surrounding whitespace and empty items are ignored; the result must hold
/// at least one platform.
pub fn parse_platforms(list: &str) -> Result<Vec<Platform>, PlatformError> {
  let platforms = list
    .split(',')
    .map(str::trim)
    .filter(|item| !item.is_empty())
    .map(str::parse)
    .collect::<Result<Vec<Platform>, _>>()?;
  if platforms.is_empty() {
    return Err(PlatformError::Empty);
  }
  Ok(platforms)
}
