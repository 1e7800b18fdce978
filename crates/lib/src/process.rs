//! Synchronous external command runner.
//!
//! Every interaction with git, hg, bzr and the Go toolchain goes through
//! [`Cmd`]. Commands block until the child exits; there is no timeout. A
//! non-zero exit status becomes [`CommandError::ExternalTool`] carrying the
//! captured stderr and stdout so callers can surface them verbatim.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use thiserror::Error;
use tracing::{debug, info, warn};

/// Controls how much of a command is reported through `tracing`.
///
/// Every command line is always emitted at `debug` level; the mode decides
/// what is promoted to higher levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
  /// On failure, the command line and its full output are logged at `warn`.
  #[default]
  OnError,
  /// The command line is always logged at `info`; output only on failure.
  Always,
  /// Nothing above `debug`, even on failure. Used for probes that are
  /// expected to fail, such as reading a path missing from the index.
  Never,
}

#[derive(Debug, Error)]
pub enum CommandError {
  /// The process could not be started at all.
  #[error("failed to run '{command}': {source}")]
  Spawn {
    command: String,
    #[source]
    source: io::Error,
  },

  /// The process ran and exited unsuccessfully.
  #[error("'{command}' failed with exit code {}{}", fmt_code(.code), fmt_output(.output))]
  ExternalTool {
    command: String,
    code: Option<i32>,
    output: String,
  },

  /// The process succeeded but did not print exactly one line.
  #[error("expected one line of output from '{command}', got {count}")]
  UnexpectedLineCount { command: String, count: usize },
}

fn fmt_code(code: &Option<i32>) -> String {
  match code {
    Some(code) => code.to_string(),
    None => "none (terminated by signal)".to_string(),
  }
}

fn fmt_output(output: &str) -> String {
  if output.is_empty() {
    String::new()
  } else {
    format!(":\n{}", output)
  }
}

impl CommandError {
  /// Exit code of a command that ran and failed.
  pub fn exit_code(&self) -> Option<i32> {
    match self {
      CommandError::ExternalTool { code, .. } => *code,
      _ => None,
    }
  }
}

/// Builder for a single external command invocation.
#[derive(Debug, Clone)]
pub struct Cmd {
  program: String,
  args: Vec<OsString>,
  env: Vec<(String, OsString)>,
  env_removed: Vec<String>,
  cwd: Option<PathBuf>,
  log: LogMode,
}

impl Cmd {
  pub fn new(program: &str) -> Self {
    Self {
      program: program.to_string(),
      args: Vec::new(),
      env: Vec::new(),
      env_removed: Vec::new(),
      cwd: None,
      log: LogMode::default(),
    }
  }

  pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  /// Overrides one environment variable for the child, keeping the rest of
  /// the inherited environment. Later calls for the same key win.
  pub fn env(mut self, key: &str, value: impl Into<OsString>) -> Self {
    self.env.retain(|(k, _)| k != key);
    self.env.push((key.to_string(), value.into()));
    self
  }

  /// Removes a variable from the child's inherited environment.
  pub fn env_remove(mut self, key: &str) -> Self {
    self.env.retain(|(k, _)| k != key);
    if !self.env_removed.iter().any(|k| k == key) {
      self.env_removed.push(key.to_string());
    }
    self
  }

  pub fn current_dir(mut self, dir: &Path) -> Self {
    self.cwd = Some(dir.to_path_buf());
    self
  }

  pub fn log_mode(mut self, mode: LogMode) -> Self {
    self.log = mode;
    self
  }

  pub fn log_always(self) -> Self {
    self.log_mode(LogMode::Always)
  }

  pub fn log_never(self) -> Self {
    self.log_mode(LogMode::Never)
  }

  /// Shell-like rendering used in logs and errors, prefixed with any
  /// environment overrides: `GOOS=linux GOARCH=arm go list -- net/http`.
  pub fn command_line(&self) -> String {
    let mut parts: Vec<String> = self
      .env
      .iter()
      .map(|(k, v)| format!("{}={}", k, v.to_string_lossy()))
      .collect();
    parts.push(self.program.clone());
    parts.extend(self.args.iter().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
  }

  /// Runs the command and returns its raw output, failing on a non-zero exit.
  pub fn output(&self) -> Result<Output, CommandError> {
    let command_line = self.command_line();
    match self.log {
      LogMode::Always => info!(cmd = %command_line, "running"),
      _ => debug!(cmd = %command_line, cwd = ?self.cwd, "running"),
    }

    let mut command = Command::new(&self.program);
    command.args(&self.args);
    for key in &self.env_removed {
      command.env_remove(key);
    }
    for (key, value) in &self.env {
      command.env(key, value);
    }
    if let Some(cwd) = &self.cwd {
      command.current_dir(cwd);
    }

    let output = command.output().map_err(|source| CommandError::Spawn {
      command: command_line.clone(),
      source,
    })?;

    if !output.status.success() {
      let captured = captured_output(&output);
      match self.log {
        LogMode::Never => debug!(cmd = %command_line, output = %captured, "command failed"),
        _ => warn!(cmd = %command_line, output = %captured, "command failed"),
      }
      return Err(CommandError::ExternalTool {
        command: command_line,
        code: output.status.code(),
        output: captured,
      });
    }

    if !output.stderr.is_empty() {
      debug!(stderr = %String::from_utf8_lossy(&output.stderr), "command stderr");
    }
    Ok(output)
  }

  /// Runs the command and returns stdout exactly as printed.
  pub fn stdout_bytes(&self) -> Result<Vec<u8>, CommandError> {
    Ok(self.output()?.stdout)
  }

  /// Runs the command and returns trimmed stdout split into lines.
  /// Empty output yields an empty list rather than one empty line.
  pub fn output_lines(&self) -> Result<Vec<String>, CommandError> {
    let stdout = self.stdout_bytes()?;
    let text = String::from_utf8_lossy(&stdout);
    let trimmed = text.trim();
    if trimmed.is_empty() {
      return Ok(Vec::new());
    }
    Ok(trimmed.lines().map(|line| line.trim_end_matches('\r').to_string()).collect())
  }

  /// Runs the command and returns its single line of output.
  pub fn output_one_line(&self) -> Result<String, CommandError> {
    let mut lines = self.output_lines()?;
    if lines.len() != 1 {
      if self.log != LogMode::Never {
        warn!(cmd = %self.command_line(), output = %lines.join("\n"), "unexpected output");
      }
      return Err(CommandError::UnexpectedLineCount {
        command: self.command_line(),
        count: lines.len(),
      });
    }
    Ok(lines.remove(0))
  }

  /// Runs the command, ignoring whatever it prints on success.
  pub fn run(&self) -> Result<(), CommandError> {
    self.output().map(|_| ())
  }
}

impl fmt::Display for Cmd {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.command_line())
  }
}

fn captured_output(output: &Output) -> String {
  let stderr = String::from_utf8_lossy(&output.stderr);
  let stdout = String::from_utf8_lossy(&output.stdout);
  let mut captured = String::new();
  for part in [stderr.trim_end(), stdout.trim_end()] {
    if part.is_empty() {
      continue;
    }
    if !captured.is_empty() {
      captured.push('\n');
    }
    captured.push_str(part);
  }
  captured
}
