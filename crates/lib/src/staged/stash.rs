//! Scoped stash of unstaged modifications.
//!
//! While a [`StashSnapshot`] is alive the working tree matches the staged
//! index for every tracked file. Dropping the snapshot, or calling
//! [`StashSnapshot::release`], puts the hidden modifications back. A failed
//! restore is never retried; it is reported loudly so the user can recover
//! the stash entry by hand.

use tracing::{error, info};

use super::StagedError;

type Restore<'a> = Box<dyn FnOnce() -> Result<(), StagedError> + 'a>;

#[must_use = "dropping the snapshot immediately restores the hidden changes"]
pub struct StashSnapshot<'a> {
  label: String,
  restore: Option<Restore<'a>>,
}

impl<'a> StashSnapshot<'a> {
  /// A snapshot that hid nothing and has nothing to restore.
  pub fn noop(label: &str) -> Self {
    Self {
      label: label.to_string(),
      restore: None,
    }
  }

  /// A snapshot whose hidden changes are put back by `restore`.
  pub fn new(label: &str, restore: impl FnOnce() -> Result<(), StagedError> + 'a) -> Self {
    Self {
      label: label.to_string(),
      restore: Some(Box::new(restore)),
    }
  }

  /// True when a stash entry was created and is still waiting to be restored.
  pub fn is_active(&self) -> bool {
    self.restore.is_some()
  }

  /// Restores the hidden modifications now, reporting failure to the caller.
  pub fn release(mut self) -> Result<(), StagedError> {
    self.run_restore()
  }

  fn run_restore(&mut self) -> Result<(), StagedError> {
    let Some(restore) = self.restore.take() else {
      return Ok(());
    };
    match restore() {
      Ok(()) => {
        info!(label = %self.label, "restored unstaged changes");
        Ok(())
      }
      Err(e) => {
        error!(label = %self.label, "{e}");
        Err(e)
      }
    }
  }
}

impl Drop for StashSnapshot<'_> {
  fn drop(&mut self) {
    // Errors were already reported by run_restore.
    let _ = self.run_restore();
  }
}

/// Decides whether `git stash push` created an entry by comparing the
/// object `refs/stash` pointed to before and after the push.
pub fn stash_created(before: Option<&str>, after: Option<&str>) -> bool {
  match (before, after) {
    (_, None) => false,
    (None, Some(_)) => true,
    (Some(before), Some(after)) => before != after,
  }
}
