use super::error::AttachError;
use crate::runtime::Runtime;
use std::cell::Cell;

/// Process-wide gate against re-entrant or concurrent attach attempts.
///
/// The flag is true from the moment an attach passes the gate until the
/// session's teardown token fires (or the attempt aborts and its
/// [`GuardSlot`] rolls the flag back).
pub(crate) struct AttachGuard {
    active: Cell<bool>,
}

impl AttachGuard {
    pub fn new() -> Self {
        AttachGuard {
            active: Cell::new(false),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Check the preconditions and mark a session as active.
    ///
    /// Rejections are not failures of the pipeline: the runtime being absent
    /// maps to [`AttachError::NotInitialized`], an already-held flag or a
    /// trace callback in progress to [`AttachError::AlreadyActive`].
    pub fn try_acquire(&self, rt: &dyn Runtime) -> Result<GuardSlot<'_>, AttachError> {
        if !rt.is_initialized() {
            return Err(AttachError::NotInitialized);
        }
        if rt.tracing_in_progress() || self.active.get() {
            return Err(AttachError::AlreadyActive);
        }

        self.active.set(true);
        Ok(GuardSlot {
            guard: self,
            committed: false,
        })
    }

    pub fn release(&self) {
        self.active.set(false);
    }
}

/// Held flag with rollback: dropping an uncommitted slot clears the guard, so
/// every failure past the gate restores it without per-path bookkeeping.
pub(crate) struct GuardSlot<'a> {
    guard: &'a AttachGuard,
    committed: bool,
}

impl GuardSlot<'_> {
    /// Keep the flag set past the end of the attach call. From here on only
    /// the teardown token clears it.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for GuardSlot<'_> {
    fn drop(&mut self) {
        if !self.committed {
            log::debug!("attach aborted, session flag rolled back");
            self.guard.release();
        }
    }
}
